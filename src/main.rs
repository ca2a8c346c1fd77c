// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that mirrored log output is visible.
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use tandem::{config, logging};

fn main() {
    let (settings, warnings) = config::load_or_default();
    logging::init(&settings.log_level);
    for w in &warnings {
        log::warn!("{w}");
    }

    #[cfg(windows)]
    {
        if let Err(e) = tandem::platform::win32::window::run(&settings) {
            // Startup failed before or during the message loop.
            // No console in a GUI subsystem build; use a dialog.
            log::error!("fatal: {e}");
            tandem::platform::win32::window::show_error_dialog(&e.to_string());
            std::process::exit(1);
        }
        log::info!("message loop exited");
    }

    #[cfg(not(windows))]
    {
        log::error!("no GUI front-end for this platform");
        eprintln!("tandem: only the Windows front-end is available on this build");
        std::process::exit(2);
    }
}
