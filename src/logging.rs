//! Logger bridge for the `log` facade.
//!
//! All `log::info!()` etc. output goes to `tandem.log` in the system temp
//! directory (`/tmp/tandem.log` on Unix, `%TEMP%\tandem.log` on Windows).
//! Debug builds, or any run with `TANDEM_LOG` set, also mirror to stderr.
//!
//! Level precedence: `TANDEM_LOG` (error|warn|info|debug|trace|off), then the
//! `log_level` setting.  The "Toggle Developer Tools" command flips the max
//! level between that base level and `Trace` at runtime.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::PathBuf,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        OnceLock,
    },
    time::{SystemTime, UNIX_EPOCH},
};

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

/// Environment variable that overrides the configured level.
pub const LOG_ENV: &str = "TANDEM_LOG";

static LOGGER: OnceLock<ShellLogger> = OnceLock::new();
static BASE_LEVEL: AtomicUsize = AtomicUsize::new(LevelFilter::Info as usize);
static VERBOSE: AtomicBool = AtomicBool::new(false);

struct ShellLogger {
    file: Mutex<Option<File>>,
    mirror_stderr: bool,
}

impl Log for ShellLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:<5}] [{}] {}\n",
            timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.write_all(line.as_bytes());
        }
        if self.mirror_stderr {
            eprint!("{line}");
        }
    }

    fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

/// Path of the log file.
pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("tandem.log")
}

/// Pick the effective level: `TANDEM_LOG` wins over `configured`.
///
/// Unparseable values fall back to `Info`.
pub fn resolve_level(env: Option<&str>, configured: &str) -> LevelFilter {
    env.and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .or_else(|| LevelFilter::from_str(configured.trim()).ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the logger.  Safe to call more than once; only the first call
/// takes effect.
pub fn init(configured_level: &str) {
    let env = std::env::var(LOG_ENV).ok();
    let level = resolve_level(env.as_deref(), configured_level);

    let logger = LOGGER.get_or_init(|| {
        // Silently run without a file if it can't be opened; stderr (when
        // mirrored) still works.
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(log_path())
            .ok();
        ShellLogger {
            file: Mutex::new(file),
            mirror_stderr: cfg!(debug_assertions) || env.is_some(),
        }
    });

    if log::set_logger(logger).is_ok() {
        BASE_LEVEL.store(level as usize, Ordering::Relaxed);
        log::set_max_level(level);
        log::info!("tandem {} logging at {level}", env!("CARGO_PKG_VERSION"));
    }
}

/// Flip between the base level and `Trace`.  Returns `true` when verbose
/// logging is now on.
pub fn toggle_verbose() -> bool {
    let verbose = !VERBOSE.fetch_xor(true, Ordering::Relaxed);
    if verbose {
        log::set_max_level(LevelFilter::Trace);
    } else {
        log::set_max_level(level_from_index(BASE_LEVEL.load(Ordering::Relaxed)));
    }
    verbose
}

fn level_from_index(i: usize) -> LevelFilter {
    match i {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
