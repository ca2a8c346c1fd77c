// ── Settings persistence ──────────────────────────────────────────────────────
//
// Reads `<config dir>/Tandem/settings.json` (`%APPDATA%\Tandem` on Windows,
// `~/.config/Tandem` on Linux).  Every field has a default, so partial files
// are fine.  No `unsafe`.

use std::{fs, io, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    dispatcher::ShellOptions,
    error::{Result, ShellError},
    gateway::FileFilter,
};

// ── Format version ────────────────────────────────────────────────────────────

const SETTINGS_VERSION: u32 = 1;

// ── On-disk types ─────────────────────────────────────────────────────────────

/// Client size of a window in 96-DPI pixels; scaled for the monitor on
/// creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: i32,
    pub height: i32,
}

/// Root of the JSON settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub version: u32,
    pub primary: WindowSize,
    /// The terminal window: same width as the editor, a third of its height.
    pub secondary: WindowSize,
    /// The single filter class offered by the Save As picker.
    pub save_filter: FileFilter,
    /// Show read/write failures in the editor window instead of only logging
    /// them.
    pub report_io_errors: bool,
    /// Quit once neither window is alive.  Only front-ends that can re-open
    /// a window honour `false`; the Win32 front-end always quits.
    pub quit_when_all_closed: bool,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            primary: WindowSize {
                width: 800,
                height: 600,
            },
            secondary: WindowSize {
                width: 800,
                height: 200,
            },
            save_filter: FileFilter::default(),
            report_io_errors: true,
            quit_when_all_closed: true,
            log_level: "info".to_owned(),
        }
    }
}

impl Settings {
    /// The subset the dispatcher cares about.
    pub fn shell_options(&self) -> ShellOptions {
        ShellOptions {
            save_filter: self.save_filter.clone(),
            report_io_errors: self.report_io_errors,
            quit_when_all_closed: self.quit_when_all_closed,
        }
    }
}

// ── Path ──────────────────────────────────────────────────────────────────────

/// Return the path to the settings file, or `None` when the platform has no
/// per-user config directory.
pub fn settings_path() -> Option<PathBuf> {
    let mut p = dirs::config_dir()?;
    p.push("Tandem");
    p.push("settings.json");
    Some(p)
}

// ── Load / save ───────────────────────────────────────────────────────────────

/// Parse settings from JSON.  An unrecognised version is an error.
pub fn parse(data: &[u8]) -> Result<Settings> {
    let settings: Settings = serde_json::from_slice(data)?;
    if settings.version != SETTINGS_VERSION {
        return Err(ShellError::SettingsVersion {
            found: settings.version,
            expected: SETTINGS_VERSION,
        });
    }
    Ok(settings)
}

/// Read settings from `path`.  `Ok(None)` when the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<Settings>> {
    match fs::read(path) {
        Ok(data) => parse(&data).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write `settings` to `path`, creating parent directories.
pub fn save_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, settings)?;
    Ok(())
}

/// Load the user's settings, falling back to defaults on any problem.
///
/// A missing file is created with the defaults so there is something to
/// edit.  Runs before the logger is installed, so problems are returned as
/// warnings for the caller to log once logging is up.
pub fn load_or_default() -> (Settings, Vec<String>) {
    match settings_path() {
        Some(path) => load_or_default_at(&path),
        None => (
            Settings::default(),
            vec!["no config directory; using default settings".to_owned()],
        ),
    }
}

fn load_or_default_at(path: &Path) -> (Settings, Vec<String>) {
    let mut warnings = Vec::new();
    match load_from(path) {
        Ok(Some(settings)) => (settings, warnings),
        Ok(None) => {
            let defaults = Settings::default();
            if let Err(e) = save_to(path, &defaults) {
                warnings.push(format!("could not write {}: {e}", path.display()));
            }
            (defaults, warnings)
        }
        Err(e) => {
            warnings.push(format!("{}: {e}; using defaults", path.display()));
            (Settings::default(), warnings)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
