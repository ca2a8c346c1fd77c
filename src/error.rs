// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in Tandem return `error::Result<T>`.  No panics in
// production paths; errors are logged by the dispatcher, surfaced to the
// Primary window as `file-error` messages, or (at startup) shown in a modal
// dialog by the platform layer.

use std::path::PathBuf;

use thiserror::Error;

use crate::message::WindowKind;

/// Every error that Tandem can produce.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A Win32 API call returned a failure code.
    #[error("{function} failed (error {code:#010x})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// A standard I/O error that is not tied to a user-chosen file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading or writing a user-chosen file failed.
    #[error("cannot access '{}': {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A command name that is not in the static command table.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// The platform could not construct a window surface.
    #[error("{kind} window could not be created: {reason}")]
    WindowCreation { kind: WindowKind, reason: String },

    /// The settings file exists but could not be parsed or written.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// The settings file was written by a format this build does not read.
    #[error("settings version {found} not understood (expected {expected})")]
    SettingsVersion { found: u32, expected: u32 },
}

impl ShellError {
    /// Wrap an I/O failure on a user-chosen path.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// The user-chosen path involved in the failure, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::File { path, .. } => Some(path),
            _ => None,
        }
    }
}

// Convert a windows-crate error (HRESULT) directly into a ShellError so that
// `?` can be used on `windows::core::Result<T>` throughout the platform module.
#[cfg(windows)]
impl From<windows::core::Error> for ShellError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ShellError>;

// ── Tests ─────────────────────────────────────────────────────────────────────
