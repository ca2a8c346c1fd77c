// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except `platform::win32` (Win32 FFI).
// Each unsafe block there MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

//! Tandem: a two-window text editor shell.
//!
//! The core (command table, router, window registry, relay, dispatcher) is
//! platform-independent and runs without a display.  `platform::win32`
//! supplies real windows, menus and file dialogs on Windows.

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod menu;
pub mod message;
pub mod platform;
pub mod registry;
pub mod relay;
pub mod router;

#[cfg(test)]
mod testing;
