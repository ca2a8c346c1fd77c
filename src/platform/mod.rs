// ── Platform abstraction layer ────────────────────────────────────────────────
//
// The core talks to the OS only through the `WindowFactory`, `Surface` and
// `FilePicker` traits.  No `unsafe` lives here; all Win32 FFI is confined to
// the `win32` sub-module and never leaks outward.

#[cfg(windows)]
pub mod win32;
