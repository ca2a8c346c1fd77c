// ── Window messages ───────────────────────────────────────────────────────────
//
// Everything a window can receive from the core, plus the opaque data chunks
// the relay forwards.  Pure data; no platform imports.

use std::{fmt, path::PathBuf};

// ── Window kind ───────────────────────────────────────────────────────────────

/// Which of the two window slots a handle occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    /// The main editor surface.
    Primary,
    /// The auxiliary terminal-like display.
    Secondary,
}

impl WindowKind {
    /// The window on the other end of the relay.
    pub fn peer(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Notifications ─────────────────────────────────────────────────────────────

/// Zero-payload messages addressed to a window by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    NewFile,
    OpenFile,
    SaveFile,
    ToggleSidebar,
    About,
    ClearTerminal,
}

impl Notification {
    /// The channel tag the receiving window listens on.
    pub fn tag(self) -> &'static str {
        match self {
            Self::NewFile => "new-file",
            Self::OpenFile => "open-file",
            Self::SaveFile => "save-file",
            Self::ToggleSidebar => "toggle-sidebar",
            Self::About => "about",
            Self::ClearTerminal => "clear-terminal",
        }
    }
}

// ── Data chunks ───────────────────────────────────────────────────────────────

/// An opaque unit of relayed data.
///
/// The core never inspects `data`; it is forwarded exactly as emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The window whose outbound channel produced the chunk.
    pub source: WindowKind,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn new(source: WindowKind, data: impl Into<Vec<u8>>) -> Self {
        Self {
            source,
            data: data.into(),
        }
    }

    /// Shorthand for a chunk emitted by the Primary window.
    pub fn from_primary(data: impl Into<Vec<u8>>) -> Self {
        Self::new(WindowKind::Primary, data)
    }
}

// ── Message ───────────────────────────────────────────────────────────────────

/// A directed message delivered to one window's inbound channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Notify(Notification),
    /// A file was read in full by the gateway.
    FileOpened { path: PathBuf, content: String },
    /// The gateway finished writing the buffer to `path`.
    FileSaved { path: PathBuf },
    /// A gateway read or write failed.
    FileError {
        path: Option<PathBuf>,
        reason: String,
    },
    /// Relayed bytes for the terminal view.
    TerminalData(Vec<u8>),
}

impl Message {
    /// Stable channel name, used for routing on the receiving side and in logs.
    pub fn channel(&self) -> &'static str {
        match self {
            Self::Notify(n) => n.tag(),
            Self::FileOpened { .. } => "file-opened",
            Self::FileSaved { .. } => "file-saved",
            Self::FileError { .. } => "file-error",
            Self::TerminalData(_) => "terminal-data",
        }
    }
}

impl From<Notification> for Message {
    fn from(n: Notification) -> Self {
        Self::Notify(n)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_is_symmetric() {
        assert_eq!(WindowKind::Primary.peer(), WindowKind::Secondary);
        assert_eq!(WindowKind::Secondary.peer(), WindowKind::Primary);
    }

    #[test]
    fn channel_names() {
        assert_eq!(Message::from(Notification::ToggleSidebar).channel(), "toggle-sidebar");
        assert_eq!(
            Message::FileSaved {
                path: PathBuf::from("a.txt")
            }
            .channel(),
            "file-saved"
        );
        assert_eq!(Message::TerminalData(b"ls\n".to_vec()).channel(), "terminal-data");
    }

    #[test]
    fn chunk_keeps_bytes_verbatim() {
        let c = Chunk::from_primary(&b"\x1b[31mred\x1b[0m"[..]);
        assert_eq!(c.source, WindowKind::Primary);
        assert_eq!(c.data, b"\x1b[31mred\x1b[0m");
    }
}
