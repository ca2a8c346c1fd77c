// ── Document agent ────────────────────────────────────────────────────────────
//
// The Primary window's own bookkeeping: which file the buffer belongs to,
// whether it has unsaved edits, and whether the sidebar is showing.  Turns
// the messages the Primary receives into concrete reactions for the platform
// layer to carry out.  Pure Rust; no window handles.

use std::path::{Path, PathBuf};

use crate::{
    gateway::GatewayRequest,
    message::{Message, Notification},
};

const APP_NAME: &str = "Tandem";

/// Per-window document state.
#[derive(Debug, Default)]
pub struct Document {
    /// Path of the file on disk, or `None` for an untitled buffer.
    pub path: Option<PathBuf>,
    /// `true` when the buffer contains changes not yet saved to disk.
    pub dirty: bool,
    pub sidebar_visible: bool,
}

/// What the Primary window must do in response to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    Nothing,
    /// Empty the editor.
    ClearBuffer,
    /// Replace the editor contents.
    LoadBuffer(String),
    /// Hand gateway work back to the dispatcher.
    Request(GatewayRequest),
    /// Show or hide the sidebar.
    Sidebar(bool),
    ShowAbout,
    ShowError(String),
    /// Only the title changed.
    Retitle,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bare filename component, or `"Untitled"` if no path is set.
    pub fn display_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_owned())
    }

    /// Compute the title string for the Primary window.
    ///
    /// | State | Title |
    /// |---|---|
    /// | No path, clean | `"Tandem"` |
    /// | Path set, clean | `"filename — Tandem"` |
    /// | Path set, dirty | `"*filename — Tandem"` |
    /// | No path, dirty | `"*Untitled — Tandem"` |
    pub fn window_title(&self) -> String {
        if self.path.is_none() && !self.dirty {
            return APP_NAME.to_owned();
        }
        let dirty = if self.dirty { "*" } else { "" };
        format!("{dirty}{} \u{2014} {APP_NAME}", self.display_name())
    }

    /// The editor reported a user edit.  Returns `true` if the title changes.
    pub fn mark_dirty(&mut self) -> bool {
        !std::mem::replace(&mut self.dirty, true)
    }

    /// Update state for `message` and say what the window should do.
    pub fn react(&mut self, message: &Message) -> Reaction {
        match message {
            Message::Notify(Notification::NewFile) => {
                self.path = None;
                self.dirty = false;
                Reaction::ClearBuffer
            }
            Message::Notify(Notification::OpenFile) => Reaction::Request(GatewayRequest::Open),
            Message::Notify(Notification::SaveFile) => match &self.path {
                Some(path) => Reaction::Request(GatewayRequest::Save(path.clone())),
                None => Reaction::Request(GatewayRequest::SaveAs),
            },
            Message::Notify(Notification::ToggleSidebar) => {
                self.sidebar_visible = !self.sidebar_visible;
                Reaction::Sidebar(self.sidebar_visible)
            }
            Message::Notify(Notification::About) => Reaction::ShowAbout,
            Message::FileOpened { path, content } => {
                self.path = Some(path.clone());
                self.dirty = false;
                Reaction::LoadBuffer(content.clone())
            }
            Message::FileSaved { path } => {
                self.path = Some(path.clone());
                self.dirty = false;
                Reaction::Retitle
            }
            Message::FileError { reason, .. } => Reaction::ShowError(reason.clone()),
            Message::Notify(Notification::ClearTerminal) | Message::TerminalData(_) => {
                Reaction::Nothing
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
