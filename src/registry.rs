// ── Window registry ───────────────────────────────────────────────────────────
//
// Single owner of the two window slots.  All access happens on the dispatcher
// thread, so there is no locking; the registry is deliberately `!Send`.
//
// Secondary lifecycle:
//
//   Absent ──get_or_create──▶ Constructing ──factory ok──▶ Ready
//     ▲                            │                        │
//     └──────── factory error ─────┘◀───── on_closed ───────┘

use crate::{
    error::Result,
    message::{Message, WindowKind},
};

// ── Platform seams ────────────────────────────────────────────────────────────

/// One on-screen surface as seen by the core.
///
/// Implementations deliver messages into the window's own event handling;
/// they must not call back into the dispatcher synchronously.
pub trait Surface {
    /// Hand `message` to the window's inbound channel.
    fn deliver(&self, message: &Message);

    /// Bring an existing window to the front.
    fn reveal(&self);

    /// The editor buffer's current text, for surfaces that host one.
    fn buffer_text(&self) -> Option<String> {
        None
    }
}

/// Constructs platform surfaces on demand.
pub trait WindowFactory {
    fn create(&mut self, kind: WindowKind, id: WindowId) -> Result<Box<dyn Surface>>;
}

// ── Handles ───────────────────────────────────────────────────────────────────

/// Process-unique identity of a constructed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

/// A live window.  Exists only inside the registry.
pub struct WindowHandle {
    pub kind: WindowKind,
    pub id: WindowId,
    surface: Box<dyn Surface>,
}

impl WindowHandle {
    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }
}

impl std::fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowHandle")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Lifecycle of the Secondary slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryState {
    Absent,
    Constructing,
    Ready,
}

/// Result of addressing a message to a window kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The target window was absent; the message is gone.
    Dropped,
}

// ── Registry ──────────────────────────────────────────────────────────────────

pub struct WindowRegistry {
    factory: Box<dyn WindowFactory>,
    primary: Option<WindowHandle>,
    secondary: Option<WindowHandle>,
    secondary_state: SecondaryState,
    next_id: u64,
    /// Number of successful constructions, indexed Primary, Secondary.
    constructed: [u32; 2],
}

impl WindowRegistry {
    pub fn new(factory: Box<dyn WindowFactory>) -> Self {
        Self {
            factory,
            primary: None,
            secondary: None,
            secondary_state: SecondaryState::Absent,
            next_id: 1,
            constructed: [0; 2],
        }
    }

    pub fn primary(&self) -> Option<&WindowHandle> {
        self.primary.as_ref()
    }

    pub fn secondary(&self) -> Option<&WindowHandle> {
        self.secondary.as_ref()
    }

    pub fn get(&self, kind: WindowKind) -> Option<&WindowHandle> {
        match kind {
            WindowKind::Primary => self.primary(),
            WindowKind::Secondary => self.secondary(),
        }
    }

    pub fn secondary_state(&self) -> SecondaryState {
        self.secondary_state
    }

    /// How many windows of `kind` have been constructed so far.
    pub fn constructed(&self, kind: WindowKind) -> u32 {
        self.constructed[slot_index(kind)]
    }

    /// `true` when no window is alive.
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }

    /// Construct the Primary window if it is absent.
    ///
    /// Called once at startup and again when the application is re-activated
    /// with no Primary open.
    pub fn open_primary(&mut self) -> Result<&WindowHandle> {
        if self.primary.is_none() {
            let handle = self.construct(WindowKind::Primary)?;
            self.primary = Some(handle);
        }
        self.primary
            .as_ref()
            .ok_or_else(|| unreachable_absent(WindowKind::Primary))
    }

    /// Make the Secondary window Ready.
    ///
    /// An existing window is revealed; only an absent one is constructed.
    /// A failed construction leaves the slot Absent.
    pub fn get_or_create_secondary(&mut self) -> Result<&WindowHandle> {
        match self.secondary_state {
            SecondaryState::Ready => {
                if let Some(handle) = &self.secondary {
                    log::debug!("revealing secondary window {:?}", handle.id);
                    handle.surface.reveal();
                }
            }
            SecondaryState::Absent | SecondaryState::Constructing => {
                self.secondary_state = SecondaryState::Constructing;
                match self.construct(WindowKind::Secondary) {
                    Ok(handle) => {
                        self.secondary = Some(handle);
                        self.secondary_state = SecondaryState::Ready;
                    }
                    Err(e) => {
                        self.secondary_state = SecondaryState::Absent;
                        return Err(e);
                    }
                }
            }
        }
        self.secondary
            .as_ref()
            .ok_or_else(|| unreachable_absent(WindowKind::Secondary))
    }

    /// Clear the slot for `kind`.  The handle is dropped immediately.
    pub fn on_closed(&mut self, kind: WindowKind) {
        let handle = match kind {
            WindowKind::Primary => self.primary.take(),
            WindowKind::Secondary => {
                self.secondary_state = SecondaryState::Absent;
                self.secondary.take()
            }
        };
        match handle {
            Some(h) => log::info!("{kind} window {:?} closed", h.id),
            None => log::debug!("close for absent {kind} window ignored"),
        }
    }

    /// Deliver `message` to `kind` if that window exists.
    ///
    /// Absent targets drop the message: nothing is queued and no error is
    /// raised.
    pub fn send(&self, kind: WindowKind, message: &Message) -> Delivery {
        if kind == WindowKind::Secondary && self.secondary_state != SecondaryState::Ready {
            log::trace!("dropping {} for {kind}: not ready", message.channel());
            return Delivery::Dropped;
        }
        match self.get(kind) {
            Some(handle) => {
                log::trace!("{} → {kind} {:?}", message.channel(), handle.id);
                handle.surface.deliver(message);
                Delivery::Delivered
            }
            None => {
                log::trace!("dropping {} for absent {kind}", message.channel());
                Delivery::Dropped
            }
        }
    }

    fn construct(&mut self, kind: WindowKind) -> Result<WindowHandle> {
        let id = WindowId(self.next_id);
        self.next_id += 1;
        let surface = self.factory.create(kind, id)?;
        self.constructed[slot_index(kind)] += 1;
        log::info!("{kind} window {id:?} constructed");
        Ok(WindowHandle { kind, id, surface })
    }
}

fn slot_index(kind: WindowKind) -> usize {
    match kind {
        WindowKind::Primary => 0,
        WindowKind::Secondary => 1,
    }
}

fn unreachable_absent(kind: WindowKind) -> crate::error::ShellError {
    crate::error::ShellError::WindowCreation {
        kind,
        reason: "slot empty after construction".to_owned(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{message::Notification, testing::Harness};

    #[test]
    fn starts_empty() {
        let h = Harness::new();
        let reg = h.registry();
        assert!(reg.is_empty());
        assert!(reg.primary().is_none());
        assert_eq!(reg.secondary_state(), SecondaryState::Absent);
    }

    #[test]
    fn open_primary_is_idempotent() {
        let h = Harness::new();
        let mut reg = h.registry();
        let first = reg.open_primary().expect("open").id;
        let second = reg.open_primary().expect("open").id;
        assert_eq!(first, second);
        assert_eq!(reg.constructed(WindowKind::Primary), 1);
        assert_eq!(h.factory.created(WindowKind::Primary), 1);
    }

    #[test]
    fn secondary_constructed_once_then_revealed() {
        let h = Harness::new();
        let mut reg = h.registry();
        reg.get_or_create_secondary().expect("create");
        assert_eq!(reg.secondary_state(), SecondaryState::Ready);
        reg.get_or_create_secondary().expect("reveal");
        reg.get_or_create_secondary().expect("reveal");
        assert_eq!(h.factory.created(WindowKind::Secondary), 1);
        assert_eq!(h.secondary_log().reveals(), 2);
    }

    #[test]
    fn failed_construction_returns_to_absent() {
        let h = Harness::new();
        h.factory.fail_next(WindowKind::Secondary);
        let mut reg = h.registry();
        assert!(reg.get_or_create_secondary().is_err());
        assert_eq!(reg.secondary_state(), SecondaryState::Absent);
        assert!(reg.secondary().is_none());

        reg.get_or_create_secondary().expect("second attempt");
        assert_eq!(reg.secondary_state(), SecondaryState::Ready);
        assert_eq!(reg.constructed(WindowKind::Secondary), 1);
    }

    #[test]
    fn close_clears_slot_and_next_toggle_builds_new_handle() {
        let h = Harness::new();
        let mut reg = h.registry();
        let old = reg.get_or_create_secondary().expect("create").id;
        reg.on_closed(WindowKind::Secondary);
        assert!(reg.secondary().is_none());
        assert_eq!(reg.secondary_state(), SecondaryState::Absent);

        let new = reg.get_or_create_secondary().expect("recreate").id;
        assert_ne!(old, new);
        assert_eq!(reg.constructed(WindowKind::Secondary), 2);
    }

    #[test]
    fn send_to_absent_window_is_dropped() {
        let h = Harness::new();
        let reg = h.registry();
        let msg = Message::from(Notification::NewFile);
        assert_eq!(reg.send(WindowKind::Primary, &msg), Delivery::Dropped);
        assert_eq!(reg.send(WindowKind::Secondary, &msg), Delivery::Dropped);
    }

    #[test]
    fn closing_primary_leaves_secondary_ready() {
        let h = Harness::new();
        let mut reg = h.registry();
        reg.open_primary().expect("primary");
        reg.get_or_create_secondary().expect("secondary");
        reg.on_closed(WindowKind::Primary);

        assert!(reg.primary().is_none());
        assert_eq!(reg.secondary_state(), SecondaryState::Ready);
        assert!(!reg.is_empty());
        let msg = Message::TerminalData(b"still here".to_vec());
        assert_eq!(reg.send(WindowKind::Secondary, &msg), Delivery::Delivered);
    }

    #[test]
    fn closing_absent_window_is_harmless() {
        let h = Harness::new();
        let mut reg = h.registry();
        reg.on_closed(WindowKind::Secondary);
        reg.on_closed(WindowKind::Primary);
        assert!(reg.is_empty());
    }
}
