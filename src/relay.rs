// ── Event relay ───────────────────────────────────────────────────────────────
//
// Forwards opaque chunks to the peer of their source window.  A chunk for an
// absent (or not yet Ready) peer is dropped on the spot: no buffer, no retry.
// Ordering is the dispatcher's FIFO order; the relay never reorders, splits
// or merges.

use crate::{
    message::{Chunk, Message},
    registry::{Delivery, WindowRegistry},
};

/// Running totals, reported by the diagnostics toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub forwarded: u64,
    pub dropped: u64,
    pub bytes_forwarded: u64,
}

#[derive(Debug, Default)]
pub struct EventRelay {
    stats: RelayStats,
}

impl EventRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Forward `chunk` as `terminal-data` to the peer window if it is Ready.
    pub fn relay(&mut self, windows: &WindowRegistry, chunk: Chunk) -> Delivery {
        let target = chunk.source.peer();
        let len = chunk.data.len() as u64;
        let delivery = windows.send(target, &Message::TerminalData(chunk.data));
        match delivery {
            Delivery::Delivered => {
                self.stats.forwarded += 1;
                self.stats.bytes_forwarded += len;
            }
            Delivery::Dropped => {
                self.stats.dropped += 1;
                log::trace!("relay: {len} bytes from {} dropped", chunk.source);
            }
        }
        delivery
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{message::WindowKind, testing::Harness};

    #[test]
    fn forwards_in_emission_order() {
        let h = Harness::new();
        let mut reg = h.registry();
        reg.get_or_create_secondary().expect("secondary");
        let mut relay = EventRelay::new();

        for c in ["c1", "c2", "c3"] {
            assert_eq!(relay.relay(&reg, Chunk::from_primary(c)), Delivery::Delivered);
        }
        assert_eq!(h.secondary_log().terminal_data(), vec![b"c1".to_vec(), b"c2".to_vec(), b"c3".to_vec()]);
        assert_eq!(relay.stats().forwarded, 3);
        assert_eq!(relay.stats().bytes_forwarded, 6);
    }

    #[test]
    fn absent_peer_drops_without_buffering() {
        let h = Harness::new();
        let mut reg = h.registry();
        let mut relay = EventRelay::new();

        assert_eq!(relay.relay(&reg, Chunk::from_primary("lost")), Delivery::Dropped);
        reg.get_or_create_secondary().expect("secondary");
        relay.relay(&reg, Chunk::from_primary("kept"));

        assert_eq!(h.secondary_log().terminal_data(), vec![b"kept".to_vec()]);
        assert_eq!(relay.stats().dropped, 1);
    }

    #[test]
    fn chunk_bytes_pass_through_untouched() {
        let h = Harness::new();
        let mut reg = h.registry();
        reg.get_or_create_secondary().expect("secondary");
        let mut relay = EventRelay::new();

        let raw = vec![0x00, 0xFF, 0x1B, b'[', b'2', b'J', b'\r', b'\n'];
        relay.relay(&reg, Chunk::from_primary(raw.clone()));
        assert_eq!(h.secondary_log().terminal_data(), vec![raw]);
    }

    #[test]
    fn secondary_chunks_go_to_primary() {
        let h = Harness::new();
        let mut reg = h.registry();
        reg.open_primary().expect("primary");
        let mut relay = EventRelay::new();

        let d = relay.relay(&reg, Chunk::new(WindowKind::Secondary, "echo"));
        assert_eq!(d, Delivery::Delivered);
        assert_eq!(h.primary_log().terminal_data(), vec![b"echo".to_vec()]);
    }
}
