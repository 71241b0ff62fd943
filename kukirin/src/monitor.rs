//! The full reduction from raw notification payloads to riding mode changes.

use crate::decode::{decode, Mode, StatusFrame};
use crate::tracker::ChangeTracker;
use log::trace;
use std::fmt::{self, Display, Formatter};

/// Counts of what a [`ModeMonitor`] has seen so far. These are for diagnostics only.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MonitorStats {
    /// Notification payloads processed.
    pub frames: u64,
    /// Payloads dropped because they were too short or failed the gate check.
    pub rejected: u64,
    /// Status frames carrying a mode code which doesn't map to a riding mode.
    pub unknown: u64,
    /// Mode changes reported.
    pub changes: u64,
}

impl Display for MonitorStats {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{} frames, {} rejected, {} unknown mode codes, {} mode changes",
            self.frames, self.rejected, self.unknown, self.changes
        )
    }
}

/// Turns the stream of notification payloads from one connection into riding mode changes.
///
/// Payloads must be passed in the order they were received. `process` doesn't allocate or block,
/// so it is fine to call it directly from the task which receives notifications.
#[derive(Clone, Debug, Default)]
pub struct ModeMonitor {
    tracker: ChangeTracker,
    stats: MonitorStats,
}

impl ModeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes one notification payload, returning the new riding mode if it has changed.
    pub fn process(&mut self, value: &[u8]) -> Option<Mode> {
        self.stats.frames += 1;
        let frame = match StatusFrame::parse(value) {
            Ok(frame) => frame,
            Err(e) => {
                trace!("Ignoring notification {:02x?}: {}", value, e);
                self.stats.rejected += 1;
                return None;
            }
        };

        let mode = decode(&frame);
        if let Mode::Unknown(code) = mode {
            trace!("Unknown mode code 0x{:02x} in {:?}", code, frame);
            self.stats.unknown += 1;
        }

        let change = self.tracker.observe(mode);
        if change.is_some() {
            self.stats.changes += 1;
        }
        change
    }

    /// The riding mode most recently reported, if any.
    pub fn current(&self) -> Option<Mode> {
        self.tracker.current()
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }
}
