//! Tracking of the last riding mode shown, so that only changes are reported.

use crate::decode::Mode;

/// Remembers the most recently reported riding mode for one monitoring session.
///
/// Create a new tracker for each connection; there is no shared state between sessions.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChangeTracker {
    last: Option<Mode>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly decoded mode.
    ///
    /// Returns the mode if it should be displayed, i.e. if it is a known mode which differs from
    /// the last one reported. Unknown modes are never reported and don't affect the state.
    pub fn observe(&mut self, mode: Mode) -> Option<Mode> {
        if !mode.is_known() || self.last == Some(mode) {
            return None;
        }
        self.last = Some(mode);
        Some(mode)
    }

    /// The last mode reported, if any.
    pub fn current(&self) -> Option<Mode> {
        self.last
    }

    /// Forgets the last mode, so the next known mode will be reported again.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
