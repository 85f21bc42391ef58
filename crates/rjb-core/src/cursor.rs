use crate::domain::UpdateId;

/// Pull-mode bookkeeping: the lower bound for the next `getUpdates` call.
///
/// Plain value object. The polling loop owns it and threads it through each cycle,
/// so advancing is observable in tests without a network.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateCursor {
    next: i64,
}

impl UpdateCursor {
    pub fn starting_at(next: i64) -> Self {
        Self { next }
    }

    /// Mark `last_seen` as consumed. No ordering check: ids are trusted to increase.
    pub fn advance(&mut self, last_seen: UpdateId) {
        self.next = last_seen.0 + 1;
    }

    pub fn next(&self) -> i64 {
        self.next
    }
}
