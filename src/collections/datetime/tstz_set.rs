use chrono::{DateTime, TimeDelta, Utc};

use crate::collections::base::set::Set;

/// A *timestamp set*: finite ordered distinct timestamps.
pub type TsTzSet = Set<DateTime<Utc>>;

impl TsTzSet {
    pub fn start_timestamp(&self) -> DateTime<Utc> {
        self.start_element()
    }

    pub fn end_timestamp(&self) -> DateTime<Utc> {
        self.end_element()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        self.elements()
    }

    /// Returns a new set with every timestamp shifted by `delta`.
    pub fn shift(&self, delta: TimeDelta) -> TsTzSet {
        TsTzSet::new(self.iter().map(|t| *t + delta).collect())
            .expect("shifting a non-empty set keeps it non-empty")
    }
}
