//! Cycle / session counters.
//!
//! Counts are a pure function of the status stream: feeding the same
//! sequence of statuses into a fresh [`SessionCounters`] always yields the
//! same numbers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{Status, StatusTracker};

/// Per-session tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionCounters {
    /// Completed scans.
    pub checked: u64,
    /// Harnesses that went OPEN → GOOD (one good part seated).
    pub good: u64,
    /// Harnesses that went OPEN → NOT GOOD.
    pub not_good: u64,
    /// Times the rig returned to OPEN from a classified state.
    pub open: u64,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one status change.
    pub fn on_transition(&mut self, previous: Status, current: Status) {
        match (previous, current) {
            (Status::Open, Status::Good) => self.good += 1,
            (Status::Open, Status::NotGood) => self.not_good += 1,
            (Status::Good | Status::NotGood, Status::Open) => self.open += 1,
            _ => {}
        }
    }

    pub fn on_scan_completed(&mut self) {
        self.checked += 1;
    }

    /// Counters for a status stream, one entry per completed scan, starting
    /// from `Initializing`.
    pub fn replay(statuses: &[Status]) -> Self {
        let mut counters = Self::new();
        let mut tracker = StatusTracker::new();
        for &s in statuses {
            counters.on_scan_completed();
            if let Some(t) = tracker.observe(s) {
                counters.on_transition(t.from, t.to);
            }
        }
        counters
    }
}

/// Handed to the persistence hook when a session closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub product_no: String,
    pub counters: SessionCounters,
}
