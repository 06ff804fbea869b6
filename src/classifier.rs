//! Status classifier.
//!
//! Maps a [`FaultReport`] to a harness [`Status`] with a fixed precedence
//! (faults beat everything, then full continuity, then open), and turns the
//! resulting status stream into edge-triggered [`Transition`]s so one-shot
//! side effects fire once per change, never once per scan.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::continuity::FaultReport;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Classified harness status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// No scan has completed yet.
    #[default]
    Initializing,
    /// Every pair is connected and no faults were found.
    Good,
    /// At least one pair is not connected.
    Open,
    /// Cross-wiring or a short was detected.
    NotGood,
}

impl Status {
    /// Operator-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Initializing => "INITIALIZING",
            Self::Good => "GOOD",
            Self::Open => "OPEN",
            Self::NotGood => "NOT GOOD",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Partial connection policy
// ---------------------------------------------------------------------------

/// How a fault-free report with only some pairs connected is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialConnectionPolicy {
    /// Partially connected harnesses are simply OPEN.
    #[default]
    Open,
    /// Partially connected harnesses are rejected as NOT GOOD.
    NotGood,
}

/// Classify one scan.
pub fn classify(report: &FaultReport, policy: PartialConnectionPolicy) -> Status {
    if report.has_faults() {
        return Status::NotGood;
    }

    let connected = report.connected_count();
    let total = report.pair_connected.len();

    if total > 0 && connected == total {
        Status::Good
    } else if connected > 0 && policy == PartialConnectionPolicy::NotGood {
        Status::NotGood
    } else {
        Status::Open
    }
}

// ---------------------------------------------------------------------------
// Edge detection
// ---------------------------------------------------------------------------

/// A status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Status,
    pub to: Status,
}

/// Remembers the last status and reports changes.
#[derive(Debug, Default)]
pub struct StatusTracker {
    previous: Status,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest classification.  Returns `Some` only on change.
    pub fn observe(&mut self, status: Status) -> Option<Transition> {
        if status == self.previous {
            return None;
        }
        let t = Transition {
            from: self.previous,
            to: status,
        };
        self.previous = status;
        Some(t)
    }

    pub fn previous(&self) -> Status {
        self.previous
    }
}
