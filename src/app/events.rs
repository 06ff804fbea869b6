//! Outbound application events.
//!
//! The scan loop, the reporter and the card input emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log lines today, a line-side display
//! or MES feed tomorrow.

use crate::classifier::Status;
use crate::counter::{SessionCounters, SessionSummary};
use crate::interlock::AuditEntry;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Scanning is about to begin.
    Started { product_no: String, pairs: usize },

    /// Harness status changed.
    StatusChanged { from: Status, to: Status },

    /// The interlock locked (or its reason changed).
    Locked { reason: String },

    /// An authorized card opened the interlock.
    Unlocked(AuditEntry),

    /// A card was presented that is not authorized.
    CardRejected { card_id: String },

    /// Periodic snapshot from the reporter.
    Telemetry(TelemetryData),

    /// The session closed.
    SessionEnded(SessionSummary),
}

/// A point-in-time snapshot for display or transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryData {
    pub status: Status,
    pub counters: SessionCounters,
    pub locked: bool,
    pub lock_reason: Option<String>,
    pub solenoid_energised: bool,
}
