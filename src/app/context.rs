//! Shared state between the scan loop, the reporter and card input.
//!
//! `AppContext` is created once by the entry point and handed to each
//! thread in an `Arc`.  Only the scan loop writes the status; everyone
//! else reads it.
//!
//! | Value    | Guard                   | Writer           |
//! |----------|-------------------------|------------------|
//! | status   | `RwLock`                | scan loop        |
//! | counters | `Mutex`                 | scan loop        |
//! | lock     | interlock's own `Mutex` | scan loop, cards |

use std::sync::{Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::classifier::{Status, Transition};
use crate::counter::{SessionCounters, SessionSummary};
use crate::error::AuthorizationError;
use crate::interlock::{AuthorizeOutcome, Interlock};

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{EventSink, PersistencePort, SolenoidPort};

pub struct AppContext<S> {
    status: RwLock<Status>,
    counters: Mutex<SessionCounters>,
    interlock: Interlock<S>,
    product_no: String,
    started_at: DateTime<Utc>,
}

impl<S: SolenoidPort> AppContext<S> {
    pub fn new(interlock: Interlock<S>, product_no: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            status: RwLock::new(Status::Initializing),
            counters: Mutex::new(SessionCounters::new()),
            interlock,
            product_no: product_no.into(),
            started_at,
        }
    }

    // ── Status ────────────────────────────────────────────────

    pub fn status(&self) -> Status {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish_status(&self, status: Status) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    // ── Counters ──────────────────────────────────────────────

    pub fn counters(&self) -> SessionCounters {
        *self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record_scan(&self, transition: Option<Transition>) {
        let mut c = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        c.on_scan_completed();
        if let Some(t) = transition {
            c.on_transition(t.from, t.to);
        }
    }

    // ── Interlock ─────────────────────────────────────────────

    pub fn interlock(&self) -> &Interlock<S> {
        &self.interlock
    }

    // ── Session ───────────────────────────────────────────────

    pub fn product_no(&self) -> &str {
        &self.product_no
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn session_summary(&self, ended_at: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            started_at: self.started_at,
            ended_at,
            product_no: self.product_no.clone(),
            counters: self.counters(),
        }
    }

    /// Build a telemetry snapshot.  Each value is read under its own
    /// guard; the snapshot is not atomic across them.
    pub fn telemetry(&self) -> TelemetryData {
        let lock = self.interlock.lock_state();
        TelemetryData {
            status: self.status(),
            counters: self.counters(),
            locked: lock.is_locked,
            lock_reason: lock.reason,
            solenoid_energised: self.interlock.solenoid_energised(),
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an operator command.  Returns `false` once the session
    /// should end.
    pub fn handle_command(
        &self,
        cmd: AppCommand,
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
        now: DateTime<Utc>,
    ) -> bool {
        match cmd {
            AppCommand::PresentCard(card_id) => {
                match self.interlock.authorize_at(&card_id, now) {
                    Ok(AuthorizeOutcome::Unlocked(entry)) => {
                        if let Err(e) = store.record_unlock(&entry) {
                            warn!("Unlock audit not persisted: {e}");
                        }
                        sink.emit(&AppEvent::Unlocked(entry));
                    }
                    Ok(AuthorizeOutcome::AlreadyUnlocked) => {}
                    Err(AuthorizationError::UnknownCard(card_id)) => {
                        sink.emit(&AppEvent::CardRejected { card_id });
                    }
                    Err(e) => warn!("Card ignored: {e}"),
                }
                true
            }
            AppCommand::ManualLock(reason) => {
                self.interlock.request_lock(&reason);
                sink.emit(&AppEvent::Locked { reason });
                true
            }
            AppCommand::EndSession => {
                info!("End of session requested");
                false
            }
        }
    }
}
