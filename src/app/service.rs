//! Application service: the scan-loop core.
//!
//! [`AppService`] owns the continuity tester and the status tracker and
//! shares an [`AppContext`] with the other threads.  All I/O flows
//! through port traits injected at call sites, so the whole cycle runs
//! against mock adapters in tests.
//!
//! ```text
//!  PinController ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                    │        AppService        │ ──▶ PersistencePort
//!  IndicatorPort ◀── │ scan · classify · edges  │
//!                    └────────────┬─────────────┘
//!                                 ▼
//!                       AppContext (Arc, shared)
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::classifier::{PartialConnectionPolicy, Status, StatusTracker, Transition, classify};
use crate::config::{SystemConfig, WireHarnessConfig};
use crate::continuity::{ContinuityTester, FaultReport};
use crate::counter::SessionSummary;

use super::context::AppContext;
use super::events::AppEvent;
use super::ports::{EventSink, IndicatorPort, PersistencePort, PinController, SolenoidPort};

/// What one cycle produced.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub status: Status,
    pub transition: Option<Transition>,
    pub report: FaultReport,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<P, D, S> {
    tester: ContinuityTester<P, D>,
    tracker: StatusTracker,
    harness: WireHarnessConfig,
    policy: PartialConnectionPolicy,
    ctx: Arc<AppContext<S>>,
    cycles: u64,
}

impl<P: PinController, D: DelayNs, S: SolenoidPort> AppService<P, D, S> {
    pub fn new(config: &SystemConfig, pins: P, delay: D, ctx: Arc<AppContext<S>>) -> Self {
        Self {
            tester: ContinuityTester::new(pins, delay, config.settle_ms),
            tracker: StatusTracker::new(),
            harness: config.harness.clone(),
            policy: config.partial_connection_policy,
            ctx,
            cycles: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put pins and indicators into a known state and announce the session.
    pub fn start(&mut self, indicators: &mut impl IndicatorPort, sink: &mut impl EventSink) {
        let failed = self.tester.prepare(&self.harness);
        if failed > 0 {
            warn!("{failed} harness pin(s) could not be configured");
        }
        indicators.all_off();
        self.ctx.publish_status(Status::Initializing);
        sink.emit(&AppEvent::Started {
            product_no: self.harness.product_no().to_owned(),
            pairs: self.harness.len(),
        });
        info!(
            "AppService started: product={} pairs={}",
            self.harness.product_no(),
            self.harness.len()
        );
    }

    /// Run one cycle: scan → classify → edge side effects → publish.
    pub fn tick(
        &mut self,
        indicators: &mut impl IndicatorPort,
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
        now: DateTime<Utc>,
    ) -> CycleOutcome {
        self.cycles += 1;

        let report = self.tester.scan(&self.harness);
        let status = classify(&report, self.policy);
        let transition = self.tracker.observe(status);

        self.ctx.record_scan(transition);

        if let Some(t) = transition {
            self.on_transition(t, &report, indicators, store, sink, now);
        }

        self.ctx.publish_status(status);

        CycleOutcome {
            status,
            transition,
            report,
        }
    }

    /// Safe state: lights off, solenoid released, harness pins parked,
    /// session closed through the persistence hook.
    pub fn shutdown(
        &mut self,
        indicators: &mut impl IndicatorPort,
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
        now: DateTime<Utc>,
    ) -> SessionSummary {
        indicators.all_off();
        // Failure is already logged by the interlock; keep going.
        let _ = self.ctx.interlock().safe_shutdown();
        self.tester.park(&self.harness);

        let summary = self.ctx.session_summary(now);
        if let Err(e) = store.end_session(&summary) {
            warn!("Session summary not persisted: {e}");
        }
        sink.emit(&AppEvent::SessionEnded(summary.clone()));
        info!("AppService stopped after {} cycle(s)", self.cycles);
        summary
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn context(&self) -> &Arc<AppContext<S>> {
        &self.ctx
    }

    pub fn harness(&self) -> &WireHarnessConfig {
        &self.harness
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn tester(&self) -> &ContinuityTester<P, D> {
        &self.tester
    }

    pub fn tester_mut(&mut self) -> &mut ContinuityTester<P, D> {
        &mut self.tester
    }

    // ── Internal ──────────────────────────────────────────────

    fn on_transition(
        &self,
        t: Transition,
        report: &FaultReport,
        indicators: &mut impl IndicatorPort,
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
        now: DateTime<Utc>,
    ) {
        let interlock = self.ctx.interlock();
        match t.to {
            Status::NotGood => {
                let reason = format!("NOT GOOD - {}", report.describe(&self.harness));
                interlock.request_lock(&reason);
                sink.emit(&AppEvent::Locked { reason });
            }
            Status::Good => {
                if let Err(e) = interlock.control_actuator(true, false) {
                    debug!("Solenoid enable skipped: {e}");
                }
            }
            Status::Open => {
                if let Err(e) = interlock.control_actuator(false, false) {
                    debug!("Solenoid release skipped: {e}");
                }
            }
            Status::Initializing => {}
        }

        if let Err(e) = store.record_transition(t.to, now) {
            warn!("Transition not persisted: {e}");
        }
        if let Err(e) = indicators.show(t.to) {
            warn!("Indicator update failed: {e}");
        }
        sink.emit(&AppEvent::StatusChanged {
            from: t.from,
            to: t.to,
        });
    }
}
