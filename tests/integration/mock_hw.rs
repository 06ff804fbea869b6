//! Mock adapters for integration tests.
//!
//! Records every indicator, persistence and event call so tests can assert
//! on the full history without touching real GPIO or files.  The solenoid
//! is the real driver on simulated relay pins.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use wirecheck::app::context::AppContext;
use wirecheck::app::events::AppEvent;
use wirecheck::app::ports::{EventSink, IndicatorPort, PersistencePort};
use wirecheck::app::service::AppService;
use wirecheck::cards::{AccessLevel, CardRegistry};
use wirecheck::classifier::Status;
use wirecheck::config::SystemConfig;
use wirecheck::counter::SessionSummary;
use wirecheck::drivers::delay::NoDelay;
use wirecheck::drivers::sim::{SimOutputPin, SimulatedPinController};
use wirecheck::drivers::solenoid::SolenoidDriver;
use wirecheck::error::{ActuatorError, PersistenceError};
use wirecheck::interlock::{AuditEntry, Interlock};

pub const OPERATOR_CARD: &str = "04A1B2C3";

pub fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

// ── Indicator calls ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorCall {
    Show(Status),
    AllOff,
}

#[derive(Debug, Default)]
pub struct MockIndicators {
    pub calls: Vec<IndicatorCall>,
}

#[allow(dead_code)]
impl MockIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_call(&self) -> Option<IndicatorCall> {
        self.calls.last().copied()
    }
}

impl IndicatorPort for MockIndicators {
    fn show(&mut self, status: Status) -> Result<(), ActuatorError> {
        self.calls.push(IndicatorCall::Show(status));
        Ok(())
    }

    fn all_off(&mut self) {
        self.calls.push(IndicatorCall::AllOff);
    }
}

// ── Persistence ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockStore {
    pub transitions: Vec<(Status, DateTime<Utc>)>,
    pub unlocks: Vec<AuditEntry>,
    pub sessions: Vec<SessionSummary>,
    /// Every call fails while set.  Nothing is recorded.
    pub failing: bool,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.failing {
            Err(PersistenceError::Io("disk full".into()))
        } else {
            Ok(())
        }
    }
}

impl PersistencePort for MockStore {
    fn record_transition(&mut self, status: Status, at: DateTime<Utc>) -> Result<(), PersistenceError> {
        self.check()?;
        self.transitions.push((status, at));
        Ok(())
    }

    fn record_unlock(&mut self, entry: &AuditEntry) -> Result<(), PersistenceError> {
        self.check()?;
        self.unlocks.push(entry.clone());
        Ok(())
    }

    fn end_session(&mut self, summary: &SessionSummary) -> Result<(), PersistenceError> {
        self.check()?;
        self.sessions.push(summary.clone());
        Ok(())
    }
}

// ── Events ────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locks(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Locked { reason } => Some(reason.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn status_changes(&self) -> Vec<(Status, Status)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StatusChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Bench ─────────────────────────────────────────────────────

pub type Solenoid = SolenoidDriver<SimOutputPin>;
pub type Service = AppService<SimulatedPinController, NoDelay, Solenoid>;

/// A full rig on simulated pins with the harness wired correctly.
pub struct Bench {
    pub config: SystemConfig,
    pub service: Service,
    pub ctx: Arc<AppContext<Solenoid>>,
    /// Relay pin handles shared with the solenoid driver.
    pub relays: Vec<SimOutputPin>,
    pub indicators: MockIndicators,
    pub store: MockStore,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Bench {
    pub fn new() -> Self {
        Self::with_config(SystemConfig::default())
    }

    pub fn with_config(config: SystemConfig) -> Self {
        let mut pins = SimulatedPinController::new();
        for (out, inp) in config.harness.pin_pairs() {
            pins.tie(&[out, inp]);
        }

        let relays: Vec<SimOutputPin> =
            config.solenoid_pins.iter().map(|_| SimOutputPin::new()).collect();
        let solenoid = SolenoidDriver::new(relays.clone(), config.solenoid_active_low).unwrap();

        let cards = Arc::new(CardRegistry::new());
        cards
            .add_at(OPERATOR_CARD, "Dana", AccessLevel::Operator, t(0))
            .unwrap();
        let interlock = Interlock::new(solenoid, cards);
        let ctx = Arc::new(AppContext::new(interlock, config.harness.product_no(), t(0)));
        let service = AppService::new(&config, pins, NoDelay, Arc::clone(&ctx));

        Self {
            config,
            service,
            ctx,
            relays,
            indicators: MockIndicators::new(),
            store: MockStore::new(),
            sink: RecordingSink::new(),
        }
    }

    pub fn start(&mut self) {
        self.service.start(&mut self.indicators, &mut self.sink);
    }

    pub fn tick(&mut self, at: i64) -> Status {
        self.service
            .tick(&mut self.indicators, &mut self.store, &mut self.sink, t(at))
            .status
    }

    pub fn pins(&mut self) -> &mut SimulatedPinController {
        self.service.tester_mut().controller_mut()
    }

    /// Replace the harness wiring with `nets`.
    pub fn rewire(&mut self, nets: &[&[u8]]) {
        let pins = self.pins();
        pins.rewire();
        for net in nets {
            pins.tie(net);
        }
    }

    /// Relay pins are active-low by default: LOW means energised.
    pub fn relays_energised(&self) -> bool {
        self.relays.iter().all(|r| r.is_high() != self.config.solenoid_active_low)
    }
}
