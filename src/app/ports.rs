//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (GPIO controllers, indicator lights, the lock solenoid,
//! event sinks, persistence) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware directly.
//!
//! ## Safety notes
//!
//! - **PinController** is owned exclusively by the scan loop.  No other
//!   component may issue raw pin operations during a scan.
//! - **SolenoidPort** is only reachable through the interlock, which
//!   enforces the lock guard.
//! - **PersistencePort** failures never affect the in-memory model.

use chrono::{DateTime, Utc};

use crate::classifier::Status;
use crate::config::SystemConfig;
use crate::counter::SessionSummary;
use crate::error::{ActuatorError, ConfigError, HardwareError, PersistenceError};
use crate::interlock::AuditEntry;

/// BCM GPIO number.
pub type PinId = u8;

// ───────────────────────────────────────────────────────────────
// Pin I/O (driven adapter: domain ↔ GPIO controller)
// ───────────────────────────────────────────────────────────────

/// Logic level on a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Self::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

/// Pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Out,
    In,
}

/// Input bias.  Ignored for outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Pull {
    /// Pull-down keeps a floating harness line from reading HIGH.
    #[default]
    Down,
    Up,
    None,
}

/// Capability set over a physical (or simulated) GPIO controller.
///
/// Every operation reports failure as a [`HardwareError`]; callers decide
/// how to degrade.  Implementations must never panic on a bad pin.
pub trait PinController {
    /// Set pin direction and, for inputs, bias.  Outputs start LOW.
    fn configure(&mut self, pin: PinId, direction: Direction, pull: Pull)
    -> Result<(), HardwareError>;

    /// Drive an output pin.
    fn write(&mut self, pin: PinId, level: Level) -> Result<(), HardwareError>;

    /// Sample a pin.
    fn read(&mut self, pin: PinId) -> Result<Level, HardwareError>;
}

impl<P: PinController + ?Sized> PinController for &mut P {
    fn configure(
        &mut self,
        pin: PinId,
        direction: Direction,
        pull: Pull,
    ) -> Result<(), HardwareError> {
        (**self).configure(pin, direction, pull)
    }

    fn write(&mut self, pin: PinId, level: Level) -> Result<(), HardwareError> {
        (**self).write(pin, level)
    }

    fn read(&mut self, pin: PinId) -> Result<Level, HardwareError> {
        (**self).read(pin)
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The lock solenoid bank.  Energised = released for the operator,
/// de-energised = lock position (the safe state).
pub trait SolenoidPort: Send {
    fn set_energised(&mut self, on: bool) -> Result<(), ActuatorError>;

    fn is_energised(&self) -> bool;
}

/// Status indicator lights.
pub trait IndicatorPort {
    /// Light the indicator for `status`; `Initializing` turns all off.
    fn show(&mut self, status: Status) -> Result<(), ActuatorError>;

    /// Kill all indicators (safe shutdown).
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Persistence port (driven adapter: domain → external store)
// ───────────────────────────────────────────────────────────────

/// Hook into the external results store.
pub trait PersistencePort {
    /// Called once per status change.
    fn record_transition(&mut self, status: Status, at: DateTime<Utc>)
    -> Result<(), PersistenceError>;

    /// Called once per successful card unlock.
    fn record_unlock(&mut self, entry: &AuditEntry) -> Result<(), PersistenceError>;

    /// Called when the session closes.
    fn end_session(&mut self, summary: &SessionSummary) -> Result<(), PersistenceError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before returning or persisting; an
/// invalid harness never reaches the tester.
pub trait ConfigPort {
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}
