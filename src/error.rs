//! Unified error types for the wire checker.
//!
//! One enum per error kind, each convertible into the top-level [`Error`]
//! so the binary's error handling stays uniform.  How each kind is handled
//! is fixed by the component that raises it:
//!
//! | Kind | Raised by | Handling |
//! |------|-----------|----------|
//! | [`HardwareError`] | pin controllers | logged, pin treated as not connected |
//! | [`ConfigError`] | config loading | fatal, scanning never starts |
//! | [`AuthorizationError`] | interlock | logged, no state change |
//! | [`PersistenceError`] | persistence adapters | logged, loop continues |
//! | [`ActuatorError`] | interlock / drivers | reported to the caller |

use core::fmt;

use crate::app::ports::PinId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Hardware(HardwareError),
    Config(ConfigError),
    Authorization(AuthorizationError),
    Persistence(PersistenceError),
    Actuator(ActuatorError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Authorization(e) => write!(f, "authorization: {e}"),
            Self::Persistence(e) => write!(f, "persistence: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

/// A single pin operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareError {
    pub pin: PinId,
    pub kind: HardwareErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareErrorKind {
    /// The pin is claimed by another process or driver.
    Busy,
    /// The pin number does not exist on this controller.
    InvalidPin,
    /// Read or write on a pin that was never configured.
    Unconfigured,
    /// Write to a pin currently configured as an input.
    WrongDirection,
    /// Underlying GPIO driver reported an I/O failure.
    Io,
}

impl HardwareError {
    pub const fn new(pin: PinId, kind: HardwareErrorKind) -> Self {
        Self { pin, kind }
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            HardwareErrorKind::Busy => "pin busy",
            HardwareErrorKind::InvalidPin => "invalid pin",
            HardwareErrorKind::Unconfigured => "pin not configured",
            HardwareErrorKind::WrongDirection => "pin configured for the other direction",
            HardwareErrorKind::Io => "GPIO I/O failure",
        };
        write!(f, "GPIO{}: {what}", self.pin)
    }
}

impl std::error::Error for HardwareError {}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Configuration is invalid or could not be loaded.  Always fatal at load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The harness declares no wire pairs.
    NoPairs,
    /// More pairs than the tester supports.
    TooManyPairs { count: usize, max: usize },
    /// A pin appears twice in the assignment table.
    DuplicatePin { pin: PinId, pair_number: u32 },
    /// A harness pin collides with an actuator/indicator pin.
    ReservedPin { pin: PinId, pair_number: u32 },
    /// Pin number outside the controller's range.
    InvalidPin { pin: PinId },
    /// Two pairs share the same pair number.
    DuplicatePairNumber(u32),
    /// An actuator or indicator pin is not listed as reserved.
    UnreservedActuatorPin(PinId),
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// The document could not be parsed.
    Parse(String),
    /// The document could not be read or written.
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPairs => write!(f, "at least one wire pair must be configured"),
            Self::TooManyPairs { count, max } => {
                write!(f, "{count} wire pairs configured, at most {max} supported")
            }
            Self::DuplicatePin { pin, pair_number } => {
                write!(f, "pair {pair_number}: GPIO{pin} is already used")
            }
            Self::ReservedPin { pin, pair_number } => {
                write!(f, "pair {pair_number}: GPIO{pin} is reserved for actuators/indicators")
            }
            Self::InvalidPin { pin } => write!(f, "GPIO{pin} does not exist"),
            Self::DuplicatePairNumber(n) => write!(f, "pair number {n} declared twice"),
            Self::UnreservedActuatorPin(pin) => {
                write!(f, "actuator/indicator GPIO{pin} missing from reserved pins")
            }
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Authorization errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// The presented card is not in the authorized set.
    UnknownCard(String),
    /// The card registry is full.
    RegistryFull { max: usize },
    /// Card id was empty after trimming.
    EmptyCardId,
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCard(id) => write!(f, "unauthorized card {id}"),
            Self::RegistryFull { max } => write!(f, "card registry full ({max} cards)"),
            Self::EmptyCardId => write!(f, "empty card id"),
        }
    }
}

impl std::error::Error for AuthorizationError {}

impl From<AuthorizationError> for Error {
    fn from(e: AuthorizationError) -> Self {
        Self::Authorization(e)
    }
}

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Record could not be encoded.
    Encode(String),
    /// Backend write failed.
    Io(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(msg) => write!(f, "encode failed: {msg}"),
            Self::Io(msg) => write!(f, "write failed: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<PersistenceError> for Error {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// The interlock is locked and the request was not forced.
    Locked,
    /// Driving an actuator pin failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "blocked by interlock"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl std::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
