//! Simulated GPIO controller.
//!
//! Deterministic wiring model used by tests and by the binary when no
//! Raspberry Pi is present.  A harness is described as:
//!
//! - **nets**: groups of pins joined by copper (undirected).  An input
//!   on a net reads HIGH if any output on that net is driven HIGH; on
//!   contention HIGH wins.
//! - **mirrors**: `src → dst`: `dst` reads whatever `src` is driving.
//! - **stuck** pins that always read one level.
//! - **scripted** reads, consumed front to back before any other rule.
//! - **failing** pins that reject every operation (or only writes).
//!
//! With no wiring, an input reads its pull level (pull-up HIGH,
//! otherwise LOW).

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};

use crate::app::ports::{Direction, Level, PinController, PinId, Pull};
use crate::error::{HardwareError, HardwareErrorKind};
use crate::pins::MAX_BCM_GPIO;

#[derive(Debug, Clone, Copy)]
struct SimPin {
    direction: Direction,
    pull: Pull,
    driven: Level,
}

/// In-memory [`PinController`].
#[derive(Debug, Default)]
pub struct SimulatedPinController {
    pins: HashMap<PinId, SimPin>,
    nets: Vec<BTreeSet<PinId>>,
    mirrors: Vec<(PinId, PinId)>,
    stuck: HashMap<PinId, Level>,
    scripted: HashMap<PinId, VecDeque<Level>>,
    failing: HashSet<PinId>,
    failing_writes: HashSet<PinId>,
}

impl SimulatedPinController {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Wiring model ──────────────────────────────────────────

    /// Join `pins` into one net, merging any nets they already belong to.
    pub fn tie(&mut self, pins: &[PinId]) {
        let mut merged: BTreeSet<PinId> = pins.iter().copied().collect();
        // Existing nets are disjoint, so one sweep is enough.
        let (joined, rest): (Vec<_>, Vec<_>) = self
            .nets
            .drain(..)
            .partition(|net| !net.is_disjoint(&merged));
        for net in joined {
            merged.extend(net);
        }
        self.nets = rest;
        self.nets.push(merged);
    }

    /// `dst` follows whatever `src` drives.
    pub fn mirror(&mut self, src: PinId, dst: PinId) {
        self.mirrors.push((src, dst));
    }

    pub fn stick(&mut self, pin: PinId, level: Level) {
        self.stuck.insert(pin, level);
    }

    /// Queue reads for `pin`; each read pops one level.
    pub fn script_reads(&mut self, pin: PinId, levels: &[Level]) {
        self.scripted
            .entry(pin)
            .or_default()
            .extend(levels.iter().copied());
    }

    /// Every operation on `pin` fails with an I/O error.
    pub fn fail_pin(&mut self, pin: PinId) {
        self.failing.insert(pin);
    }

    /// Writes to `pin` fail; configure and read still work.
    pub fn fail_writes(&mut self, pin: PinId) {
        self.failing_writes.insert(pin);
    }

    /// Remove all wiring and faults; pin configuration is kept.
    pub fn rewire(&mut self) {
        self.nets.clear();
        self.mirrors.clear();
        self.stuck.clear();
        self.scripted.clear();
        self.failing.clear();
        self.failing_writes.clear();
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn direction(&self, pin: PinId) -> Option<Direction> {
        self.pins.get(&pin).map(|p| p.direction)
    }

    pub fn pull(&self, pin: PinId) -> Option<Pull> {
        self.pins
            .get(&pin)
            .filter(|p| p.direction == Direction::In)
            .map(|p| p.pull)
    }

    /// Level an output is driving; `None` for inputs and unknown pins.
    pub fn driven(&self, pin: PinId) -> Option<Level> {
        self.pins
            .get(&pin)
            .filter(|p| p.direction == Direction::Out)
            .map(|p| p.driven)
    }

    // ── Internal ──────────────────────────────────────────────

    fn check(&self, pin: PinId) -> Result<(), HardwareError> {
        if pin > MAX_BCM_GPIO {
            return Err(HardwareError::new(pin, HardwareErrorKind::InvalidPin));
        }
        if self.failing.contains(&pin) {
            return Err(HardwareError::new(pin, HardwareErrorKind::Io));
        }
        Ok(())
    }

    fn net_of(&self, pin: PinId) -> BTreeSet<PinId> {
        self.nets
            .iter()
            .find(|net| net.contains(&pin))
            .cloned()
            .unwrap_or_else(|| BTreeSet::from([pin]))
    }

    fn line_level(&self, pin: PinId, pull: Pull) -> Level {
        let net = self.net_of(pin);
        let mut driven_low = false;
        for p in &net {
            match self.driven(*p) {
                Some(Level::High) => return Level::High,
                Some(Level::Low) => driven_low = true,
                None => {}
            }
        }
        for (src, dst) in &self.mirrors {
            if net.contains(dst) && self.driven(*src) == Some(Level::High) {
                return Level::High;
            }
        }
        if driven_low {
            return Level::Low;
        }
        match pull {
            Pull::Up => Level::High,
            Pull::Down | Pull::None => Level::Low,
        }
    }
}

impl PinController for SimulatedPinController {
    fn configure(
        &mut self,
        pin: PinId,
        direction: Direction,
        pull: Pull,
    ) -> Result<(), HardwareError> {
        self.check(pin)?;
        self.pins.insert(
            pin,
            SimPin {
                direction,
                pull,
                driven: Level::Low,
            },
        );
        Ok(())
    }

    fn write(&mut self, pin: PinId, level: Level) -> Result<(), HardwareError> {
        self.check(pin)?;
        if self.failing_writes.contains(&pin) {
            return Err(HardwareError::new(pin, HardwareErrorKind::Io));
        }
        let state = self
            .pins
            .get_mut(&pin)
            .ok_or(HardwareError::new(pin, HardwareErrorKind::Unconfigured))?;
        if state.direction != Direction::Out {
            return Err(HardwareError::new(pin, HardwareErrorKind::WrongDirection));
        }
        state.driven = level;
        Ok(())
    }

    fn read(&mut self, pin: PinId) -> Result<Level, HardwareError> {
        self.check(pin)?;
        let state = *self
            .pins
            .get(&pin)
            .ok_or(HardwareError::new(pin, HardwareErrorKind::Unconfigured))?;

        if let Some(level) = self.scripted.get_mut(&pin).and_then(VecDeque::pop_front) {
            return Ok(level);
        }
        if let Some(level) = self.stuck.get(&pin) {
            return Ok(*level);
        }
        Ok(match state.direction {
            Direction::Out => state.driven,
            Direction::In => self.line_level(pin, state.pull),
        })
    }
}

// ---------------------------------------------------------------------------
// Simulated actuator pin
// ---------------------------------------------------------------------------

/// Write failure on a [`SimOutputPin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinError;

impl digital::Error for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// `embedded_hal` output pin backed by shared flags, for indicators and
/// solenoids in simulation.  Clones observe the same line.
#[derive(Debug, Clone, Default)]
pub struct SimOutputPin {
    high: Arc<AtomicBool>,
    failing: Arc<AtomicBool>,
}

impl SimOutputPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn drive(&self, high: bool) -> Result<(), SimPinError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SimPinError);
        }
        self.high.store(high, Ordering::SeqCst);
        Ok(())
    }
}

impl ErrorType for SimOutputPin {
    type Error = SimPinError;
}

impl OutputPin for SimOutputPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}
