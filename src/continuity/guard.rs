//! Scoped pin state changes.
//!
//! Every temporary drive or direction change the tester makes goes through
//! one of these guards, so the pin is put back the moment the guard leaves
//! scope, including on `?` early returns.  A failed restore is logged; the
//! next scan re-applies the nominal roles anyway.

use log::warn;

use crate::app::ports::{Direction, Level, PinController, PinId, Pull};
use crate::error::HardwareError;

/// Nominal configuration of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Output(Level),
    Input(Pull),
}

impl Role {
    pub fn apply<P: PinController + ?Sized>(
        self,
        pins: &mut P,
        pin: PinId,
    ) -> Result<(), HardwareError> {
        match self {
            Self::Output(level) => {
                pins.configure(pin, Direction::Out, Pull::None)?;
                pins.write(pin, level)
            }
            Self::Input(pull) => pins.configure(pin, Direction::In, pull),
        }
    }
}

// ── RoleSwap ───────────────────────────────────────────────────

/// Puts a pin into a temporary role; restores the nominal role on drop.
pub struct RoleSwap<'a, P: PinController> {
    pins: &'a mut P,
    pin: PinId,
    restore: Role,
}

impl<'a, P: PinController> RoleSwap<'a, P> {
    pub fn engage(
        pins: &'a mut P,
        pin: PinId,
        temporary: Role,
        restore: Role,
    ) -> Result<Self, HardwareError> {
        if let Err(e) = temporary.apply(pins, pin) {
            if let Err(undo) = restore.apply(pins, pin) {
                warn!("GPIO{pin}: restore after failed reconfigure: {undo}");
            }
            return Err(e);
        }
        Ok(Self { pins, pin, restore })
    }

    pub fn pins(&mut self) -> &mut P {
        &mut *self.pins
    }
}

impl<P: PinController> Drop for RoleSwap<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.restore.apply(&mut *self.pins, self.pin) {
            warn!("GPIO{}: restore to {:?} failed: {e}", self.pin, self.restore);
        }
    }
}

// ── DriveHigh ──────────────────────────────────────────────────

/// Holds an output HIGH while alive; drives it LOW on drop.
pub struct DriveHigh<'a, P: PinController> {
    pins: &'a mut P,
    pin: PinId,
    armed: bool,
}

impl<'a, P: PinController> DriveHigh<'a, P> {
    pub fn engage(pins: &'a mut P, pin: PinId) -> Result<Self, HardwareError> {
        if let Err(e) = pins.write(pin, Level::High) {
            // Level is unknown after a failed write.
            let _ = pins.write(pin, Level::Low);
            return Err(e);
        }
        Ok(Self {
            pins,
            pin,
            armed: true,
        })
    }

    pub fn pins(&mut self) -> &mut P {
        &mut *self.pins
    }

    /// Drive LOW now and report the outcome instead of logging it.
    pub fn release(mut self) -> Result<(), HardwareError> {
        self.armed = false;
        self.pins.write(self.pin, Level::Low)
    }
}

impl<P: PinController> Drop for DriveHigh<'_, P> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.pins.write(self.pin, Level::Low) {
                warn!("GPIO{}: failed to return LOW: {e}", self.pin);
            }
        }
    }
}
