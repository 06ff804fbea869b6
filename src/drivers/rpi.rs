//! Raspberry Pi GPIO via `rppal` (BCM numbering).
//!
//! Harness pins are claimed lazily as [`IoPin`]s so the tester can flip
//! their direction mid-scan.  Actuator and indicator pins are handed out
//! as plain `rppal` output pins, which implement `embedded_hal`'s
//! `OutputPin` with the `hal` feature.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::debug;
use rppal::gpio::{self, Gpio, IoPin, Mode, PullUpDown};

use crate::app::ports::{Direction, Level, PinController, PinId, Pull};
use crate::error::{HardwareError, HardwareErrorKind};

pub struct RpiPinController {
    gpio: Gpio,
    pins: HashMap<PinId, IoPin>,
    directions: HashMap<PinId, Direction>,
}

impl RpiPinController {
    pub fn new() -> Result<Self, gpio::Error> {
        Ok(Self {
            gpio: Gpio::new()?,
            pins: HashMap::new(),
            directions: HashMap::new(),
        })
    }

    /// Claim `pin` as a push-pull output for an actuator or indicator.
    pub fn output_pin(&self, pin: PinId) -> Result<gpio::OutputPin, HardwareError> {
        let p = self.gpio.get(pin).map_err(|e| map_err(pin, &e))?;
        Ok(p.into_output())
    }

    fn claim(&mut self, pin: PinId) -> Result<&mut IoPin, HardwareError> {
        match self.pins.entry(pin) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(v) => {
                let p = self.gpio.get(pin).map_err(|e| map_err(pin, &e))?;
                debug!("GPIO{pin}: claimed");
                Ok(v.insert(p.into_io(Mode::Input)))
            }
        }
    }
}

fn map_err(pin: PinId, e: &gpio::Error) -> HardwareError {
    let kind = match e {
        gpio::Error::PinUsed(_) => HardwareErrorKind::Busy,
        gpio::Error::PinNotAvailable(_) => HardwareErrorKind::InvalidPin,
        _ => HardwareErrorKind::Io,
    };
    debug!("GPIO{pin}: {e}");
    HardwareError::new(pin, kind)
}

fn to_rppal(level: Level) -> gpio::Level {
    match level {
        Level::Low => gpio::Level::Low,
        Level::High => gpio::Level::High,
    }
}

impl PinController for RpiPinController {
    fn configure(
        &mut self,
        pin: PinId,
        direction: Direction,
        pull: Pull,
    ) -> Result<(), HardwareError> {
        let io = self.claim(pin)?;
        match direction {
            Direction::Out => {
                io.set_mode(Mode::Output);
                io.set_low();
            }
            Direction::In => {
                io.set_mode(Mode::Input);
                io.set_pullupdown(match pull {
                    Pull::Down => PullUpDown::PullDown,
                    Pull::Up => PullUpDown::PullUp,
                    Pull::None => PullUpDown::Off,
                });
            }
        }
        self.directions.insert(pin, direction);
        Ok(())
    }

    fn write(&mut self, pin: PinId, level: Level) -> Result<(), HardwareError> {
        match self.directions.get(&pin) {
            None => return Err(HardwareError::new(pin, HardwareErrorKind::Unconfigured)),
            Some(Direction::In) => {
                return Err(HardwareError::new(pin, HardwareErrorKind::WrongDirection));
            }
            Some(Direction::Out) => {}
        }
        self.claim(pin)?.write(to_rppal(level));
        Ok(())
    }

    fn read(&mut self, pin: PinId) -> Result<Level, HardwareError> {
        if !self.directions.contains_key(&pin) {
            return Err(HardwareError::new(pin, HardwareErrorKind::Unconfigured));
        }
        let level = self.claim(pin)?.read();
        Ok(Level::from(level == gpio::Level::High))
    }
}
