//! Lock solenoid driver.
//!
//! One or more relay channels switched together.  The relay boards on the
//! rig are active-LOW: the pin idles HIGH, which is the lock position.
//! De-energised is always the safe state, and is what [`SolenoidDriver::new`]
//! applies before returning.

use embedded_hal::digital::OutputPin;
use log::{error, info};

use crate::app::ports::SolenoidPort;
use crate::error::ActuatorError;

pub struct SolenoidDriver<P> {
    pins: Vec<P>,
    active_low: bool,
    energised: bool,
}

impl<P: OutputPin> SolenoidDriver<P> {
    /// Take ownership of the relay pins and put them in the lock position.
    pub fn new(pins: Vec<P>, active_low: bool) -> Result<Self, ActuatorError> {
        let mut driver = Self {
            pins,
            active_low,
            energised: true,
        };
        driver.drive(false)?;
        Ok(driver)
    }

    pub fn channel_count(&self) -> usize {
        self.pins.len()
    }

    fn drive(&mut self, on: bool) -> Result<(), ActuatorError> {
        let high = on != self.active_low;
        let mut failed = false;
        for (ch, pin) in self.pins.iter_mut().enumerate() {
            let res = if high { pin.set_high() } else { pin.set_low() };
            if let Err(e) = res {
                error!("solenoid ch{ch}: write failed: {e:?}");
                failed = true;
            }
        }
        if failed {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.energised = on;
        Ok(())
    }
}

impl<P: OutputPin + Send> SolenoidPort for SolenoidDriver<P> {
    fn set_energised(&mut self, on: bool) -> Result<(), ActuatorError> {
        // Release is always rewritten: a failed energise may have left
        // some channels pulled in.
        if on && self.energised {
            return Ok(());
        }
        let was = self.energised;
        self.drive(on)?;
        if was != on {
            info!("Solenoid {}", if on { "energised" } else { "de-energised" });
        }
        Ok(())
    }

    fn is_energised(&self) -> bool {
        self.energised
    }
}
