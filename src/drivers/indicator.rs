//! Red / yellow / green status lights (active HIGH).
//!
//! | Status       | Red | Yellow | Green |
//! |--------------|-----|--------|-------|
//! | INITIALIZING |     |        |       |
//! | GOOD         |     |        |  on   |
//! | OPEN         |     |   on   |       |
//! | NOT GOOD     | on  |        |       |

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::IndicatorPort;
use crate::classifier::Status;
use crate::error::ActuatorError;

pub struct IndicatorLights<P> {
    red: P,
    yellow: P,
    green: P,
    showing: Status,
}

impl<P: OutputPin> IndicatorLights<P> {
    pub fn new(red: P, yellow: P, green: P) -> Self {
        let mut lights = Self {
            red,
            yellow,
            green,
            showing: Status::Initializing,
        };
        lights.all_off();
        lights
    }

    pub fn showing(&self) -> Status {
        self.showing
    }

    fn set(&mut self, red: bool, yellow: bool, green: bool) -> Result<(), ActuatorError> {
        let mut failed = false;
        for (name, pin, on) in [
            ("red", &mut self.red, red),
            ("yellow", &mut self.yellow, yellow),
            ("green", &mut self.green, green),
        ] {
            let res = if on { pin.set_high() } else { pin.set_low() };
            if let Err(e) = res {
                warn!("{name} indicator: write failed: {e:?}");
                failed = true;
            }
        }
        if failed {
            Err(ActuatorError::GpioWriteFailed)
        } else {
            Ok(())
        }
    }
}

impl<P: OutputPin> IndicatorPort for IndicatorLights<P> {
    fn show(&mut self, status: Status) -> Result<(), ActuatorError> {
        let (r, y, g) = match status {
            Status::Initializing => (false, false, false),
            Status::Good => (false, false, true),
            Status::Open => (false, true, false),
            Status::NotGood => (true, false, false),
        };
        self.showing = status;
        self.set(r, y, g)
    }

    fn all_off(&mut self) {
        self.showing = Status::Initializing;
        let _ = self.set(false, false, false);
    }
}
