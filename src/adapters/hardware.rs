//! Hardware adapter: assembles the rig behind the port traits.
//!
//! Picks the pin controller and builds the indicator and solenoid drivers
//! on actuator pins from the configuration.  This is the only module that
//! decides between real and simulated GPIO; everything downstream is
//! generic over the ports.

use log::info;

use crate::config::SystemConfig;
use crate::drivers::delay::NoDelay;
use crate::drivers::indicator::IndicatorLights;
use crate::drivers::sim::{SimOutputPin, SimulatedPinController};
use crate::drivers::solenoid::SolenoidDriver;
use crate::error::ActuatorError;

/// Everything the scan loop and the interlock drive.
pub struct Rig<P, D, O> {
    pub pins: P,
    pub delay: D,
    pub indicators: IndicatorLights<O>,
    pub solenoid: SolenoidDriver<O>,
}

/// Simulated rig with the configured harness wired correctly.
pub fn simulated_rig(
    config: &SystemConfig,
) -> Result<Rig<SimulatedPinController, NoDelay, SimOutputPin>, ActuatorError> {
    let mut pins = SimulatedPinController::new();
    for (out, inp) in config.harness.pin_pairs() {
        pins.tie(&[out, inp]);
    }
    let indicators =
        IndicatorLights::new(SimOutputPin::new(), SimOutputPin::new(), SimOutputPin::new());
    let relays = config.solenoid_pins.iter().map(|_| SimOutputPin::new()).collect();
    let solenoid = SolenoidDriver::new(relays, config.solenoid_active_low)?;
    info!("Simulated rig: {} pair(s) wired", config.harness.len());
    Ok(Rig {
        pins,
        delay: NoDelay,
        indicators,
        solenoid,
    })
}

#[cfg(feature = "rpi")]
pub use rpi_rig::raspberry_pi_rig;

#[cfg(feature = "rpi")]
mod rpi_rig {
    use anyhow::{Context, Result};
    use log::info;
    use rppal::gpio::OutputPin;

    use super::Rig;
    use crate::config::SystemConfig;
    use crate::drivers::delay::StdDelay;
    use crate::drivers::indicator::IndicatorLights;
    use crate::drivers::rpi::RpiPinController;
    use crate::drivers::solenoid::SolenoidDriver;

    /// Raspberry Pi rig on BCM GPIO.
    pub fn raspberry_pi_rig(
        config: &SystemConfig,
    ) -> Result<Rig<RpiPinController, StdDelay, OutputPin>> {
        let pins = RpiPinController::new().context("opening GPIO")?;
        let ind = config.indicator_pins;
        let indicators = IndicatorLights::new(
            pins.output_pin(ind.red).context("red indicator")?,
            pins.output_pin(ind.yellow).context("yellow indicator")?,
            pins.output_pin(ind.green).context("green indicator")?,
        );
        let relays = config
            .solenoid_pins
            .iter()
            .map(|&p| pins.output_pin(p).with_context(|| format!("solenoid GPIO{p}")))
            .collect::<Result<Vec<_>>>()?;
        let solenoid = SolenoidDriver::new(relays, config.solenoid_active_low)
            .context("solenoid to lock position")?;
        info!("Raspberry Pi rig ready");
        Ok(Rig {
            pins,
            delay: StdDelay,
            indicators,
            solenoid,
        })
    }
}
