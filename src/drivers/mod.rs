//! Pin controllers, actuator drivers, and timing helpers.

pub mod delay;
pub mod indicator;
#[cfg(feature = "rpi")]
pub mod rpi;
pub mod sim;
pub mod solenoid;
