//! Application core: domain orchestration, zero direct I/O.
//!
//! Scan-cycle orchestration, transition side effects and operator
//! commands.  All interaction with hardware and storage happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod context;
pub mod events;
pub mod ports;
pub mod service;
