//! Wire-harness continuity tester library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  Raspberry Pi GPIO support is behind the `rpi` feature;
//! everything else runs on any host against the simulated controller.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod cards;
pub mod classifier;
pub mod config;
pub mod continuity;
pub mod counter;
pub mod drivers;
pub mod error;
pub mod interlock;
pub mod pins;
pub mod scheduler;
