//! `DelayNs` implementations for the settle wait.

use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

/// Blocks the calling thread.  Millisecond resolution is plenty for
/// harness settle times.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Returns immediately.  For the simulated controller, whose lines settle
/// instantly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
