//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a subsystem against
//! mock adapters and simulated GPIO.  No real hardware is required.

mod app_service_tests;
mod interlock_tests;
mod mock_hw;
mod signal_tests;
