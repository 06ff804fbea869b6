//! Continuity tester.
//!
//! One [`ContinuityTester::scan`] runs four passes over the harness, in
//! this order:
//!
//! 1. **Direct**: each output must pull its own input HIGH *and* LOW.
//!    A line that is stuck at either level is not evidence of a wire.
//! 2. **Cross**: every ordered `(i, j)`, `i != j`: does output i reach
//!    input j?
//! 3. **Input short**: every unordered input pair `(a, b)`: input a is
//!    briefly driven as an output and input b is sampled.
//! 4. **Output short**: every unordered output pair `(a, b)`: a HIGH,
//!    b LOW, then b flipped to an input and sampled.
//!
//! Passes 3 and 4 repurpose pin directions, so every temporary change is
//! held in a guard from [`guard`] and undone on the way out.  A hardware
//! error only voids the test it happened in; the scan always completes.

pub mod guard;
pub mod report;
pub mod teach;

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::app::ports::{Level, PinController, PinId, Pull};
use crate::config::WireHarnessConfig;
use crate::error::HardwareError;

use guard::{DriveHigh, Role, RoleSwap};
pub use report::FaultReport;

/// Settle time used when none is configured.
pub const DEFAULT_SETTLE_MS: u32 = 10;

const NOMINAL_INPUT: Role = Role::Input(Pull::Down);
const NOMINAL_OUTPUT: Role = Role::Output(Level::Low);

/// Runs scans over a harness.  Exclusively owns the harness pin bus.
pub struct ContinuityTester<P, D> {
    pins: P,
    delay: D,
    settle_ms: u32,
}

impl<P: PinController, D: DelayNs> ContinuityTester<P, D> {
    pub fn new(pins: P, delay: D, settle_ms: u32) -> Self {
        Self {
            pins,
            delay,
            settle_ms,
        }
    }

    pub fn controller(&self) -> &P {
        &self.pins
    }

    pub fn controller_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    pub fn settle_ms(&self) -> u32 {
        self.settle_ms
    }

    /// Outputs LOW, inputs pull-down.  Returns the number of pins that
    /// refused their role.
    pub fn prepare(&mut self, harness: &WireHarnessConfig) -> usize {
        let mut failures = 0;
        for pa in harness.pairs() {
            for (pin, role) in [
                (pa.output_pin, NOMINAL_OUTPUT),
                (pa.input_pin, NOMINAL_INPUT),
            ] {
                if let Err(e) = role.apply(&mut self.pins, pin) {
                    warn!("pair {}: {e}", pa.pair_number);
                    failures += 1;
                }
            }
        }
        failures
    }

    /// Leave every harness pin as a pulled-down input.
    pub fn park(&mut self, harness: &WireHarnessConfig) {
        for pin in harness.output_pins().chain(harness.input_pins()) {
            if let Err(e) = NOMINAL_INPUT.apply(&mut self.pins, pin) {
                warn!("park: {e}");
            }
        }
    }

    /// Run all four passes and return what was found.
    pub fn scan(&mut self, harness: &WireHarnessConfig) -> FaultReport {
        self.prepare(harness);
        let mut report = FaultReport::new(harness.len());

        self.direct_pass(harness, &mut report);
        self.cross_pass(harness, &mut report);
        self.input_short_pass(harness, &mut report);
        self.output_short_pass(harness, &mut report);

        debug!(
            "scan: connected={}/{} cross={:?} in_shorts={:?} out_shorts={:?}",
            report.connected_count(),
            harness.len(),
            report.cross_connections,
            report.input_shorts,
            report.output_shorts,
        );
        report
    }

    // ── Passes ────────────────────────────────────────────────

    fn direct_pass(&mut self, harness: &WireHarnessConfig, report: &mut FaultReport) {
        let Self {
            pins,
            delay,
            settle_ms,
        } = self;
        for pa in harness.pairs() {
            match probe_pair(pins, delay, *settle_ms, pa.output_pin, pa.input_pin) {
                Ok(connected) => report.pair_connected[pa.pair_index] = connected,
                Err(e) => warn!("pair {}: {e}; treated as not connected", pa.pair_number),
            }
        }
    }

    fn cross_pass(&mut self, harness: &WireHarnessConfig, report: &mut FaultReport) {
        let Self {
            pins,
            delay,
            settle_ms,
        } = self;
        let pairs = harness.pairs();
        for src in pairs {
            for dst in pairs.iter().filter(|p| p.pair_index != src.pair_index) {
                let result = DriveHigh::engage(pins, src.output_pin).and_then(|mut hi| {
                    delay.delay_ms(*settle_ms);
                    hi.pins().read(dst.input_pin)
                });
                match result {
                    Ok(Level::High) => {
                        report
                            .cross_connections
                            .insert((src.pair_index, dst.pair_index));
                    }
                    Ok(Level::Low) => {}
                    Err(e) => debug!(
                        "cross {} -> {}: {e}; no evidence",
                        src.pair_number, dst.pair_number
                    ),
                }
            }
        }
    }

    fn input_short_pass(&mut self, harness: &WireHarnessConfig, report: &mut FaultReport) {
        let Self {
            pins,
            delay,
            settle_ms,
        } = self;
        let pairs = harness.pairs();
        for (n, a) in pairs.iter().enumerate() {
            for b in &pairs[n + 1..] {
                let result = RoleSwap::engage(
                    pins,
                    a.input_pin,
                    Role::Output(Level::High),
                    NOMINAL_INPUT,
                )
                .and_then(|mut swap| {
                    delay.delay_ms(*settle_ms);
                    swap.pins().read(b.input_pin)
                });
                match result {
                    Ok(Level::High) => {
                        report.input_shorts.insert((a.pair_index, b.pair_index));
                    }
                    Ok(Level::Low) => {}
                    Err(e) => debug!(
                        "input short {} / {}: {e}; no evidence",
                        a.pair_number, b.pair_number
                    ),
                }
            }
        }
    }

    fn output_short_pass(&mut self, harness: &WireHarnessConfig, report: &mut FaultReport) {
        let Self {
            pins,
            delay,
            settle_ms,
        } = self;
        let pairs = harness.pairs();
        for (n, a) in pairs.iter().enumerate() {
            for b in &pairs[n + 1..] {
                let result = output_short_probe(pins, delay, *settle_ms, a.output_pin, b.output_pin);
                match result {
                    Ok(true) => {
                        report.output_shorts.insert((a.pair_index, b.pair_index));
                    }
                    Ok(false) => {}
                    Err(e) => debug!(
                        "output short {} / {}: {e}; no evidence",
                        a.pair_number, b.pair_number
                    ),
                }
            }
        }
    }
}

// ── Single-line probes ────────────────────────────────────────

/// Direct continuity test of one wire: `input` must follow `output`
/// HIGH and then LOW.  Leaves `output` LOW.
pub(crate) fn probe_pair<P: PinController, D: DelayNs>(
    pins: &mut P,
    delay: &mut D,
    settle_ms: u32,
    output: PinId,
    input: PinId,
) -> Result<bool, HardwareError> {
    let mut hi = DriveHigh::engage(pins, output)?;
    delay.delay_ms(settle_ms);
    let followed_high = hi.pins().read(input)?.is_high();
    hi.release()?;

    delay.delay_ms(settle_ms);
    let followed_low = !pins.read(input)?.is_high();

    Ok(followed_high && followed_low)
}

/// Drive `a` HIGH and `b` LOW, flip `b` to an input and sample it.
fn output_short_probe<P: PinController, D: DelayNs>(
    pins: &mut P,
    delay: &mut D,
    settle_ms: u32,
    a: PinId,
    b: PinId,
) -> Result<bool, HardwareError> {
    let mut hi = DriveHigh::engage(pins, a)?;
    hi.pins().write(b, Level::Low)?;
    let mut swap = RoleSwap::engage(hi.pins(), b, NOMINAL_INPUT, NOMINAL_OUTPUT)?;
    delay.delay_ms(settle_ms);
    let high = swap.pins().read(b)?.is_high();
    Ok(high)
}
