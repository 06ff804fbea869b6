//! Teaching mode: discover which header pins a known-good harness joins.
//!
//! Every candidate is tried as an output against every other candidate as
//! a pulled-down input, using the same direct test as a scan.  Each pin
//! ends up in at most one discovered pair.

use std::collections::BTreeSet;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use super::guard::{Role, RoleSwap};
use super::probe_pair;
use crate::app::ports::{Level, PinController, PinId, Pull};

/// Probe `candidates` and return the `(output, input)` pairs found, in
/// discovery order.  All candidates are left as pulled-down inputs.
pub fn discover_pairs<P: PinController, D: DelayNs>(
    pins: &mut P,
    delay: &mut D,
    candidates: &[PinId],
    settle_ms: u32,
) -> Vec<(PinId, PinId)> {
    let idle = Role::Input(Pull::Down);
    for &pin in candidates {
        if let Err(e) = idle.apply(pins, pin) {
            warn!("teach: {e}; pin skipped");
        }
    }

    let mut used: BTreeSet<PinId> = BTreeSet::new();
    let mut found = Vec::new();

    for &out in candidates {
        if used.contains(&out) {
            continue;
        }
        let mut swap = match RoleSwap::engage(pins, out, Role::Output(Level::Low), idle) {
            Ok(s) => s,
            Err(e) => {
                debug!("teach: {e}");
                continue;
            }
        };

        for &inp in candidates {
            if inp == out || used.contains(&inp) {
                continue;
            }
            match probe_pair(swap.pins(), delay, settle_ms, out, inp) {
                Ok(true) => {
                    info!("TEACH | found GPIO{out} -> GPIO{inp}");
                    used.insert(out);
                    used.insert(inp);
                    found.push((out, inp));
                    break;
                }
                Ok(false) => {}
                Err(e) => debug!("teach {out} -> {inp}: {e}"),
            }
        }
    }

    info!("TEACH | {} pair(s) discovered", found.len());
    found
}
