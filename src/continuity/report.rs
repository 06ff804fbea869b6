//! Per-scan fault report.

use std::collections::BTreeSet;

use crate::config::{MAX_PAIRS, WireHarnessConfig};

/// Findings of one scan, indexed by pair position (0-based).
///
/// Built fresh by every scan and dropped after classification.  Pairs that
/// could not be tested stay `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultReport {
    pub pair_connected: heapless::Vec<bool, MAX_PAIRS>,
    /// `(i, j)`: output of pair i drives the input of pair j.
    pub cross_connections: BTreeSet<(usize, usize)>,
    /// `(a, b)`, `a < b`: inputs of pairs a and b are tied.
    pub input_shorts: BTreeSet<(usize, usize)>,
    /// `(a, b)`, `a < b`: outputs of pairs a and b are tied.
    pub output_shorts: BTreeSet<(usize, usize)>,
}

impl FaultReport {
    /// An all-open report for `pairs` pairs (capped at [`MAX_PAIRS`]).
    pub fn new(pairs: usize) -> Self {
        let mut pair_connected = heapless::Vec::new();
        for _ in 0..pairs.min(MAX_PAIRS) {
            let _ = pair_connected.push(false);
        }
        Self {
            pair_connected,
            ..Self::default()
        }
    }

    pub fn has_faults(&self) -> bool {
        !(self.cross_connections.is_empty()
            && self.input_shorts.is_empty()
            && self.output_shorts.is_empty())
    }

    pub fn connected_count(&self) -> usize {
        self.pair_connected.iter().filter(|c| **c).count()
    }

    pub fn all_connected(&self) -> bool {
        !self.pair_connected.is_empty() && self.pair_connected.iter().all(|c| *c)
    }

    /// Human-readable fault summary using the harness's pair numbers.
    pub fn describe(&self, harness: &WireHarnessConfig) -> String {
        let num = |idx: usize| {
            harness
                .pairs()
                .get(idx)
                .map_or(idx as u32 + 1, |p| p.pair_number)
        };

        let mut parts: Vec<String> = Vec::new();
        for &(i, j) in &self.cross_connections {
            parts.push(format!(
                "cross connection detected (pair {} -> pair {})",
                num(i),
                num(j)
            ));
        }
        for &(a, b) in &self.output_shorts {
            parts.push(format!("output short between pairs {} and {}", num(a), num(b)));
        }
        for &(a, b) in &self.input_shorts {
            parts.push(format!("input short between pairs {} and {}", num(a), num(b)));
        }

        if parts.is_empty() {
            return format!(
                "partial connection ({} of {} pairs)",
                self.connected_count(),
                self.pair_connected.len()
            );
        }
        parts.join("; ")
    }
}
