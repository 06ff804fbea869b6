//! System configuration parameters
//!
//! All tunable parameters for the wire checker, plus the per-product
//! harness description.  Loaded from a JSON document and validated before
//! anything touches a pin: a harness that reuses a pin or collides with an
//! actuator pin never reaches the tester.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::ports::PinId;
use crate::classifier::PartialConnectionPolicy;
use crate::error::ConfigError;
use crate::pins;

/// Maximum number of wire pairs a harness may declare.
pub const MAX_PAIRS: usize = 16;

// ---------------------------------------------------------------------------
// Pin assignment
// ---------------------------------------------------------------------------

/// One output→input pair the harness is expected to join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAssignment {
    /// Position in the harness table (0-based).
    pub pair_index: usize,
    /// Operator-facing pair number (1-based in shipped configs).
    pub pair_number: u32,
    pub output_pin: PinId,
    pub input_pin: PinId,
}

/// On-disk form of a pair: `{pair_number, pin_out, pin_in}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePairRecord {
    pub pair_number: u32,
    pub pin_out: PinId,
    pub pin_in: PinId,
}

// ---------------------------------------------------------------------------
// Harness configuration
// ---------------------------------------------------------------------------

/// Validated, immutable description of the harness under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HarnessDocument", into = "HarnessDocument")]
pub struct WireHarnessConfig {
    product_name: String,
    product_no: String,
    pairs: heapless::Vec<PinAssignment, MAX_PAIRS>,
    reserved_pins: Vec<PinId>,
}

/// Serialized shape of [`WireHarnessConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessDocument {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_no: String,
    pub wire_pairs: Vec<WirePairRecord>,
    #[serde(default = "default_reserved")]
    pub reserved_pins: Vec<PinId>,
}

fn default_reserved() -> Vec<PinId> {
    pins::RESERVED_GPIOS.to_vec()
}

impl WireHarnessConfig {
    /// Validate and build a harness description.
    pub fn new(
        product_name: impl Into<String>,
        product_no: impl Into<String>,
        records: &[WirePairRecord],
        reserved_pins: &[PinId],
    ) -> Result<Self, ConfigError> {
        if records.is_empty() {
            return Err(ConfigError::NoPairs);
        }
        if records.len() > MAX_PAIRS {
            return Err(ConfigError::TooManyPairs {
                count: records.len(),
                max: MAX_PAIRS,
            });
        }

        let mut used: HashSet<PinId> = HashSet::new();
        let mut numbers: HashSet<u32> = HashSet::new();
        let mut pairs = heapless::Vec::new();

        for (pair_index, rec) in records.iter().enumerate() {
            if rec.pair_number == 0 {
                return Err(ConfigError::ValidationFailed("pair numbers start at 1"));
            }
            if !numbers.insert(rec.pair_number) {
                return Err(ConfigError::DuplicatePairNumber(rec.pair_number));
            }
            for pin in [rec.pin_out, rec.pin_in] {
                if pin > pins::MAX_BCM_GPIO {
                    return Err(ConfigError::InvalidPin { pin });
                }
                if reserved_pins.contains(&pin) {
                    return Err(ConfigError::ReservedPin {
                        pin,
                        pair_number: rec.pair_number,
                    });
                }
                if !used.insert(pin) {
                    return Err(ConfigError::DuplicatePin {
                        pin,
                        pair_number: rec.pair_number,
                    });
                }
            }
            // Capacity was checked above.
            let _ = pairs.push(PinAssignment {
                pair_index,
                pair_number: rec.pair_number,
                output_pin: rec.pin_out,
                input_pin: rec.pin_in,
            });
        }

        Ok(Self {
            product_name: product_name.into(),
            product_no: product_no.into(),
            pairs,
            reserved_pins: reserved_pins.to_vec(),
        })
    }

    /// Build from plain `(out, in)` tuples, numbering pairs 1..=N.
    pub fn from_pairs(
        product_name: impl Into<String>,
        product_no: impl Into<String>,
        pairs: &[(PinId, PinId)],
        reserved_pins: &[PinId],
    ) -> Result<Self, ConfigError> {
        let records: Vec<WirePairRecord> = pairs
            .iter()
            .enumerate()
            .map(|(i, &(pin_out, pin_in))| WirePairRecord {
                pair_number: i as u32 + 1,
                pin_out,
                pin_in,
            })
            .collect();
        Self::new(product_name, product_no, &records, reserved_pins)
    }

    /// Build from pairs found in teaching mode.
    pub fn from_discovered(
        product_name: impl Into<String>,
        product_no: impl Into<String>,
        discovered: &[(PinId, PinId)],
    ) -> Result<Self, ConfigError> {
        Self::from_pairs(product_name, product_no, discovered, &pins::RESERVED_GPIOS)
    }

    pub fn pairs(&self) -> &[PinAssignment] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn product_no(&self) -> &str {
        &self.product_no
    }

    pub fn reserved_pins(&self) -> &[PinId] {
        &self.reserved_pins
    }

    pub fn output_pins(&self) -> impl Iterator<Item = PinId> + '_ {
        self.pairs.iter().map(|p| p.output_pin)
    }

    pub fn input_pins(&self) -> impl Iterator<Item = PinId> + '_ {
        self.pairs.iter().map(|p| p.input_pin)
    }

    /// Ordered `(out, in)` list, as shown to operators.
    pub fn pin_pairs(&self) -> Vec<(PinId, PinId)> {
        self.pairs
            .iter()
            .map(|p| (p.output_pin, p.input_pin))
            .collect()
    }
}

impl Default for WireHarnessConfig {
    fn default() -> Self {
        let mut pairs = heapless::Vec::new();
        for (pair_index, (out, inp)) in pins::DEFAULT_WIRE_PAIRS.iter().enumerate() {
            let _ = pairs.push(PinAssignment {
                pair_index,
                pair_number: pair_index as u32 + 1,
                output_pin: *out,
                input_pin: *inp,
            });
        }
        Self {
            product_name: String::from("Default 4-pair harness"),
            product_no: String::from("WH-4P"),
            pairs,
            reserved_pins: default_reserved(),
        }
    }
}

impl TryFrom<HarnessDocument> for WireHarnessConfig {
    type Error = ConfigError;

    fn try_from(doc: HarnessDocument) -> Result<Self, Self::Error> {
        Self::new(
            doc.product_name,
            doc.product_no,
            &doc.wire_pairs,
            &doc.reserved_pins,
        )
    }
}

impl From<WireHarnessConfig> for HarnessDocument {
    fn from(cfg: WireHarnessConfig) -> Self {
        Self {
            wire_pairs: cfg
                .pairs
                .iter()
                .map(|p| WirePairRecord {
                    pair_number: p.pair_number,
                    pin_out: p.output_pin,
                    pin_in: p.input_pin,
                })
                .collect(),
            product_name: cfg.product_name,
            product_no: cfg.product_no,
            reserved_pins: cfg.reserved_pins,
        }
    }
}

// ---------------------------------------------------------------------------
// System configuration
// ---------------------------------------------------------------------------

/// Indicator light pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorPins {
    pub red: PinId,
    pub yellow: PinId,
    pub green: PinId,
}

impl Default for IndicatorPins {
    fn default() -> Self {
        Self {
            red: pins::RED_LED_GPIO,
            yellow: pins::YELLOW_LED_GPIO,
            green: pins::GREEN_LED_GPIO,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Harness ---
    pub harness: WireHarnessConfig,
    /// How a fault-free, partially connected harness is classified.
    pub partial_connection_policy: PartialConnectionPolicy,

    // --- Timing ---
    /// Wait after each pin write before sampling (milliseconds)
    pub settle_ms: u32,
    /// Pause between full scans (milliseconds)
    pub scan_interval_ms: u32,
    /// Presentation/telemetry cadence (milliseconds)
    pub report_interval_ms: u32,

    // --- Actuators ---
    pub indicator_pins: IndicatorPins,
    pub solenoid_pins: Vec<PinId>,
    /// Relay boards pull LOW to energise.
    pub solenoid_active_low: bool,

    // --- Files ---
    pub cards_file: PathBuf,
    pub audit_log_file: PathBuf,
    pub events_file: PathBuf,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            harness: WireHarnessConfig::default(),
            partial_connection_policy: PartialConnectionPolicy::default(),

            settle_ms: 10,
            scan_interval_ms: 500,
            report_interval_ms: 1000,

            indicator_pins: IndicatorPins::default(),
            solenoid_pins: vec![pins::SOLENOID_GPIO, pins::SOLENOID2_GPIO],
            solenoid_active_low: true,

            cards_file: PathBuf::from("rfid_authorized_cards.json"),
            audit_log_file: PathBuf::from("rfid_unlock_log.jsonl"),
            events_file: PathBuf::from("wire_checker_events.jsonl"),
        }
    }
}

impl SystemConfig {
    /// Range and cross-field checks.  The harness itself was validated on
    /// construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settle_ms == 0 {
            return Err(ConfigError::ValidationFailed("settle_ms must be > 0"));
        }
        if self.scan_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("scan_interval_ms must be > 0"));
        }
        if self.report_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("report_interval_ms must be > 0"));
        }
        if self.settle_ms >= self.scan_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "settle_ms must be shorter than scan_interval_ms",
            ));
        }
        if self.solenoid_pins.is_empty() {
            return Err(ConfigError::ValidationFailed("at least one solenoid pin required"));
        }

        let reserved = self.harness.reserved_pins();
        let ind = self.indicator_pins;
        for pin in [ind.red, ind.yellow, ind.green]
            .into_iter()
            .chain(self.solenoid_pins.iter().copied())
        {
            if !reserved.contains(&pin) {
                return Err(ConfigError::UnreservedActuatorPin(pin));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
