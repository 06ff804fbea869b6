//! GPIO pin assignments for the wire-checker rig (BCM numbering).
//!
//! Single source of truth for the default board layout.  Harness pins are
//! configurable per product; the actuator and indicator pins below are
//! fixed by the rig wiring and are always reserved.

use crate::app::ports::PinId;

// ---------------------------------------------------------------------------
// Indicator lights (active HIGH)
// ---------------------------------------------------------------------------

pub const RED_LED_GPIO: PinId = 2;
pub const YELLOW_LED_GPIO: PinId = 3;
pub const GREEN_LED_GPIO: PinId = 4;

// ---------------------------------------------------------------------------
// Lock solenoids (relay board, active LOW)
// ---------------------------------------------------------------------------

pub const SOLENOID_GPIO: PinId = 13;
pub const SOLENOID2_GPIO: PinId = 15;

// ---------------------------------------------------------------------------
// Buzzer: wired on the board, not driven.
// ---------------------------------------------------------------------------

pub const BUZZER_GPIO: PinId = 18;

/// Pins that a harness configuration may never use.
pub const RESERVED_GPIOS: [PinId; 6] = [
    RED_LED_GPIO,
    YELLOW_LED_GPIO,
    GREEN_LED_GPIO,
    SOLENOID_GPIO,
    SOLENOID2_GPIO,
    BUZZER_GPIO,
];

/// Highest BCM pin exposed on the 40-pin header.
pub const MAX_BCM_GPIO: PinId = 27;

// ---------------------------------------------------------------------------
// Default 4-pair harness (output, input)
// ---------------------------------------------------------------------------

pub const DEFAULT_WIRE_PAIRS: [(PinId, PinId); 4] = [(17, 27), (22, 10), (9, 11), (5, 6)];

/// Header pins available for teaching mode: every BCM pin that is not
/// reserved, excluding the ID EEPROM pins 0/1.
pub fn teach_candidates() -> Vec<PinId> {
    (2..=MAX_BCM_GPIO)
        .filter(|p| !RESERVED_GPIOS.contains(p))
        .collect()
}
