//! Fuzz target: `SystemConfig::from_json`
//!
//! Any document that loads must already satisfy every validation rule,
//! and must reload to the same value after re-serialisation.
//!
//! cargo fuzz run fuzz_config_loader

#![no_main]

use libfuzzer_sys::fuzz_target;
use wirecheck::config::{MAX_PAIRS, SystemConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(cfg) = SystemConfig::from_json(text) else {
        return;
    };

    assert!(cfg.validate().is_ok(), "loaded config must be valid");
    assert!(!cfg.harness.is_empty() && cfg.harness.len() <= MAX_PAIRS);
    for pin in cfg.harness.output_pins().chain(cfg.harness.input_pins()) {
        assert!(!cfg.harness.reserved_pins().contains(&pin));
    }

    let again = cfg.to_json_pretty().expect("valid config serialises");
    assert_eq!(SystemConfig::from_json(&again).ok(), Some(cfg));
});
