//! Fuzz target: `CardRegistry::from_json`
//!
//! Arbitrary registry documents must never panic, never exceed the card
//! cap, and never yield ids that fail a trimmed lookup.
//!
//! cargo fuzz run fuzz_card_registry

#![no_main]

use libfuzzer_sys::fuzz_target;
use wirecheck::cards::{CardRegistry, MAX_CARDS};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(registry) = CardRegistry::from_json(text) else {
        return;
    };

    assert!(registry.len() <= MAX_CARDS);
    for card in registry.list() {
        assert_eq!(card.card_id.trim(), card.card_id);
        assert!(registry.lookup(&format!(" {} ", card.card_id)).is_some());
    }
});
