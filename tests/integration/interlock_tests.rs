//! Integration tests for the RFID interlock on real solenoid drivers.
//!
//! Relay pins are simulated; assertions look at the pin levels the
//! driver leaves behind as well as the interlock's own state.

use std::sync::Arc;
use std::thread;

use crate::mock_hw::t;

use wirecheck::cards::{AccessLevel, CardRegistry};
use wirecheck::drivers::sim::SimOutputPin;
use wirecheck::drivers::solenoid::SolenoidDriver;
use wirecheck::error::{ActuatorError, AuthorizationError};
use wirecheck::interlock::{AUDIT_CAPACITY, AuthorizeOutcome, Interlock};

const CARDS_JSON: &str = r#"{
  "authorized_cards": [
    { "id": "0001", "name": "Ana", "level": "admin", "added_at": "2024-03-01T08:00:00" },
    { "id": " 0002 ", "name": "Ben", "level": "tech", "added_at": "2024-03-02T08:00:00Z" }
  ],
  "updated_at": "2024-03-02T08:00:00Z"
}"#;

fn rig() -> (Interlock<SolenoidDriver<SimOutputPin>>, Vec<SimOutputPin>) {
    let relays = vec![SimOutputPin::new(), SimOutputPin::new()];
    let solenoid = SolenoidDriver::new(relays.clone(), true).unwrap();
    let cards = Arc::new(CardRegistry::from_json(CARDS_JSON).unwrap());
    (Interlock::new(solenoid, cards), relays)
}

/// Active-low relays: HIGH holds the lock.
fn relays_locked(relays: &[SimOutputPin]) -> bool {
    relays.iter().all(SimOutputPin::is_high)
}

#[test]
fn driver_starts_in_lock_position() {
    let (interlock, relays) = rig();
    assert!(!interlock.is_locked());
    assert!(!interlock.solenoid_energised());
    assert!(relays_locked(&relays));
}

#[test]
fn lock_then_card_unlock_moves_both_relays() {
    let (interlock, relays) = rig();
    interlock.control_actuator(true, false).unwrap();
    assert!(!relays_locked(&relays));

    assert!(interlock.request_lock("NOT GOOD - output short between pairs 1 and 2"));
    assert!(relays_locked(&relays));
    assert_eq!(
        interlock.control_actuator(true, false),
        Err(ActuatorError::Locked)
    );

    let entry = match interlock.authorize_at("0002", t(30)) {
        Ok(AuthorizeOutcome::Unlocked(entry)) => entry,
        other => panic!("expected unlock, got {other:?}"),
    };
    assert_eq!(entry.name, "Ben");
    assert_eq!(entry.level, AccessLevel::Tech);
    assert_eq!(entry.prior_reason, "NOT GOOD - output short between pairs 1 and 2");
    assert!(!relays_locked(&relays));
    assert_eq!(interlock.lock_state().reason, None);
}

#[test]
fn unknown_and_blank_cards_are_rejected() {
    let (interlock, relays) = rig();
    interlock.request_lock("manual");

    assert_eq!(
        interlock.authorize_at("9999", t(1)),
        Err(AuthorizationError::UnknownCard("9999".into()))
    );
    assert_eq!(interlock.authorize_at("   ", t(1)), Err(AuthorizationError::EmptyCardId));
    assert!(interlock.is_locked());
    assert!(relays_locked(&relays));
    assert!(interlock.audit_log().is_empty());
}

#[test]
fn card_while_unlocked_is_a_no_op() {
    let (interlock, _relays) = rig();
    assert_eq!(
        interlock.authorize_at("0001", t(1)),
        Ok(AuthorizeOutcome::AlreadyUnlocked)
    );
    assert!(interlock.audit_log().is_empty());
}

#[test]
fn relay_write_failure_is_reported_and_state_kept() {
    let (interlock, relays) = rig();
    relays[1].set_failing(true);

    assert_eq!(
        interlock.control_actuator(true, false),
        Err(ActuatorError::GpioWriteFailed)
    );
    assert!(!interlock.solenoid_energised());

    relays[1].set_failing(false);
    interlock.control_actuator(true, false).unwrap();
    assert!(interlock.solenoid_energised());
    interlock.safe_shutdown().unwrap();
    assert!(relays_locked(&relays));
}

#[test]
fn audit_log_is_bounded() {
    let (interlock, _relays) = rig();
    for i in 0..=AUDIT_CAPACITY {
        interlock.request_lock(&format!("fault {i}"));
        interlock.authorize_at("0001", t(i as i64)).unwrap();
    }
    let log = interlock.audit_log();
    assert_eq!(log.len(), AUDIT_CAPACITY);
    assert_eq!(log[0].prior_reason, "fault 1");
    assert_eq!(log[AUDIT_CAPACITY - 1].prior_reason, format!("fault {AUDIT_CAPACITY}"));
}

#[test]
fn concurrent_lock_and_unlock_stay_consistent() {
    let (interlock, _relays) = rig();
    let interlock = Arc::new(interlock);

    let scanner = {
        let il = Arc::clone(&interlock);
        thread::spawn(move || {
            for i in 0..200 {
                il.request_lock(&format!("NOT GOOD - scan {i}"));
            }
        })
    };
    let reader = {
        let il = Arc::clone(&interlock);
        thread::spawn(move || {
            for i in 0..200 {
                let _ = il.authorize_at("0001", t(i));
                let state = il.lock_state();
                assert_eq!(state.is_locked, state.reason.is_some());
            }
        })
    };
    scanner.join().unwrap();
    reader.join().unwrap();

    let state = interlock.lock_state();
    assert_eq!(state.is_locked, state.reason.is_some());
    assert_eq!(state.is_locked, !interlock.solenoid_energised());
    for entry in interlock.audit_log() {
        assert!(entry.prior_reason.starts_with("NOT GOOD - scan "));
    }
}

#[test]
fn registry_file_round_trip_feeds_interlock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cards.json");
    let registry = CardRegistry::from_json(CARDS_JSON).unwrap();
    registry.add_at("0003", "Cy", AccessLevel::Operator, t(0)).unwrap();
    registry.remove("0001").unwrap();
    registry.save(&path).unwrap();

    let loaded = Arc::new(CardRegistry::load(&path).unwrap());
    assert_eq!(loaded.len(), 2);
    assert!(loaded.lookup("0001").is_none());

    let solenoid = SolenoidDriver::new(vec![SimOutputPin::new()], true).unwrap();
    let interlock = Interlock::new(solenoid, loaded);
    interlock.request_lock("");
    assert_eq!(interlock.lock_state().reason.as_deref(), Some("locked"));
    assert!(matches!(
        interlock.authorize_at("0003", t(9)),
        Ok(AuthorizeOutcome::Unlocked(_))
    ));
}
