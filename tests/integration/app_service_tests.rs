//! Integration tests for the scan → classify → interlock pipeline.
//!
//! These run on the host against simulated pins and verify that status
//! changes drive the counters, persistence hook, indicators and interlock
//! exactly once per edge.

use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

use crate::mock_hw::{Bench, IndicatorCall, MockIndicators, MockStore, OPERATOR_CARD, RecordingSink, t};

use wirecheck::app::commands::AppCommand;
use wirecheck::app::events::AppEvent;
use wirecheck::app::ports::{Direction, Level};
use wirecheck::classifier::{PartialConnectionPolicy, Status};
use wirecheck::scheduler::{CancelToken, run_reporter, run_scan_loop};

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_parks_pins_and_announces_session() {
    let mut b = Bench::new();
    b.start();

    assert_eq!(b.ctx.status(), Status::Initializing);
    assert_eq!(b.indicators.last_call(), Some(IndicatorCall::AllOff));
    assert_eq!(
        b.sink.events.first(),
        Some(&AppEvent::Started {
            product_no: "WH-4P".into(),
            pairs: 4
        })
    );
    for (out, inp) in b.config.harness.pin_pairs() {
        assert_eq!(b.pins().direction(out), Some(Direction::Out));
        assert_eq!(b.pins().direction(inp), Some(Direction::In));
    }
}

// ── Correct wiring ────────────────────────────────────────────

#[test]
fn correct_harness_is_good_and_energises_solenoid() {
    let mut b = Bench::new();
    b.start();

    assert_eq!(b.tick(1), Status::Good);
    assert_eq!(b.ctx.status(), Status::Good);
    assert!(b.ctx.interlock().solenoid_energised());
    assert!(b.relays_energised());
    assert_eq!(b.indicators.last_call(), Some(IndicatorCall::Show(Status::Good)));
    assert_eq!(b.store.transitions, vec![(Status::Good, t(1))]);
    assert_eq!(b.sink.status_changes(), vec![(Status::Initializing, Status::Good)]);

    let c = b.ctx.counters();
    assert_eq!(c.checked, 1);
    // Only a GOOD reached from OPEN counts.
    assert_eq!(c.good, 0);
}

#[test]
fn side_effects_fire_on_edges_only() {
    let mut b = Bench::new();
    b.start();
    for i in 1..=5 {
        assert_eq!(b.tick(i), Status::Good);
    }

    assert_eq!(b.store.transitions.len(), 1);
    assert_eq!(b.sink.status_changes().len(), 1);
    let shows = b
        .indicators
        .calls
        .iter()
        .filter(|c| matches!(c, IndicatorCall::Show(_)))
        .count();
    assert_eq!(shows, 1);
    assert_eq!(b.ctx.counters().checked, 5);
    assert_eq!(b.service.cycles(), 5);
}

// ── Open harness ──────────────────────────────────────────────

#[test]
fn unplugged_harness_is_open_and_releases_solenoid() {
    let mut b = Bench::new();
    b.start();
    b.tick(1);
    assert!(b.ctx.interlock().solenoid_energised());

    // Pair 4 (5 -> 6) unplugged.
    b.rewire(&[&[17, 27], &[22, 10], &[9, 11]]);
    assert_eq!(b.tick(2), Status::Open);
    assert!(!b.ctx.interlock().solenoid_energised());
    assert!(!b.ctx.interlock().is_locked());
    assert_eq!(b.ctx.counters().open, 1);

    // Plugged back in: OPEN -> GOOD counts.
    b.rewire(&[&[17, 27], &[22, 10], &[9, 11], &[5, 6]]);
    assert_eq!(b.tick(3), Status::Good);
    assert_eq!(b.ctx.counters().good, 1);
    assert_eq!(
        b.store.transitions,
        vec![(Status::Good, t(1)), (Status::Open, t(2)), (Status::Good, t(3))]
    );
}

#[test]
fn empty_fixture_is_open() {
    let mut b = Bench::new();
    b.rewire(&[]);
    b.start();
    assert_eq!(b.tick(1), Status::Open);
    assert_eq!(b.indicators.last_call(), Some(IndicatorCall::Show(Status::Open)));
}

#[test]
fn partial_harness_is_not_good_under_strict_policy() {
    let mut config = wirecheck::config::SystemConfig::default();
    config.partial_connection_policy = PartialConnectionPolicy::NotGood;
    let mut b = Bench::with_config(config);
    b.rewire(&[&[17, 27], &[22, 10], &[9, 11]]);
    b.start();

    assert_eq!(b.tick(1), Status::NotGood);
    let state = b.ctx.interlock().lock_state();
    assert!(state.is_locked);
    assert_eq!(
        state.reason.as_deref(),
        Some("NOT GOOD - partial connection (3 of 4 pairs)")
    );
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn shorted_outputs_lock_the_interlock() {
    let mut b = Bench::new();
    // Outputs 22 and 5 share a net; input 6 is floating.
    b.rewire(&[&[17, 27], &[22, 10, 5], &[9, 11]]);
    b.start();

    let outcome = b.service.tick(&mut b.indicators, &mut b.store, &mut b.sink, t(1));
    assert_eq!(outcome.status, Status::NotGood);
    assert_eq!(outcome.report.output_shorts, BTreeSet::from([(1, 3)]));
    assert!(!outcome.report.pair_connected[3]);

    let state = b.ctx.interlock().lock_state();
    assert!(state.is_locked);
    let reason = state.reason.unwrap();
    assert!(reason.starts_with("NOT GOOD - "), "{reason}");
    assert!(reason.contains("output short between pairs 2 and 4"), "{reason}");
    assert_eq!(b.sink.locks(), vec![reason.as_str()]);
    assert!(!b.ctx.interlock().solenoid_energised());
    assert_eq!(b.indicators.last_call(), Some(IndicatorCall::Show(Status::NotGood)));
}

#[test]
fn cross_wired_pairs_are_not_good() {
    let mut b = Bench::new();
    // Pair 1 output also reaches pair 3 input.
    b.pins().mirror(17, 11);
    b.start();

    assert_eq!(b.tick(1), Status::NotGood);
    let reason = b.ctx.interlock().lock_state().reason.unwrap();
    assert!(reason.contains("cross connection detected (pair 1 -> pair 3)"), "{reason}");
}

#[test]
fn fixing_the_harness_does_not_unlock() {
    let mut b = Bench::new();
    b.pins().mirror(17, 11);
    b.start();
    assert_eq!(b.tick(1), Status::NotGood);

    b.rewire(&[&[17, 27], &[22, 10], &[9, 11], &[5, 6]]);
    assert_eq!(b.tick(2), Status::Good);
    assert!(b.ctx.interlock().is_locked());
    assert!(!b.ctx.interlock().solenoid_energised());
    assert!(!b.relays_energised());
}

#[test]
fn card_unlocks_after_fault_and_is_audited() {
    let mut b = Bench::new();
    b.pins().mirror(17, 11);
    b.start();
    b.tick(1);

    let keep_going = b.ctx.handle_command(
        AppCommand::PresentCard(format!("  {OPERATOR_CARD} ")),
        &mut b.store,
        &mut b.sink,
        t(5),
    );
    assert!(keep_going);
    assert!(!b.ctx.interlock().is_locked());
    assert!(b.ctx.interlock().solenoid_energised());

    assert_eq!(b.store.unlocks.len(), 1);
    let entry = &b.store.unlocks[0];
    assert_eq!(entry.card_id, OPERATOR_CARD);
    assert_eq!(entry.name, "Dana");
    assert_eq!(entry.timestamp, t(5));
    assert!(entry.prior_reason.starts_with("NOT GOOD - cross connection"));
    assert!(matches!(b.sink.events.last(), Some(AppEvent::Unlocked(_))));
}

#[test]
fn unknown_card_keeps_the_lock() {
    let mut b = Bench::new();
    b.pins().mirror(17, 11);
    b.start();
    b.tick(1);

    b.ctx.handle_command(
        AppCommand::PresentCard("DEADBEEF".into()),
        &mut b.store,
        &mut b.sink,
        t(2),
    );
    assert!(b.ctx.interlock().is_locked());
    assert!(b.store.unlocks.is_empty());
    assert_eq!(
        b.sink.events.last(),
        Some(&AppEvent::CardRejected {
            card_id: "DEADBEEF".into()
        })
    );
}

#[test]
fn manual_lock_and_end_session_commands() {
    let mut b = Bench::new();
    b.start();
    b.tick(1);

    assert!(b.ctx.handle_command(
        AppCommand::parse_line("lock changeover").unwrap(),
        &mut b.store,
        &mut b.sink,
        t(2),
    ));
    assert_eq!(
        b.ctx.interlock().lock_state().reason.as_deref(),
        Some("changeover")
    );
    assert!(!b.ctx.handle_command(AppCommand::EndSession, &mut b.store, &mut b.sink, t(3)));
}

// ── Persistence failures ──────────────────────────────────────

#[test]
fn persistence_failure_does_not_change_state() {
    let mut b = Bench::new();
    b.store = MockStore::failing();
    b.start();

    assert_eq!(b.tick(1), Status::Good);
    b.rewire(&[]);
    assert_eq!(b.tick(2), Status::Open);

    assert_eq!(b.ctx.status(), Status::Open);
    let c = b.ctx.counters();
    assert_eq!((c.checked, c.open), (2, 1));
    assert_eq!(b.sink.status_changes().len(), 2);
    assert!(b.store.transitions.is_empty());
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_reaches_safe_state() {
    let mut b = Bench::new();
    b.start();
    b.tick(1);
    assert!(b.relays_energised());

    let summary = b
        .service
        .shutdown(&mut b.indicators, &mut b.store, &mut b.sink, t(10));

    assert!(!b.ctx.interlock().solenoid_energised());
    assert!(!b.relays_energised());
    assert_eq!(b.indicators.last_call(), Some(IndicatorCall::AllOff));
    for (out, inp) in b.config.harness.pin_pairs() {
        assert_eq!(b.pins().direction(out), Some(Direction::In));
        assert_eq!(b.pins().direction(inp), Some(Direction::In));
        assert_eq!(b.pins().driven(out), None);
    }

    assert_eq!(summary.started_at, t(0));
    assert_eq!(summary.ended_at, t(10));
    assert_eq!(summary.counters.checked, 1);
    assert_eq!(b.store.sessions, vec![summary.clone()]);
    assert_eq!(b.sink.events.last(), Some(&AppEvent::SessionEnded(summary)));
}

#[test]
fn shutdown_while_locked_still_releases() {
    let mut b = Bench::new();
    b.pins().mirror(17, 11);
    b.start();
    b.tick(1);

    b.service
        .shutdown(&mut b.indicators, &mut b.store, &mut b.sink, t(2));
    assert!(!b.relays_energised());
    assert!(b.ctx.interlock().is_locked());
}

#[test]
fn stuck_input_reads_as_open_pair() {
    let mut b = Bench::new();
    b.pins().stick(27, Level::Low);
    b.start();
    assert_eq!(b.tick(1), Status::Open);
}

// ── Threads ───────────────────────────────────────────────────

#[test]
fn scan_loop_runs_until_cancelled() {
    let b = Bench::new();
    let Bench { mut service, ctx, .. } = b;
    let cancel = CancelToken::new();

    let loop_cancel = cancel.clone();
    let handle = thread::spawn(move || {
        let mut indicators = MockIndicators::new();
        let mut store = MockStore::new();
        let mut sink = RecordingSink::new();
        let summary = run_scan_loop(
            &mut service,
            &mut indicators,
            &mut store,
            &mut sink,
            &loop_cancel,
            Duration::from_millis(5),
        );
        (summary, indicators, store)
    });

    let reporter_ctx = std::sync::Arc::clone(&ctx);
    let reporter_cancel = cancel.clone();
    let reporter = thread::spawn(move || {
        let mut sink = RecordingSink::new();
        run_reporter(&reporter_ctx, &mut sink, &reporter_cancel, Duration::from_millis(5));
        sink
    });

    thread::sleep(Duration::from_millis(60));
    cancel.cancel();

    let (summary, indicators, store) = handle.join().unwrap();
    let reports = reporter.join().unwrap();

    assert!(summary.counters.checked >= 1);
    assert_eq!(store.sessions.len(), 1);
    assert_eq!(indicators.last_call(), Some(IndicatorCall::AllOff));
    assert!(!ctx.interlock().solenoid_energised());
    assert!(
        reports
            .events
            .iter()
            .all(|e| matches!(e, AppEvent::Telemetry(_)))
    );
}
