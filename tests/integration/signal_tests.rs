//! End-to-end shutdown of the `wirecheck` binary on SIGINT / SIGTERM.
//!
//! The binary runs against the simulated rig with stdin held open, so
//! the only way out is the signal.  A clean exit with a `session_end`
//! record proves the scan loop went through its shutdown path.

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use wirecheck::config::SystemConfig;

const DEADLINE: Duration = Duration::from_secs(20);

fn records(events: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(events)
        .unwrap_or_default()
        .lines()
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect()
}

fn wait_for_transition(child: &mut Child, events: &Path) {
    let start = Instant::now();
    while !records(events).iter().any(|r| r["kind"] == "transition") {
        if let Some(status) = child.try_wait().unwrap() {
            panic!("wirecheck exited early: {status}");
        }
        if start.elapsed() > DEADLINE {
            let _ = child.kill();
            panic!("no transition recorded within {DEADLINE:?}");
        }
        thread::sleep(Duration::from_millis(20));
    }
}

fn wait_for_exit(child: &mut Child) -> ExitStatus {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if start.elapsed() > DEADLINE {
            let _ = child.kill();
            panic!("wirecheck ignored the signal for {DEADLINE:?}");
        }
        thread::sleep(Duration::from_millis(20));
    }
}

fn signal_ends_session(signal: &str) {
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events.jsonl");

    let mut config = SystemConfig::default();
    config.settle_ms = 1;
    config.scan_interval_ms = 20;
    config.report_interval_ms = 50;
    config.cards_file = dir.path().join("cards.json");
    config.audit_log_file = dir.path().join("audit.jsonl");
    config.events_file = events.clone();
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, config.to_json_pretty().unwrap()).unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_wirecheck"))
        .arg("--sim")
        .arg("run")
        .arg(&config_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    wait_for_transition(&mut child, &events);

    let sent = Command::new("kill")
        .args([signal, &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());

    let status = wait_for_exit(&mut child);
    assert!(status.success(), "{status}");

    let log = records(&events);
    let ends: Vec<_> = log.iter().filter(|r| r["kind"] == "session_end").collect();
    assert_eq!(ends.len(), 1, "{log:?}");
    assert_eq!(ends[0]["product_no"], config.harness.product_no());
    assert_eq!(log.last().unwrap()["kind"], "session_end");
}

#[test]
fn sigint_ends_session_cleanly() {
    signal_ends_session("-INT");
}

#[test]
fn sigterm_ends_session_cleanly() {
    signal_ends_session("-TERM");
}
