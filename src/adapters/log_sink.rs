//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (stderr via `env_logger` in the binary).  A line-side
//! display adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as one `TAG | key=value` line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | status={} | checked={} good={} not_good={} open={} | \
                     locked={} solenoid={}{}",
                    t.status,
                    t.counters.checked,
                    t.counters.good,
                    t.counters.not_good,
                    t.counters.open,
                    t.locked,
                    if t.solenoid_energised { "ON" } else { "OFF" },
                    t.lock_reason
                        .as_deref()
                        .map(|r| format!(" | reason={r}"))
                        .unwrap_or_default(),
                );
            }
            AppEvent::StatusChanged { from, to } => {
                info!("STATUS | {} -> {}", from, to);
            }
            AppEvent::Locked { reason } => {
                warn!("LOCK | reason={reason}");
            }
            AppEvent::Unlocked(entry) => {
                info!(
                    "UNLOCK | card={} name={} level={:?} prior={}",
                    entry.card_id, entry.name, entry.level, entry.prior_reason
                );
            }
            AppEvent::CardRejected { card_id } => {
                warn!("CARD | rejected id={card_id}");
            }
            AppEvent::Started { product_no, pairs } => {
                info!("START | product={product_no} pairs={pairs}");
            }
            AppEvent::SessionEnded(s) => {
                info!(
                    "SESSION | product={} checked={} good={} not_good={} open={} | {} .. {}",
                    s.product_no,
                    s.counters.checked,
                    s.counters.good,
                    s.counters.not_good,
                    s.counters.open,
                    s.started_at.to_rfc3339(),
                    s.ended_at.to_rfc3339(),
                );
            }
        }
    }
}
