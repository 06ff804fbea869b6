//! Timed loops and cancellation.
//!
//! The scan loop and the reporter are plain threads that sleep between
//! cycles on a shared [`CancelToken`].  Cancellation wakes them early but
//! is only acted on between cycles; a scan in progress always finishes.
//!
//! ```text
//!   main ──spawn──▶ run_scan_loop ──tick()──▶ AppService
//!        ──spawn──▶ run_reporter  ──telemetry()──▶ AppContext
//!        ──stdin──▶ AppContext::handle_command
//!               │
//!               └──cancel()──▶ CancelToken (wakes both loops)
//! ```

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use embedded_hal::delay::DelayNs;
use log::info;

use crate::app::context::AppContext;
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, IndicatorPort, PersistencePort, PinController, SolenoidPort};
use crate::app::service::AppService;
use crate::counter::SessionSummary;

// ═══════════════════════════════════════════════════════════════
//  Cancellation
// ═══════════════════════════════════════════════════════════════

/// Cloneable stop signal every loop can sleep on.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every holder.  Idempotent.
    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep up to `timeout`.  Returns `true` if cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

// ═══════════════════════════════════════════════════════════════
//  Loops
// ═══════════════════════════════════════════════════════════════

/// Scan until cancelled, then drive everything to the safe state and
/// close the session.
pub fn run_scan_loop<P, D, S>(
    service: &mut AppService<P, D, S>,
    indicators: &mut impl IndicatorPort,
    store: &mut impl PersistencePort,
    sink: &mut impl EventSink,
    cancel: &CancelToken,
    interval: Duration,
) -> SessionSummary
where
    P: PinController,
    D: DelayNs,
    S: SolenoidPort,
{
    service.start(indicators, sink);
    info!("Scan loop running every {} ms", interval.as_millis());

    while !cancel.is_cancelled() {
        service.tick(indicators, store, sink, Utc::now());
        if cancel.wait_timeout(interval) {
            break;
        }
    }

    info!("Scan loop cancelled; entering safe state");
    service.shutdown(indicators, store, sink, Utc::now())
}

/// Emit a telemetry snapshot every `interval` until cancelled.
pub fn run_reporter<S: SolenoidPort>(
    ctx: &AppContext<S>,
    sink: &mut impl EventSink,
    cancel: &CancelToken,
    interval: Duration,
) {
    while !cancel.wait_timeout(interval) {
        sink.emit(&AppEvent::Telemetry(ctx.telemetry()));
    }
}
