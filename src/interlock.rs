//! Access-control interlock.
//!
//! Gates the lock solenoid on harness status and authorized cards.
//!
//! ## Lock lifecycle
//!
//! 1. A NOT GOOD transition requests a lock with a fault description.
//!    The solenoid is de-energised (lock position) and the reason latched.
//! 2. While locked, actuator requests from the scan loop are refused.
//!    Unknown cards are rejected and logged; nothing changes.
//! 3. A card found in the [`CardRegistry`] unlocks: the reason is cleared,
//!    the solenoid is energised and one [`AuditEntry`] is appended.
//!
//! The reason *is* the lock: `Some` means locked, so `is_locked` and
//! `reason` can never disagree.  All state sits behind one mutex; a lock
//! request from the scan thread and an unlock from the card thread
//! serialize, and the later one wins.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::SolenoidPort;
use crate::cards::{AccessLevel, CardRegistry};
use crate::error::{ActuatorError, AuthorizationError};

/// In-memory audit entries kept.
pub const AUDIT_CAPACITY: usize = 1000;

/// One successful unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub card_id: String,
    pub name: String,
    pub level: AccessLevel,
    /// Why the interlock was locked.
    pub prior_reason: String,
}

/// Point-in-time view of the lock.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LockState {
    pub is_locked: bool,
    pub reason: Option<String>,
}

/// Result of a card presentation with a known card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizeOutcome {
    /// The interlock was locked and is now open.
    Unlocked(AuditEntry),
    /// Nothing to unlock.
    AlreadyUnlocked,
}

struct Inner<S> {
    reason: Option<String>,
    solenoid: S,
    audit: VecDeque<AuditEntry>,
}

pub struct Interlock<S> {
    inner: Mutex<Inner<S>>,
    cards: Arc<CardRegistry>,
}

impl<S: SolenoidPort> Interlock<S> {
    /// Starts unlocked.  The solenoid is left as the driver initialised it.
    pub fn new(solenoid: S, cards: Arc<CardRegistry>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                reason: None,
                solenoid,
                audit: VecDeque::new(),
            }),
            cards,
        }
    }

    pub fn cards(&self) -> &Arc<CardRegistry> {
        &self.cards
    }

    // ── Lock / unlock ─────────────────────────────────────────

    /// Lock with `reason`.  Locking while locked replaces the reason.
    /// Returns `true` if the interlock was unlocked before.
    pub fn request_lock(&self, reason: &str) -> bool {
        let reason = if reason.trim().is_empty() {
            "locked"
        } else {
            reason
        };
        let mut inner = self.lock();
        let newly = inner.reason.is_none();
        if newly {
            error!("INTERLOCK LOCKED: {reason}");
        } else {
            warn!("Interlock reason updated: {reason}");
        }
        inner.reason = Some(reason.to_owned());
        if let Err(e) = inner.solenoid.set_energised(false) {
            error!("Interlock: solenoid to lock position failed: {e}");
        }
        newly
    }

    pub fn authorize(&self, card_id: &str) -> Result<AuthorizeOutcome, AuthorizationError> {
        self.authorize_at(card_id, Utc::now())
    }

    /// Check `card_id` and unlock if it is authorized.
    pub fn authorize_at(
        &self,
        card_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthorizeOutcome, AuthorizationError> {
        let card_id = card_id.trim();
        if card_id.is_empty() {
            return Err(AuthorizationError::EmptyCardId);
        }
        let Some(card) = self.cards.lookup(card_id) else {
            warn!("Unauthorized card {card_id} rejected");
            return Err(AuthorizationError::UnknownCard(card_id.to_owned()));
        };

        let mut inner = self.lock();
        let Some(prior_reason) = inner.reason.take() else {
            info!("Card {} ({}) presented; interlock not locked", card.card_id, card.name);
            return Ok(AuthorizeOutcome::AlreadyUnlocked);
        };

        if let Err(e) = inner.solenoid.set_energised(true) {
            warn!("Interlock: solenoid release failed: {e}");
        }
        let entry = AuditEntry {
            timestamp: now,
            card_id: card.card_id,
            name: card.name,
            level: card.level,
            prior_reason,
        };
        if inner.audit.len() >= AUDIT_CAPACITY {
            inner.audit.pop_front();
        }
        inner.audit.push_back(entry.clone());
        info!(
            "INTERLOCK UNLOCKED by {} ({:?}); was: {}",
            entry.name, entry.level, entry.prior_reason
        );
        Ok(AuthorizeOutcome::Unlocked(entry))
    }

    // ── Actuator gate ─────────────────────────────────────────

    /// Energise or release the solenoid.  Refused while locked unless
    /// `force` is set; `force` is for diagnostic paths only.
    pub fn control_actuator(&self, enable: bool, force: bool) -> Result<(), ActuatorError> {
        let mut inner = self.lock();
        if inner.reason.is_some() {
            if !force {
                return Err(ActuatorError::Locked);
            }
            warn!("Interlock bypassed (force): solenoid enable={enable}");
        }
        inner.solenoid.set_energised(enable)
    }

    /// Lock position, whatever the lock state.
    pub fn safe_shutdown(&self) -> Result<(), ActuatorError> {
        let mut inner = self.lock();
        let res = inner.solenoid.set_energised(false);
        match &res {
            Ok(()) => info!("Interlock: solenoid de-energised for shutdown"),
            Err(e) => error!("Interlock: shutdown release failed: {e}"),
        }
        res
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn lock_state(&self) -> LockState {
        let inner = self.lock();
        LockState {
            is_locked: inner.reason.is_some(),
            reason: inner.reason.clone(),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock().reason.is_some()
    }

    pub fn solenoid_energised(&self) -> bool {
        self.lock().solenoid.is_energised()
    }

    /// Oldest first.
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.lock().audit.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
