//! Authorized RFID cards.
//!
//! The registry is read far more often than it is written (every card
//! presentation vs. the occasional admin change), so it sits behind an
//! `RwLock` and is shared by `Arc` between the interlock and whoever
//! administers cards.
//!
//! On disk:
//!
//! ```json
//! { "authorized_cards": [ {"id": "...", "name": "...", "level": "tech",
//!                          "added_at": "..."} ],
//!   "updated_at": "..." }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{AuthorizationError, ConfigError, PersistenceError};

/// Upper bound on registered cards.
pub const MAX_CARDS: usize = 50;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Admin,
    Manager,
    Tech,
    Operator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedCard {
    #[serde(rename = "id")]
    pub card_id: String,
    pub name: String,
    pub level: AccessLevel,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CardsDocument {
    authorized_cards: Vec<AuthorizedCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// Thread-safe set of authorized cards keyed by card id.
#[derive(Debug, Default)]
pub struct CardRegistry {
    cards: RwLock<BTreeMap<String, AuthorizedCard>>,
}

impl CardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card, or replace the entry with the same id.
    pub fn add(
        &self,
        card_id: &str,
        name: &str,
        level: AccessLevel,
    ) -> Result<AuthorizedCard, AuthorizationError> {
        self.add_at(card_id, name, level, Utc::now())
    }

    pub fn add_at(
        &self,
        card_id: &str,
        name: &str,
        level: AccessLevel,
        added_at: DateTime<Utc>,
    ) -> Result<AuthorizedCard, AuthorizationError> {
        let card_id = card_id.trim();
        if card_id.is_empty() {
            return Err(AuthorizationError::EmptyCardId);
        }
        let card = AuthorizedCard {
            card_id: card_id.to_owned(),
            name: name.to_owned(),
            level,
            added_at,
        };

        let mut cards = self.cards.write().unwrap_or_else(PoisonError::into_inner);
        if !cards.contains_key(card_id) && cards.len() >= MAX_CARDS {
            return Err(AuthorizationError::RegistryFull { max: MAX_CARDS });
        }
        cards.insert(card.card_id.clone(), card.clone());
        info!("CARD | added id={} name={} level={:?}", card.card_id, card.name, card.level);
        Ok(card)
    }

    pub fn remove(&self, card_id: &str) -> Option<AuthorizedCard> {
        let removed = self
            .cards
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(card_id.trim());
        if let Some(card) = &removed {
            info!("CARD | removed id={}", card.card_id);
        }
        removed
    }

    pub fn lookup(&self, card_id: &str) -> Option<AuthorizedCard> {
        self.cards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(card_id.trim())
            .cloned()
    }

    pub fn list(&self) -> Vec<AuthorizedCard> {
        self.cards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cards.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── JSON ──────────────────────────────────────────────────

    /// Parse a cards document.  Duplicate ids keep the last entry.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let doc: CardsDocument =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut cards = BTreeMap::new();
        for mut card in doc.authorized_cards {
            card.card_id = card.card_id.trim().to_owned();
            if card.card_id.is_empty() {
                return Err(ConfigError::ValidationFailed("card id must not be empty"));
            }
            cards.insert(card.card_id.clone(), card);
        }
        if cards.len() > MAX_CARDS {
            return Err(ConfigError::ValidationFailed("too many authorized cards"));
        }
        Ok(Self {
            cards: RwLock::new(cards),
        })
    }

    pub fn to_json(&self, updated_at: DateTime<Utc>) -> Result<String, PersistenceError> {
        let doc = CardsDocument {
            authorized_cards: self.list(),
            updated_at: Some(updated_at),
        };
        serde_json::to_string_pretty(&doc).map_err(|e| PersistenceError::Encode(e.to_string()))
    }

    /// Load from `path`.  A missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let reg = Self::from_json(&text)?;
                info!("Loaded {} authorized card(s) from {}", reg.len(), path.display());
                Ok(reg)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No card file at {}; starting with no authorized cards", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(ConfigError::Io(e.to_string())),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let text = self.to_json(Utc::now())?;
        fs::write(path, text).map_err(|e| PersistenceError::Io(e.to_string()))
    }
}

/// Accepts RFC 3339 and the zone-less ISO form older card files carry
/// (read as UTC).
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(d)?;
        if let Ok(t) = DateTime::parse_from_rfc3339(&s) {
            return Ok(t.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|n| n.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
