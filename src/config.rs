//! Startup configuration.

use crate::error::{StoreError, StoreResult};
use crate::store::StoreConfig;
use crate::types::{SessionInput, Timestamp};
use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::path::Path;
use subtle::ConstantTimeEq;

/// Everything the roster needs at startup, passed in explicitly.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub store: StoreConfig,

    /// PIN guarding admin actions. No PIN means admin actions are disabled.
    pub admin_pin: Option<String>,

    /// Maximum number of sessions returned by a listing.
    pub session_list_limit: usize,

    pub defaults: SessionDefaults,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            admin_pin: None,
            session_list_limit: 100,
            defaults: SessionDefaults::default(),
        }
    }
}

impl RosterConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let raw = std::fs::read(path.as_ref())?;
        serde_json::from_slice(&raw).map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    /// Check an admin PIN in constant time. Always false when no PIN is set.
    pub fn admin_pin_matches(&self, candidate: &str) -> bool {
        match &self.admin_pin {
            Some(pin) if !pin.is_empty() => {
                bool::from(pin.as_bytes().ct_eq(candidate.as_bytes()))
            }
            _ => false,
        }
    }
}

/// Prefilled values for a new weekly session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub capacity: u32,
    pub title: String,
    pub notes: String,

    /// Day of the week sessions are held on.
    pub weekday: Weekday,

    /// Cutoff time of day, UTC.
    pub cutoff_time: NaiveTime,

    /// How many days before the session the cutoff falls.
    pub cutoff_days_before: u64,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            capacity: 8,
            title: "Weekly Session".into(),
            notes: String::new(),
            weekday: Weekday::Sat,
            cutoff_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            cutoff_days_before: 1,
        }
    }
}

impl SessionDefaults {
    /// Next session date on or after `today`.
    pub fn next_date(&self, today: NaiveDate) -> NaiveDate {
        let ahead = (7 + self.weekday.num_days_from_monday()
            - today.weekday().num_days_from_monday())
            % 7;
        today + Days::new(u64::from(ahead))
    }

    /// Draft for the next session on or after `today`.
    pub fn draft_for(&self, today: NaiveDate) -> SessionInput {
        let date = self.next_date(today);
        let cutoff_day = date - Days::new(self.cutoff_days_before);
        let cutoff = Timestamp::from_datetime(cutoff_day.and_time(self.cutoff_time).and_utc());

        SessionInput::new(date, self.capacity)
            .with_cutoff(cutoff)
            .with_title(self.title.clone())
            .with_notes(self.notes.clone())
    }
}
