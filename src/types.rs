//! Core types for the roster.

use crate::error::RosterError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a session.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a signup.
///
/// Assigned in append order, so it doubles as the final tie-breaker when two
/// signups share a registration timestamp.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SignupId(pub u64);

impl fmt::Debug for SignupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignupId({})", self.0)
    }
}

impl fmt::Display for SignupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microseconds since Unix epoch, UTC.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp_micros())
    }

    /// Out-of-range values clamp to the epoch.
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(self.0).unwrap_or_default()
    }

    /// Timestamp `secs` seconds after the epoch.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1_000_000))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_datetime().to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl FromStr for Timestamp {
    type Err = RosterError;

    /// Accepts RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` read as UTC.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_datetime(dt.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Self::from_datetime(naive.and_utc()))
            .map_err(|_| RosterError::Validation(format!("Invalid timestamp: {s}")))
    }
}

/// Registration tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Privileged member, confirmed ahead of every outsider.
    Core,
    Outsider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Core => "core",
            Role::Outsider => "outsider",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "core" => Ok(Role::Core),
            "outsider" => Ok(Role::Outsider),
            _ => Err(RosterError::Validation("Invalid role.".into())),
        }
    }
}

/// Signup state.
///
/// `Removed` is terminal: removed signups are invisible to every later
/// computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignupStatus {
    Waitlist,
    Confirmed,
    Removed,
}

impl SignupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignupStatus::Waitlist => "waitlist",
            SignupStatus::Confirmed => "confirmed",
            SignupStatus::Removed => "removed",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, SignupStatus::Removed)
    }
}

impl fmt::Display for SignupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignupStatus {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "waitlist" => Ok(SignupStatus::Waitlist),
            "confirmed" => Ok(SignupStatus::Confirmed),
            "removed" => Ok(SignupStatus::Removed),
            other => Err(RosterError::Validation(format!("Invalid status: {other}"))),
        }
    }
}

/// A scheduled, capacity-limited session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub date: NaiveDate,

    /// Maximum number of confirmed signups.
    pub capacity: u32,

    /// Before this instant, promotion needs an explicit override.
    pub cutoff: Option<Timestamp>,

    pub title: String,
    pub notes: String,
}

impl Session {
    /// Label used when picking a session from a list.
    pub fn label(&self) -> String {
        let title = if self.title.is_empty() {
            "Session"
        } else {
            &self.title
        };
        format!("{} • {} (cap {})", self.date, title, self.capacity)
    }

    /// Whether promotion may run at `now` without being forced.
    pub fn cutoff_passed(&self, now: Timestamp) -> bool {
        self.cutoff.map_or(true, |cutoff| now >= cutoff)
    }
}

/// One person's registration for a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signup {
    pub id: SignupId,
    pub session_id: SessionId,
    pub name: String,
    pub role: Role,

    /// Core member who registered this outsider. Display only.
    pub added_by: Option<String>,

    pub created_at: Timestamp,
    pub status: SignupStatus,
}

impl Signup {
    /// Case-insensitive key for the per-session name uniqueness rule.
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }

    /// Roster line: name and role, plus the sponsor for an outsider.
    pub fn display_line(&self) -> String {
        match (&self.role, &self.added_by) {
            (Role::Outsider, Some(by)) => format!("{} — {} (by {})", self.name, self.role, by),
            _ => format!("{} — {}", self.name, self.role),
        }
    }
}

pub(crate) fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Input for creating a new session (before an id is assigned).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionInput {
    pub date: NaiveDate,
    pub capacity: u32,
    pub cutoff: Option<Timestamp>,
    pub title: String,
    pub notes: String,
}

impl SessionInput {
    /// New input with no cutoff and empty display metadata.
    pub fn new(date: NaiveDate, capacity: u32) -> Self {
        Self {
            date,
            capacity,
            cutoff: None,
            title: String::new(),
            notes: String::new(),
        }
    }

    pub fn with_cutoff(mut self, cutoff: Timestamp) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Input for appending a signup. The store assigns the id and starts it on
/// the waitlist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignupInput {
    pub session_id: SessionId,
    pub name: String,
    pub role: Role,
    pub added_by: Option<String>,
    pub created_at: Timestamp,
}
