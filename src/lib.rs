//! # Roster
//!
//! Signups for recurring, capacity-limited sessions such as a weekly sports
//! meetup.
//!
//! ## Core Concepts
//!
//! - **Core / outsider**: core members are always confirmed ahead of
//!   outsiders; within a tier, earlier registration wins
//! - **Recompute**: every registration reassigns confirmed and waitlist status
//!   for the whole session from scratch
//! - **Cutoff**: after a session's cutoff, open slots may be filled from the
//!   waitlist; before it, only a forced promotion does so
//! - **Record store**: sessions and signups live behind the [`RecordStore`]
//!   trait, in memory or in a journal on disk
//!
//! ## Example
//!
//! ```ignore
//! use roster::{FileStore, Role, RosterConfig, RosterEngine};
//!
//! let config = RosterConfig::from_json_file("roster.json")?;
//! let engine = RosterEngine::new(FileStore::open_or_create(config.store.clone())?);
//!
//! let session = engine.create_session(config.defaults.draft_for(today))?;
//! engine.register_signup(session, "Alice", Role::Core, None)?;
//! engine.register_signup(session, "Cara", Role::Outsider, Some("Alice"))?;
//!
//! // After the cutoff, fill any open slots.
//! let promotion = engine.promote_from_waitlist(session, false)?;
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod engine;
pub mod store;
pub mod types;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RosterConfig, SessionDefaults};
pub use error::{Result, RosterError, StoreError, StoreResult};
pub use engine::{
    priority, Promotion, PromotionPlan, RecomputeSummary, RosterEngine, SessionView,
    StatusChange,
};
pub use store::{FileStore, Journal, JournalEntry, MemoryStore, RecordStore, StoreConfig};
pub use types::*;
