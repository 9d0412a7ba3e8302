//! The roster engine.
//!
//! Decides who is confirmed and who waits. Ordering rules live in
//! [`priority`]; [`RosterEngine`] runs them against a store.

mod locks;
pub mod priority;
mod roster;
mod view;

pub use self::roster::{Promotion, RecomputeSummary, RosterEngine};
pub use priority::{PromotionPlan, StatusChange};
pub use view::SessionView;
