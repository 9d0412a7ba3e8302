//! Record stores.
//!
//! The roster engine reads and writes sessions and signups through the
//! [`RecordStore`] trait and holds no state of its own. A store carries no
//! business rules: it assigns ids, keeps records, and filters out removed
//! signups on request.

mod file;
mod journal;
mod memory;
mod tables;

pub use file::{FileStore, StoreConfig};
pub use journal::{Journal, JournalEntry};
pub use memory::MemoryStore;

use crate::error::StoreResult;
use crate::types::{
    Session, SessionId, SessionInput, Signup, SignupId, SignupInput, SignupStatus,
};
use std::sync::Arc;

/// Durable collection of sessions and signups.
pub trait RecordStore: Send + Sync {
    /// All sessions, in no particular order.
    fn list_sessions(&self) -> StoreResult<Vec<Session>>;

    fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>>;

    fn create_session(&self, input: SessionInput) -> StoreResult<SessionId>;

    /// Signups of a session that are not removed, in append order.
    fn list_active_signups(&self, session_id: SessionId) -> StoreResult<Vec<Signup>>;

    /// Any signup by id, removed ones included.
    fn get_signup(&self, id: SignupId) -> StoreResult<Option<Signup>>;

    /// Append a signup on the waitlist.
    ///
    /// Fails with [`StoreError::SessionNotFound`](crate::StoreError::SessionNotFound)
    /// when the session does not exist.
    fn append_signup(&self, input: SignupInput) -> StoreResult<SignupId>;

    /// Overwrite a signup's status. Writing the current value is a no-op.
    fn set_signup_status(&self, id: SignupId, status: SignupStatus) -> StoreResult<()>;
}

impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        (**self).list_sessions()
    }

    fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        (**self).get_session(id)
    }

    fn create_session(&self, input: SessionInput) -> StoreResult<SessionId> {
        (**self).create_session(input)
    }

    fn list_active_signups(&self, session_id: SessionId) -> StoreResult<Vec<Signup>> {
        (**self).list_active_signups(session_id)
    }

    fn get_signup(&self, id: SignupId) -> StoreResult<Option<Signup>> {
        (**self).get_signup(id)
    }

    fn append_signup(&self, input: SignupInput) -> StoreResult<SignupId> {
        (**self).append_signup(input)
    }

    fn set_signup_status(&self, id: SignupId, status: SignupStatus) -> StoreResult<()> {
        (**self).set_signup_status(id, status)
    }
}
