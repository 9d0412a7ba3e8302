//! Volatile store.

use super::journal::JournalEntry;
use super::tables::Tables;
use super::RecordStore;
use crate::error::StoreResult;
use crate::types::{
    Session, SessionId, SessionInput, Signup, SignupId, SignupInput, SignupStatus,
};
use parking_lot::RwLock;

/// Record store kept entirely in memory. Contents are lost on drop.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        Ok(self.tables.read().sessions())
    }

    fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        Ok(self.tables.read().session(id))
    }

    fn create_session(&self, input: SessionInput) -> StoreResult<SessionId> {
        let mut tables = self.tables.write();
        let session = tables.prepare_session(input);
        let id = session.id;
        tables.apply(JournalEntry::SessionCreated(session))?;
        Ok(id)
    }

    fn list_active_signups(&self, session_id: SessionId) -> StoreResult<Vec<Signup>> {
        Ok(self.tables.read().active_signups(session_id))
    }

    fn get_signup(&self, id: SignupId) -> StoreResult<Option<Signup>> {
        Ok(self.tables.read().signup(id))
    }

    fn append_signup(&self, input: SignupInput) -> StoreResult<SignupId> {
        let mut tables = self.tables.write();
        let signup = tables.prepare_signup(input)?;
        let id = signup.id;
        tables.apply(JournalEntry::SignupAppended(signup))?;
        Ok(id)
    }

    fn set_signup_status(&self, id: SignupId, status: SignupStatus) -> StoreResult<()> {
        let mut tables = self.tables.write();
        match tables.prepare_status(id, status)? {
            Some(entry) => tables.apply(entry),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::types::{Role, Timestamp};
    use chrono::NaiveDate;

    #[test]
    fn test_create_and_read_back() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        let id = store
            .create_session(SessionInput::new(date, 4).with_title("Weekly"))
            .unwrap();

        let session = store.get_session(id).unwrap().unwrap();
        assert_eq!(session.capacity, 4);
        assert_eq!(session.title, "Weekly");
        assert_eq!(store.list_sessions().unwrap().len(), 1);
    }

    #[test]
    fn test_set_status_unknown_signup() {
        let store = MemoryStore::new();
        let result = store.set_signup_status(SignupId(5), SignupStatus::Confirmed);
        assert!(matches!(result, Err(StoreError::SignupNotFound(SignupId(5)))));
    }

    #[test]
    fn test_redundant_status_write() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        let session_id = store.create_session(SessionInput::new(date, 4)).unwrap();
        let id = store
            .append_signup(SignupInput {
                session_id,
                name: "Alice".into(),
                role: Role::Core,
                added_by: None,
                created_at: Timestamp::from_secs(1),
            })
            .unwrap();

        store.set_signup_status(id, SignupStatus::Confirmed).unwrap();
        store.set_signup_status(id, SignupStatus::Confirmed).unwrap();

        let signup = store.get_signup(id).unwrap().unwrap();
        assert_eq!(signup.status, SignupStatus::Confirmed);
    }
}
