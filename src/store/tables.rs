//! In-memory tables shared by the store implementations.

use super::journal::JournalEntry;
use crate::error::{StoreError, StoreResult};
use crate::types::{
    Session, SessionId, SessionInput, Signup, SignupId, SignupInput, SignupStatus,
};
use std::collections::{BTreeMap, HashMap};

/// Sessions and signups, plus id allocation.
///
/// Mutations go through [`Tables::apply`] so a journal replay rebuilds exactly
/// the same state as the original writes.
pub(crate) struct Tables {
    sessions: BTreeMap<SessionId, Session>,
    signups: BTreeMap<SignupId, Signup>,

    /// Session -> its signup ids in append order.
    by_session: HashMap<SessionId, Vec<SignupId>>,

    next_session: u64,
    next_signup: u64,
}

impl Tables {
    pub(crate) fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
            signups: BTreeMap::new(),
            by_session: HashMap::new(),
            next_session: 1,
            next_signup: 1,
        }
    }

    // --- Preparing writes ---

    pub(crate) fn prepare_session(&self, input: SessionInput) -> Session {
        Session {
            id: SessionId(self.next_session),
            date: input.date,
            capacity: input.capacity,
            cutoff: input.cutoff,
            title: input.title,
            notes: input.notes,
        }
    }

    pub(crate) fn prepare_signup(&self, input: SignupInput) -> StoreResult<Signup> {
        if !self.sessions.contains_key(&input.session_id) {
            return Err(StoreError::SessionNotFound(input.session_id));
        }

        Ok(Signup {
            id: SignupId(self.next_signup),
            session_id: input.session_id,
            name: input.name,
            role: input.role,
            added_by: input.added_by,
            created_at: input.created_at,
            status: SignupStatus::Waitlist,
        })
    }

    /// `None` when the signup already has `status`.
    pub(crate) fn prepare_status(
        &self,
        id: SignupId,
        status: SignupStatus,
    ) -> StoreResult<Option<JournalEntry>> {
        let signup = self.signups.get(&id).ok_or(StoreError::SignupNotFound(id))?;
        if signup.status == status {
            return Ok(None);
        }
        Ok(Some(JournalEntry::StatusChanged { id, status }))
    }

    // --- Applying writes ---

    pub(crate) fn apply(&mut self, entry: JournalEntry) -> StoreResult<()> {
        match entry {
            JournalEntry::SessionCreated(session) => {
                if self.sessions.contains_key(&session.id) {
                    return Err(StoreError::Corruption(format!(
                        "session {} created twice",
                        session.id
                    )));
                }
                self.next_session = self.next_session.max(session.id.0 + 1);
                self.sessions.insert(session.id, session);
            }
            JournalEntry::SignupAppended(signup) => {
                if !self.sessions.contains_key(&signup.session_id) {
                    return Err(StoreError::Corruption(format!(
                        "signup {} references unknown session {}",
                        signup.id, signup.session_id
                    )));
                }
                if self.signups.contains_key(&signup.id) {
                    return Err(StoreError::Corruption(format!(
                        "signup {} appended twice",
                        signup.id
                    )));
                }
                self.next_signup = self.next_signup.max(signup.id.0 + 1);
                self.by_session
                    .entry(signup.session_id)
                    .or_default()
                    .push(signup.id);
                self.signups.insert(signup.id, signup);
            }
            JournalEntry::StatusChanged { id, status } => {
                let signup = self.signups.get_mut(&id).ok_or_else(|| {
                    StoreError::Corruption(format!("status change for unknown signup {id}"))
                })?;
                signup.status = status;
            }
        }
        Ok(())
    }

    // --- Reads ---

    pub(crate) fn sessions(&self) -> Vec<Session> {
        self.sessions.values().cloned().collect()
    }

    pub(crate) fn session(&self, id: SessionId) -> Option<Session> {
        self.sessions.get(&id).cloned()
    }

    pub(crate) fn signup(&self, id: SignupId) -> Option<Signup> {
        self.signups.get(&id).cloned()
    }

    pub(crate) fn active_signups(&self, session_id: SessionId) -> Vec<Signup> {
        self.by_session
            .get(&session_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.signups.get(id))
            .filter(|signup| signup.status.is_active())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, Timestamp};
    use chrono::NaiveDate;

    fn with_session() -> (Tables, SessionId) {
        let mut tables = Tables::new();
        let date = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        let session = tables.prepare_session(SessionInput::new(date, 2));
        tables.apply(JournalEntry::SessionCreated(session)).unwrap();
        (tables, SessionId(1))
    }

    fn signup_input(session_id: SessionId, name: &str) -> SignupInput {
        SignupInput {
            session_id,
            name: name.into(),
            role: Role::Core,
            added_by: None,
            created_at: Timestamp::from_secs(1),
        }
    }

    #[test]
    fn test_ids_are_sequential() {
        let (mut tables, session_id) = with_session();
        for name in ["a", "b", "c"] {
            let signup = tables.prepare_signup(signup_input(session_id, name)).unwrap();
            tables.apply(JournalEntry::SignupAppended(signup)).unwrap();
        }

        let ids: Vec<_> = tables
            .active_signups(session_id)
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![SignupId(1), SignupId(2), SignupId(3)]);
    }

    #[test]
    fn test_unknown_session_rejected() {
        let (tables, _) = with_session();
        let result = tables.prepare_signup(signup_input(SessionId(99), "a"));
        assert!(matches!(result, Err(StoreError::SessionNotFound(SessionId(99)))));
    }

    #[test]
    fn test_unchanged_status_prepares_nothing() {
        let (mut tables, session_id) = with_session();
        let signup = tables.prepare_signup(signup_input(session_id, "a")).unwrap();
        tables.apply(JournalEntry::SignupAppended(signup)).unwrap();

        let unchanged = tables
            .prepare_status(SignupId(1), SignupStatus::Waitlist)
            .unwrap();
        assert!(unchanged.is_none());

        let changed = tables
            .prepare_status(SignupId(1), SignupStatus::Removed)
            .unwrap();
        assert!(changed.is_some());
    }

    #[test]
    fn test_removed_hidden_from_active() {
        let (mut tables, session_id) = with_session();
        let signup = tables.prepare_signup(signup_input(session_id, "a")).unwrap();
        tables.apply(JournalEntry::SignupAppended(signup)).unwrap();
        tables
            .apply(JournalEntry::StatusChanged {
                id: SignupId(1),
                status: SignupStatus::Removed,
            })
            .unwrap();

        assert!(tables.active_signups(session_id).is_empty());
        assert!(tables.signup(SignupId(1)).is_some());
    }

    #[test]
    fn test_replay_of_orphan_signup_is_corruption() {
        let mut tables = Tables::new();
        let orphan = JournalEntry::SignupAppended(Signup {
            id: SignupId(1),
            session_id: SessionId(7),
            name: "a".into(),
            role: Role::Core,
            added_by: None,
            created_at: Timestamp::from_secs(1),
            status: SignupStatus::Waitlist,
        });
        assert!(matches!(tables.apply(orphan), Err(StoreError::Corruption(_))));
    }

    #[test]
    fn test_reused_ids_are_corruption() {
        let (mut tables, session_id) = with_session();
        let signup = tables.prepare_signup(signup_input(session_id, "a")).unwrap();
        tables
            .apply(JournalEntry::SignupAppended(signup.clone()))
            .unwrap();

        let again = tables.apply(JournalEntry::SignupAppended(signup));
        assert!(matches!(again, Err(StoreError::Corruption(_))));
        assert_eq!(tables.active_signups(session_id).len(), 1);

        let session = tables.session(session_id).unwrap();
        let twice = tables.apply(JournalEntry::SessionCreated(session));
        assert!(matches!(twice, Err(StoreError::Corruption(_))));
    }
}
