//! Roster engine: registration, recompute, promotion, removal.

use super::locks::SessionLocks;
use super::priority;
use super::view::SessionView;
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, RosterError};
use crate::store::RecordStore;
use crate::types::{
    name_key, Role, Session, SessionId, SessionInput, Signup, SignupId, SignupInput,
    SignupStatus,
};
use tracing::{debug, info};

/// Outcome of a recompute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecomputeSummary {
    pub confirmed: usize,
    pub waitlisted: usize,

    /// Signups whose stored status was rewritten.
    pub changed: usize,
}

/// Outcome of a promotion pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Promotion {
    pub promoted: usize,

    /// Signups still on the waitlist afterwards.
    pub waitlisted: usize,
}

/// Applies the priority rules to sessions held in a [`RecordStore`].
///
/// A session is consistent only after a recompute has seen every change to
/// its active signups. Registration recomputes before returning; removal does
/// not, and neither backfills the freed slot. Run
/// [`promote_from_waitlist`](Self::promote_from_waitlist) for that.
///
/// Operations on one session are serialized; the store itself gives no
/// isolation.
pub struct RosterEngine<S, C = SystemClock> {
    store: S,
    clock: C,
    locks: SessionLocks,
}

impl<S: RecordStore> RosterEngine<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: RecordStore, C: Clock> RosterEngine<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            locks: SessionLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // --- Sessions ---

    /// Create a session. Capacity must be at least one.
    pub fn create_session(&self, input: SessionInput) -> Result<SessionId> {
        if input.capacity == 0 {
            return Err(RosterError::Validation(
                "Capacity must be at least 1.".into(),
            ));
        }

        let input = SessionInput {
            title: input.title.trim().to_string(),
            notes: input.notes.trim().to_string(),
            ..input
        };
        let date = input.date;
        let capacity = input.capacity;

        let id = self.store.create_session(input)?;
        info!(session = %id, %date, capacity, "session created");
        Ok(id)
    }

    pub fn get_session(&self, id: SessionId) -> Result<Session> {
        self.store
            .get_session(id)?
            .ok_or(RosterError::SessionNotFound(id))
    }

    /// Sessions newest date first, at most `limit` of them.
    pub fn list_sessions(&self, limit: usize) -> Result<Vec<Session>> {
        let mut sessions = self.store.list_sessions()?;
        sessions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        sessions.truncate(limit);
        Ok(sessions)
    }

    /// Confirmed list, waitlist and remaining spots for a session.
    pub fn session_view(&self, id: SessionId) -> Result<SessionView> {
        let session = self.get_session(id)?;
        let signups = self.store.list_active_signups(id)?;
        Ok(SessionView::new(session, signups))
    }

    // --- Signups ---

    /// Register `name` for a session and place them according to priority.
    ///
    /// The returned signup carries its status after the recompute.
    /// `added_by` is kept only for outsiders.
    ///
    /// If the store fails after the signup is appended, the error is returned
    /// but the signup stays recorded on the waitlist. Registering the same
    /// name again then reports [`RosterError::Duplicate`]; a later recompute
    /// places the existing signup.
    pub fn register_signup(
        &self,
        session_id: SessionId,
        name: &str,
        role: Role,
        added_by: Option<&str>,
    ) -> Result<Signup> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::Validation("Name is required.".into()));
        }
        let added_by = match role {
            Role::Outsider => added_by
                .map(str::trim)
                .filter(|by| !by.is_empty())
                .map(str::to_string),
            Role::Core => None,
        };

        // Sessions are never deleted, so checking before locking is safe and
        // keeps unknown ids out of the lock registry.
        let session = self.get_session(session_id)?;
        let lock = self.locks.for_session(session_id);
        let _guard = lock.lock();

        let key = name_key(name);
        let active = self.store.list_active_signups(session_id)?;
        if active.iter().any(|s| s.name_key() == key) {
            return Err(RosterError::Duplicate {
                name: name.to_string(),
            });
        }

        let id = self.store.append_signup(SignupInput {
            session_id,
            name: name.to_string(),
            role,
            added_by,
            created_at: self.clock.now(),
        })?;

        self.recompute_locked(&session)?;

        let signup = self
            .store
            .get_signup(id)?
            .ok_or(RosterError::SignupNotFound(id))?;

        info!(
            session = %session_id,
            signup = %id,
            role = %role,
            status = %signup.status,
            "signup registered"
        );
        Ok(signup)
    }

    /// Reassign confirmed and waitlist status across the session's active
    /// signups from scratch. Idempotent.
    pub fn recompute_priority(&self, session_id: SessionId) -> Result<RecomputeSummary> {
        let session = self.get_session(session_id)?;
        let lock = self.locks.for_session(session_id);
        let _guard = lock.lock();

        self.recompute_locked(&session)
    }

    /// Fill open slots from the waitlist, outsiders first.
    ///
    /// Before the session's cutoff this does nothing unless `force` is set.
    /// An unknown session, or a full one, yields an empty [`Promotion`].
    pub fn promote_from_waitlist(&self, session_id: SessionId, force: bool) -> Result<Promotion> {
        let Some(session) = self.store.get_session(session_id)? else {
            debug!(session = %session_id, "promotion requested for unknown session");
            return Ok(Promotion::default());
        };
        let lock = self.locks.for_session(session_id);
        let _guard = lock.lock();

        if !force && !session.cutoff_passed(self.clock.now()) {
            info!(session = %session_id, "promotion skipped before cutoff");
            return Ok(Promotion::default());
        }

        let active = self.store.list_active_signups(session_id)?;
        let plan = priority::promotion_plan(session.capacity, &active);
        for &id in &plan.promote {
            self.store.set_signup_status(id, SignupStatus::Confirmed)?;
        }

        let promotion = Promotion {
            promoted: plan.promote.len(),
            waitlisted: plan.still_waiting,
        };
        info!(
            session = %session_id,
            force,
            promoted = promotion.promoted,
            waitlisted = promotion.waitlisted,
            "waitlist promotion"
        );
        Ok(promotion)
    }

    /// Mark a signup removed. Terminal, and idempotent.
    ///
    /// The freed slot is not backfilled here.
    pub fn remove_signup(&self, signup_id: SignupId) -> Result<Signup> {
        let session_id = self
            .store
            .get_signup(signup_id)?
            .ok_or(RosterError::SignupNotFound(signup_id))?
            .session_id;

        let lock = self.locks.for_session(session_id);
        let _guard = lock.lock();

        let mut signup = self
            .store
            .get_signup(signup_id)?
            .ok_or(RosterError::SignupNotFound(signup_id))?;
        if !signup.status.is_active() {
            return Ok(signup);
        }

        self.store
            .set_signup_status(signup_id, SignupStatus::Removed)?;
        let previous = signup.status;
        signup.status = SignupStatus::Removed;

        info!(
            session = %session_id,
            signup = %signup_id,
            %previous,
            "signup removed"
        );
        Ok(signup)
    }

    /// Recompute with the session lock already held.
    fn recompute_locked(&self, session: &Session) -> Result<RecomputeSummary> {
        let active = self.store.list_active_signups(session.id)?;
        let changes = priority::status_changes(session.capacity, &active);

        for change in &changes {
            self.store.set_signup_status(change.id, change.to)?;
        }

        let confirmed = active.len().min(session.capacity as usize);
        let summary = RecomputeSummary {
            confirmed,
            waitlisted: active.len() - confirmed,
            changed: changes.len(),
        };
        debug!(
            session = %session.id,
            confirmed = summary.confirmed,
            waitlisted = summary.waitlisted,
            changed = summary.changed,
            "priority recomputed"
        );
        Ok(summary)
    }
}
