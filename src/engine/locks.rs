//! Per-session serialization.

use crate::types::SessionId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// One mutex per session, created on first use. Callers only ask for
/// sessions that exist, so the map is bounded by the session count.
///
/// Engine operations hold their session's mutex across the whole
/// read-modify-write, so two registrations for the same session cannot both
/// recompute from the same stale snapshot. Different sessions never contend.
#[derive(Default)]
pub(crate) struct SessionLocks {
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn for_session(&self, id: SessionId) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.lock().entry(id).or_default())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().len()
    }
}
