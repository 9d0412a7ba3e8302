//! Read-side views of a session.

use crate::types::{Role, Session, Signup, SignupStatus};

/// A session with its active signups split into confirmed and waitlist.
#[derive(Clone, Debug)]
pub struct SessionView {
    pub session: Session,

    /// Confirmed signups by registration time.
    pub confirmed: Vec<Signup>,

    /// Waitlisted signups, cores first, each tier by registration time.
    pub waitlist: Vec<Signup>,
}

impl SessionView {
    /// Build a view from the session's active signups. Removed entries are
    /// dropped.
    pub fn new(session: Session, signups: Vec<Signup>) -> Self {
        let (mut confirmed, mut waitlist): (Vec<Signup>, Vec<Signup>) = signups
            .into_iter()
            .filter(|s| s.status.is_active())
            .partition(|s| s.status == SignupStatus::Confirmed);

        confirmed.sort_by_key(|s| (s.created_at, s.id));
        waitlist.sort_by_key(|s| (s.role != Role::Core, s.created_at, s.id));

        Self {
            session,
            confirmed,
            waitlist,
        }
    }

    /// Open confirmed slots.
    pub fn spots_remaining(&self) -> u32 {
        let confirmed = u32::try_from(self.confirmed.len()).unwrap_or(u32::MAX);
        self.session.capacity.saturating_sub(confirmed)
    }

    /// e.g. `Confirmed: 3 / 8`
    pub fn fill_line(&self) -> String {
        format!(
            "Confirmed: {} / {}",
            self.confirmed.len(),
            self.session.capacity
        )
    }

    pub fn confirmed_lines(&self) -> Vec<String> {
        numbered(&self.confirmed)
    }

    pub fn waitlist_lines(&self) -> Vec<String> {
        numbered(&self.waitlist)
    }

    /// Every active signup in the order an admin picks from when removing
    /// someone: confirmed first, cores first, then registration time.
    pub fn removal_order(&self) -> Vec<&Signup> {
        let mut all: Vec<&Signup> = self.confirmed.iter().chain(&self.waitlist).collect();
        all.sort_by_key(|s| {
            (
                s.status != SignupStatus::Confirmed,
                s.role != Role::Core,
                s.created_at,
                s.id,
            )
        });
        all
    }
}

fn numbered(signups: &[Signup]) -> Vec<String> {
    signups
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s.display_line()))
        .collect()
}
