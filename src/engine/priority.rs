//! Confirmation and promotion ordering.
//!
//! Pure functions over a session's signups. Nothing here touches a store; the
//! engine reads the active set, asks for a plan, and writes the result.

use crate::types::{Role, Signup, SignupId, SignupStatus, Timestamp};
use std::cmp::Reverse;

/// A status write needed to bring a signup in line with the partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusChange {
    pub id: SignupId,
    pub from: SignupStatus,
    pub to: SignupStatus,
}

/// Signups to promote, and how many stay waitlisted afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PromotionPlan {
    pub promote: Vec<SignupId>,
    pub still_waiting: usize,
}

/// Confirmation order: cores first, then registration time.
fn confirmation_key(signup: &Signup) -> (u8, Timestamp, SignupId) {
    let tier = match signup.role {
        Role::Core => 0,
        Role::Outsider => 1,
    };
    (tier, signup.created_at, signup.id)
}

/// Promotion order: outsiders first, then any leftover cores, each by
/// registration time.
fn promotion_key(signup: &Signup) -> (Reverse<u8>, Timestamp, SignupId) {
    let (tier, created_at, id) = confirmation_key(signup);
    (Reverse(tier), created_at, id)
}

/// Active signups in confirmation order.
pub fn confirmation_order(signups: &[Signup]) -> Vec<&Signup> {
    let mut ordered: Vec<&Signup> = signups.iter().filter(|s| s.status.is_active()).collect();
    ordered.sort_by_key(|s| confirmation_key(s));
    ordered
}

/// Target status of every active signup: the first `capacity` in
/// confirmation order are confirmed, the rest waitlisted.
///
/// Removed signups are ignored. The result is in confirmation order.
pub fn partition(capacity: u32, signups: &[Signup]) -> Vec<(SignupId, SignupStatus)> {
    confirmation_order(signups)
        .into_iter()
        .enumerate()
        .map(|(rank, signup)| {
            let status = if rank < capacity as usize {
                SignupStatus::Confirmed
            } else {
                SignupStatus::Waitlist
            };
            (signup.id, status)
        })
        .collect()
}

/// Writes needed to reach [`partition`], skipping signups already in place.
///
/// Demotions come before confirmations so that applying the changes in order
/// never puts more than `capacity` signups in `confirmed`.
pub fn status_changes(capacity: u32, signups: &[Signup]) -> Vec<StatusChange> {
    let mut changes: Vec<StatusChange> = partition(capacity, signups)
        .into_iter()
        .filter_map(|(id, to)| {
            let current = signups.iter().find(|s| s.id == id)?;
            (current.status != to).then_some(StatusChange {
                id,
                from: current.status,
                to,
            })
        })
        .collect();

    changes.sort_by_key(|change| change.to == SignupStatus::Confirmed);
    changes
}

/// Which waitlisted signups fill the open slots.
///
/// With no open slot the plan is empty and reports nobody waiting.
pub fn promotion_plan(capacity: u32, signups: &[Signup]) -> PromotionPlan {
    let confirmed = signups
        .iter()
        .filter(|s| s.status == SignupStatus::Confirmed)
        .count();
    let open = (capacity as usize).saturating_sub(confirmed);
    if open == 0 {
        return PromotionPlan::default();
    }

    let mut candidates: Vec<&Signup> = signups
        .iter()
        .filter(|s| s.status == SignupStatus::Waitlist)
        .collect();
    candidates.sort_by_key(|s| promotion_key(s));

    let promote: Vec<SignupId> = candidates.iter().take(open).map(|s| s.id).collect();
    let still_waiting = candidates.len() - promote.len();

    PromotionPlan {
        promote,
        still_waiting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionId;

    fn signup(id: u64, name: &str, role: Role, at: i64, status: SignupStatus) -> Signup {
        Signup {
            id: SignupId(id),
            session_id: SessionId(1),
            name: name.into(),
            role,
            added_by: None,
            created_at: Timestamp::from_secs(at),
            status,
        }
    }

    fn confirmed_names(capacity: u32, signups: &[Signup]) -> Vec<String> {
        partition(capacity, signups)
            .into_iter()
            .filter(|(_, status)| *status == SignupStatus::Confirmed)
            .map(|(id, _)| {
                signups
                    .iter()
                    .find(|s| s.id == id)
                    .unwrap()
                    .name
                    .clone()
            })
            .collect()
    }

    #[test]
    fn test_cores_fill_before_outsiders() {
        let signups = vec![
            signup(1, "Alice", Role::Core, 1, SignupStatus::Waitlist),
            signup(2, "Bob", Role::Core, 2, SignupStatus::Waitlist),
            signup(3, "Cara", Role::Outsider, 3, SignupStatus::Waitlist),
        ];
        assert_eq!(confirmed_names(2, &signups), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_late_core_beats_early_outsider() {
        let signups = vec![
            signup(1, "Dan", Role::Outsider, 1, SignupStatus::Waitlist),
            signup(2, "Eve", Role::Core, 2, SignupStatus::Waitlist),
        ];
        assert_eq!(confirmed_names(1, &signups), vec!["Eve"]);
        assert_eq!(confirmed_names(2, &signups), vec!["Eve", "Dan"]);
    }

    #[test]
    fn test_same_timestamp_falls_back_to_id() {
        let signups = vec![
            signup(2, "Second", Role::Core, 5, SignupStatus::Waitlist),
            signup(1, "First", Role::Core, 5, SignupStatus::Waitlist),
        ];
        assert_eq!(confirmed_names(1, &signups), vec!["First"]);
    }

    #[test]
    fn test_removed_are_ignored() {
        let signups = vec![
            signup(1, "Gone", Role::Core, 1, SignupStatus::Removed),
            signup(2, "Kept", Role::Outsider, 2, SignupStatus::Waitlist),
        ];
        let parts = partition(1, &signups);
        assert_eq!(parts, vec![(SignupId(2), SignupStatus::Confirmed)]);
    }

    #[test]
    fn test_status_changes_skip_unchanged_and_demote_first() {
        let signups = vec![
            signup(1, "Out", Role::Outsider, 1, SignupStatus::Confirmed),
            signup(2, "Core", Role::Core, 2, SignupStatus::Waitlist),
            signup(3, "Other", Role::Outsider, 3, SignupStatus::Waitlist),
        ];

        let changes = status_changes(1, &signups);
        assert_eq!(
            changes,
            vec![
                StatusChange {
                    id: SignupId(1),
                    from: SignupStatus::Confirmed,
                    to: SignupStatus::Waitlist,
                },
                StatusChange {
                    id: SignupId(2),
                    from: SignupStatus::Waitlist,
                    to: SignupStatus::Confirmed,
                },
            ]
        );
    }

    #[test]
    fn test_status_changes_empty_when_consistent() {
        let signups = vec![
            signup(1, "Alice", Role::Core, 1, SignupStatus::Confirmed),
            signup(2, "Cara", Role::Outsider, 2, SignupStatus::Waitlist),
        ];
        assert!(status_changes(1, &signups).is_empty());
    }

    #[test]
    fn test_promotion_prefers_outsiders() {
        let signups = vec![
            signup(1, "Alice", Role::Core, 1, SignupStatus::Confirmed),
            signup(2, "LateCore", Role::Core, 5, SignupStatus::Waitlist),
            signup(3, "Out1", Role::Outsider, 3, SignupStatus::Waitlist),
            signup(4, "Out2", Role::Outsider, 4, SignupStatus::Waitlist),
        ];

        let plan = promotion_plan(3, &signups);
        assert_eq!(plan.promote, vec![SignupId(3), SignupId(4)]);
        assert_eq!(plan.still_waiting, 1);

        let plan = promotion_plan(4, &signups);
        assert_eq!(plan.promote, vec![SignupId(3), SignupId(4), SignupId(2)]);
        assert_eq!(plan.still_waiting, 0);
    }

    #[test]
    fn test_promotion_without_open_slots() {
        let signups = vec![
            signup(1, "Alice", Role::Core, 1, SignupStatus::Confirmed),
            signup(2, "Cara", Role::Outsider, 2, SignupStatus::Waitlist),
        ];
        assert_eq!(promotion_plan(1, &signups), PromotionPlan::default());
    }
}
