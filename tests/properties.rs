//! Property tests for the priority rules.

use chrono::NaiveDate;
use proptest::prelude::*;
use roster::{
    ManualClock, MemoryStore, RecordStore, Role, RosterEngine, SessionId, SessionInput, Signup,
    SignupId, SignupStatus, Timestamp,
};

type Engine = RosterEngine<MemoryStore, ManualClock>;

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Core), Just(Role::Outsider)]
}

/// Registrations as (role, registration second). Seconds may repeat or go
/// backwards.
fn registrations() -> impl Strategy<Value = Vec<(Role, i64)>> {
    prop::collection::vec((role_strategy(), 0i64..30), 0..24)
}

fn populate(capacity: u32, people: &[(Role, i64)]) -> (Engine, SessionId) {
    let engine = RosterEngine::with_clock(MemoryStore::new(), ManualClock::new(Timestamp(0)));
    let session = engine
        .create_session(SessionInput::new(
            NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            capacity,
        ))
        .unwrap();

    for (i, (role, at)) in people.iter().enumerate() {
        engine.clock().set(Timestamp::from_secs(*at));
        engine
            .register_signup(session, &format!("player-{i}"), *role, None)
            .unwrap();
    }
    (engine, session)
}

/// Expected confirmed ids: cores by time then outsiders by time, first
/// `capacity` of them.
fn expected_confirmed(capacity: u32, active: &[Signup]) -> Vec<SignupId> {
    let mut cores: Vec<&Signup> = active.iter().filter(|s| s.role == Role::Core).collect();
    let mut outsiders: Vec<&Signup> = active.iter().filter(|s| s.role == Role::Outsider).collect();
    cores.sort_by_key(|s| (s.created_at, s.id));
    outsiders.sort_by_key(|s| (s.created_at, s.id));

    let mut ids: Vec<SignupId> = cores
        .into_iter()
        .chain(outsiders)
        .take(capacity as usize)
        .map(|s| s.id)
        .collect();
    ids.sort();
    ids
}

fn confirmed_ids(active: &[Signup]) -> Vec<SignupId> {
    let mut ids: Vec<SignupId> = active
        .iter()
        .filter(|s| s.status == SignupStatus::Confirmed)
        .map(|s| s.id)
        .collect();
    ids.sort();
    ids
}

proptest! {
    #[test]
    fn prop_capacity_and_priority_hold(capacity in 1u32..8, people in registrations()) {
        let (engine, session) = populate(capacity, &people);
        let active = engine.store().list_active_signups(session).unwrap();

        prop_assert_eq!(active.len(), people.len());
        prop_assert!(confirmed_ids(&active).len() <= capacity as usize);
        prop_assert_eq!(confirmed_ids(&active), expected_confirmed(capacity, &active));
        prop_assert!(active.iter().all(|s| s.status != SignupStatus::Removed));
    }

    #[test]
    fn prop_recompute_is_idempotent(capacity in 1u32..8, people in registrations()) {
        let (engine, session) = populate(capacity, &people);
        let before = engine.store().list_active_signups(session).unwrap();

        let first = engine.recompute_priority(session).unwrap();
        let second = engine.recompute_priority(session).unwrap();

        prop_assert_eq!(first.changed, 0);
        prop_assert_eq!(first, second);
        prop_assert_eq!(before, engine.store().list_active_signups(session).unwrap());
    }

    #[test]
    fn prop_removed_never_come_back(
        capacity in 1u32..6,
        people in registrations(),
        removals in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let (engine, session) = populate(capacity, &people);
        let all = engine.store().list_active_signups(session).unwrap();
        if all.is_empty() {
            return Ok(());
        }

        let removed: Vec<SignupId> = removals.iter().map(|ix| ix.get(&all).id).collect();
        for id in &removed {
            engine.remove_signup(*id).unwrap();
        }

        engine.recompute_priority(session).unwrap();
        engine.promote_from_waitlist(session, true).unwrap();

        let active = engine.store().list_active_signups(session).unwrap();
        for id in &removed {
            prop_assert!(active.iter().all(|s| s.id != *id));
            prop_assert_eq!(
                engine.store().get_signup(*id).unwrap().unwrap().status,
                SignupStatus::Removed
            );
        }
        prop_assert!(confirmed_ids(&active).len() <= capacity as usize);
        prop_assert_eq!(confirmed_ids(&active), expected_confirmed(capacity, &active));
    }

    #[test]
    fn prop_promotion_fills_open_slots(capacity in 1u32..6, people in registrations()) {
        let (engine, session) = populate(capacity, &people);
        let all = engine.store().list_active_signups(session).unwrap();

        // Open every confirmed slot, then backfill.
        for signup in all.iter().filter(|s| s.status == SignupStatus::Confirmed) {
            engine.remove_signup(signup.id).unwrap();
        }
        let waiting = engine.store().list_active_signups(session).unwrap().len();

        let promotion = engine.promote_from_waitlist(session, true).unwrap();
        let expected = waiting.min(capacity as usize);
        prop_assert_eq!(promotion.promoted, expected);
        if expected > 0 {
            prop_assert_eq!(promotion.waitlisted, waiting - expected);
        }

        let active = engine.store().list_active_signups(session).unwrap();
        prop_assert_eq!(confirmed_ids(&active).len(), expected);
    }
}
