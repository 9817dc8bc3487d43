use std::sync::Once;

use chrono::{TimeZone, Utc};
use tracker_core::{
    update, AppState, Effect, Generation, Msg, Record, RecordId, Reconciler, RefreshOutcome,
    Status, UserId,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn record(id: &str, title: &str, status: Status, minute: u32) -> Record {
    Record {
        id: RecordId::new(id),
        title: title.to_string(),
        company: "Acme".to_string(),
        status,
        url: None,
        notes: None,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, minute, 0).unwrap(),
    }
}

fn fetch_generations(effects: &[Effect]) -> Vec<Generation> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::FetchRecords { generation, .. } => Some(*generation),
            _ => None,
        })
        .collect()
}

fn signed_in() -> (AppState, Generation) {
    let (state, effects) = update(AppState::new(), Msg::SignedIn(UserId::new("user-1")));
    let generation = fetch_generations(&effects)[0];
    (state, generation)
}

fn titles(state: &AppState) -> Vec<String> {
    state
        .records()
        .records()
        .iter()
        .map(|r| r.title.clone())
        .collect()
}

#[test]
fn sign_in_subscribes_then_fetches() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::SignedIn(UserId::new("user-1")));

    assert_eq!(effects.len(), 2);
    assert_eq!(
        effects[0],
        Effect::Subscribe {
            user: UserId::new("user-1")
        }
    );
    assert!(matches!(
        &effects[1],
        Effect::FetchRecords { user, .. } if user == &UserId::new("user-1")
    ));
    assert!(state.is_loading());
    assert!(state.view().loading);
}

#[test]
fn overlapping_refreshes_issue_one_fetch_and_one_follow_up() {
    init_logging();
    let (state, first) = signed_in();

    // Two more requests while the first is in flight: no new fetch.
    let (state, effects) = update(state, Msg::RemoteChanged);
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::RefreshRequested);
    assert!(effects.is_empty());
    assert_eq!(state.records().in_flight(), Some(first));

    // First response is superseded and exactly one follow-up fetch is issued.
    let (state, effects) = update(
        state,
        Msg::RecordsFetched {
            generation: first,
            result: Ok(vec![record("a", "Old", Status::Saved, 1)]),
        },
    );
    let follow_ups = fetch_generations(&effects);
    assert_eq!(follow_ups.len(), 1);
    let second = follow_ups[0];
    assert!(second > first);
    assert!(titles(&state).is_empty());

    let (state, effects) = update(
        state,
        Msg::RecordsFetched {
            generation: second,
            result: Ok(vec![
                record("a", "Old", Status::Saved, 1),
                record("b", "New", Status::Applied, 2),
            ]),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(titles(&state), vec!["New", "Old"]);
    assert!(!state.is_loading());
    assert!(!state.records().is_refreshing());
}

#[test]
fn late_response_for_older_generation_is_ignored() {
    init_logging();
    let mut reconciler = Reconciler::new();
    let first = reconciler.request_refresh().expect("first fetch");
    assert_eq!(reconciler.request_refresh(), None);

    let second = match reconciler.apply_refresh(first, Ok(Vec::new())) {
        RefreshOutcome::Superseded { follow_up } => follow_up,
        other => panic!("expected superseded, got {other:?}"),
    };

    assert_eq!(
        reconciler.apply_refresh(second, Ok(vec![record("n", "Newest", Status::Offer, 5)])),
        RefreshOutcome::Applied { count: 1 }
    );
    // A duplicate delivery of the first response arrives late.
    assert_eq!(
        reconciler.apply_refresh(first, Ok(vec![record("o", "Outdated", Status::Saved, 1)])),
        RefreshOutcome::Stale
    );
    assert_eq!(reconciler.records()[0].title, "Newest");
    assert_eq!(reconciler.records().len(), 1);
}

#[test]
fn response_from_previous_user_is_discarded() {
    init_logging();
    let (state, old_generation) = signed_in();
    let (state, effects) = update(state, Msg::SignedIn(UserId::new("user-2")));
    let new_generation = fetch_generations(&effects)[0];

    let (state, effects) = update(
        state,
        Msg::RecordsFetched {
            generation: old_generation,
            result: Ok(vec![record("x", "Other user's job", Status::Saved, 1)]),
        },
    );
    assert!(effects.is_empty());
    assert!(titles(&state).is_empty());
    assert!(state.is_loading());

    let (state, _) = update(
        state,
        Msg::RecordsFetched {
            generation: new_generation,
            result: Ok(vec![record("y", "Mine", Status::Saved, 2)]),
        },
    );
    assert_eq!(titles(&state), vec!["Mine"]);
}

#[test]
fn mutation_result_from_previous_user_is_discarded() {
    init_logging();
    let (state, generation) = signed_in();
    let (state, _) = update(
        state,
        Msg::RecordsFetched {
            generation,
            result: Ok(vec![record("a", "First user's job", Status::Saved, 1)]),
        },
    );
    let (state, effects) = update(
        state,
        Msg::DeleteRequested {
            id: RecordId::new("a"),
        },
    );
    let origin = match effects.as_slice() {
        [Effect::DeleteRecord { origin, .. }] => *origin,
        other => panic!("expected a delete, got {other:?}"),
    };

    let (state, effects) = update(state, Msg::SignedIn(UserId::new("user-2")));
    let new_generation = fetch_generations(&effects)[0];

    // The first user's delete fails after the switch.
    let (state, effects) = update(
        state,
        Msg::DeleteCompleted {
            id: RecordId::new("a"),
            origin,
            result: Err("permission denied".to_string()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.last_error(), None);

    // The new user's first fetch is still the one in flight.
    assert_eq!(state.records().in_flight(), Some(new_generation));
    let (state, effects) = update(
        state,
        Msg::RecordsFetched {
            generation: new_generation,
            result: Ok(vec![record("y", "Mine", Status::Saved, 2)]),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(titles(&state), vec!["Mine"]);
}

#[test]
fn failed_refresh_keeps_last_good_collection() {
    init_logging();
    let (state, generation) = signed_in();
    let (state, _) = update(
        state,
        Msg::RecordsFetched {
            generation,
            result: Ok(vec![record("a", "Kept", Status::Saved, 1)]),
        },
    );

    let (state, effects) = update(state, Msg::RefreshRequested);
    let generation = fetch_generations(&effects)[0];
    let (mut state, effects) = update(
        state,
        Msg::RecordsFetched {
            generation,
            result: Err("connection reset".to_string()),
        },
    );

    // No automatic retry.
    assert!(effects.is_empty());
    assert_eq!(titles(&state), vec!["Kept"]);
    assert_eq!(
        state.view().last_error.as_deref(),
        Some("failed to fetch job: connection reset")
    );
    assert!(state.consume_dirty());

    // The manual path recovers and clears the fetch error.
    let (state, effects) = update(state, Msg::RefreshRequested);
    let generation = fetch_generations(&effects)[0];
    let (state, _) = update(
        state,
        Msg::RecordsFetched {
            generation,
            result: Ok(vec![record("a", "Kept", Status::Saved, 1)]),
        },
    );
    assert_eq!(state.last_error(), None);
}

#[test]
fn first_failed_refresh_ends_loading() {
    init_logging();
    let (state, generation) = signed_in();
    let (state, _) = update(
        state,
        Msg::RecordsFetched {
            generation,
            result: Err("timeout".to_string()),
        },
    );
    assert!(!state.is_loading());
}

#[test]
fn remote_change_after_sign_out_is_ignored() {
    init_logging();
    let (state, _) = signed_in();
    let (state, effects) = update(state, Msg::SignedOut);
    assert_eq!(effects, vec![Effect::Unsubscribe]);

    let (state, effects) = update(state, Msg::RemoteChanged);
    assert!(effects.is_empty());
    assert!(!state.view().signed_in);
    assert!(!state.is_loading());
}

#[test]
fn signing_in_again_as_same_user_is_noop() {
    init_logging();
    let (state, _) = signed_in();
    let (_state, effects) = update(state, Msg::SignedIn(UserId::new("user-1")));
    assert!(effects.is_empty());
}
