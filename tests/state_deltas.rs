use std::fs;
use std::path::PathBuf;

use tennis_edge::access::Entitlements;
use tennis_edge::chart::ChartFrame;
use tennis_edge::error::FetchError;
use tennis_edge::history::HistoryArchive;
use tennis_edge::keys::{Player, RatingMode, Surface, SurfaceScope};
use tennis_edge::record::FlatRecord;
use tennis_edge::state::{
    Delta, DetailsState, FetchFailure, HistoryStatus, LoadStatus, MatchRequest, ProviderCommand,
    apply_delta,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn history(name: &str) -> Option<HistoryArchive> {
    HistoryArchive::from_json(&read_fixture(name)).expect("fixture should parse")
}

fn generation_of(cmd: ProviderCommand) -> u64 {
    match cmd {
        ProviderCommand::FetchDetails { generation, .. } => generation,
        other => panic!("expected details fetch, got {other:?}"),
    }
}

/// Opens the fixture match and delivers its record.
fn ready_session() -> DetailsState {
    let mut state = DetailsState::default();
    let generation = generation_of(state.open_match(MatchRequest::new(987654)));
    let record = FlatRecord::from_json(&read_fixture("match_details.json")).unwrap();
    apply_delta(
        &mut state,
        Delta::DetailsLoaded {
            match_id: 987654,
            generation,
            record,
        },
    );
    state
}

fn deliver_histories(state: &mut DetailsState) {
    apply_delta(
        state,
        Delta::HistoryLoaded {
            player_id: 101,
            archive: history("ts_history_p1.json"),
        },
    );
    apply_delta(
        state,
        Delta::HistoryLoaded {
            player_id: 202,
            archive: history("ts_history_p2.json"),
        },
    );
}

#[test]
fn full_session_builds_series_and_pins_match_day() {
    let mut state = ready_session();
    assert_eq!(state.status, LoadStatus::Ready);

    let cmds = state.history_commands();
    assert_eq!(
        cmds,
        vec![
            ProviderCommand::FetchHistory { player_id: 101 },
            ProviderCommand::FetchHistory { player_id: 202 },
        ]
    );

    deliver_histories(&mut state);
    assert_eq!(state.history_status, HistoryStatus::Ready);
    assert_eq!(state.merged.len(), 6);
    assert_eq!(state.pinned_idx, Some(5));

    let tip = state.tooltip().unwrap();
    assert_eq!(tip.p1_label, "Ana Alpha");
    assert_eq!(tip.date_label, "25.01.2024");

    let model = state.rating_chart(&ChartFrame::default()).unwrap();
    assert!(model.match_x.is_some());
    assert!(state.win_prob_chart(&ChartFrame::default()).is_some());
    assert!(state.logs.iter().any(|l| l.contains("Details loaded")));
}

#[test]
fn selector_changes_never_ask_for_refetch() {
    let mut state = ready_session();
    deliver_histories(&mut state);

    state.set_surface_scope(SurfaceScope::Only(Surface::S3));
    assert!(state.history_commands().is_empty());
    assert_eq!(state.merged[2].p1_mean, 28.0);

    state.set_rating_mode(RatingMode::SM);
    assert!(state.history_commands().is_empty());
    assert_eq!(state.history_status, HistoryStatus::Ready);
    assert_eq!(state.merged.len(), 6);
}

#[test]
fn hover_follows_pointer_and_keyboard() {
    let mut state = ready_session();
    deliver_histories(&mut state);
    let frame = ChartFrame::default();

    state.hover_at(&frame, frame.pad);
    assert_eq!(state.hover_idx, Some(0));
    state.step_hover(2);
    assert_eq!(state.hover_idx, Some(2));
    state.clear_hover();
    assert_eq!(state.tooltip().map(|t| t.date_label), Some("25.01.2024".to_string()));
}

#[test]
fn switching_match_discards_the_old_response() {
    let mut state = DetailsState::default();
    let old = generation_of(state.open_match(MatchRequest::new(1)));
    let new = generation_of(state.open_match(MatchRequest::new(987654)));

    let record = FlatRecord::from_json(&read_fixture("match_details.json")).unwrap();
    apply_delta(
        &mut state,
        Delta::DetailsLoaded {
            match_id: 1,
            generation: old,
            record: record.clone(),
        },
    );
    assert_eq!(state.status, LoadStatus::Loading);
    assert!(state.record.is_none());

    apply_delta(
        &mut state,
        Delta::DetailsLoaded {
            match_id: 987654,
            generation: new,
            record,
        },
    );
    assert_eq!(state.status, LoadStatus::Ready);
}

#[test]
fn closing_clears_cache_and_ignores_late_results() {
    let mut state = ready_session();
    deliver_histories(&mut state);
    assert_eq!(state.histories.len(), 2);

    state.close();
    assert!(state.histories.is_empty());
    assert!(state.merged.is_empty());
    assert!(state.record.is_none());

    apply_delta(
        &mut state,
        Delta::HistoryLoaded {
            player_id: 101,
            archive: history("ts_history_p1.json"),
        },
    );
    assert!(state.histories.is_empty());
}

#[test]
fn missing_history_falls_back_to_defaults() {
    let mut state = ready_session();
    apply_delta(
        &mut state,
        Delta::HistoryLoaded {
            player_id: 101,
            archive: history("ts_history_p1.json"),
        },
    );
    apply_delta(
        &mut state,
        Delta::HistoryLoaded {
            player_id: 202,
            archive: None,
        },
    );
    assert_eq!(state.history_status, HistoryStatus::Ready);
    assert!(state.merged.iter().all(|p| p.p2_mean == 25.0));
}

#[test]
fn history_failure_is_reported_unavailable() {
    let mut state = ready_session();
    apply_delta(
        &mut state,
        Delta::HistoryFailed {
            player_id: 101,
            message: "HTTP 502".to_string(),
        },
    );
    apply_delta(
        &mut state,
        Delta::HistoryFailed {
            player_id: 202,
            message: "HTTP 502".to_string(),
        },
    );
    assert!(matches!(state.history_status, HistoryStatus::Unavailable(_)));
    assert!(state.merged.is_empty());
    assert!(state.rating_chart(&ChartFrame::default()).is_none());
}

#[test]
fn locked_fetch_surfaces_unlock_time() {
    let mut state = DetailsState::default();
    let generation = generation_of(state.open_match(MatchRequest::new(5)));
    let now = chrono::Utc::now();
    let err = tennis_edge::access::check_details_access(
        now,
        Some(now + chrono::Duration::hours(5)),
        false,
        Entitlements::default(),
        2,
    )
    .unwrap_err();
    assert!(matches!(err, FetchError::Locked { .. }));

    apply_delta(
        &mut state,
        Delta::DetailsFailed {
            match_id: 5,
            generation,
            failure: FetchFailure::from(&err),
        },
    );
    match state.status {
        LoadStatus::Locked { lock_hours, .. } => assert_eq!(lock_hours, 2),
        ref other => panic!("expected locked status, got {other:?}"),
    }
}

#[test]
fn overview_uses_session_threshold() {
    let state = ready_session();
    let ov = state
        .overview(chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
        .unwrap();
    assert_eq!(ov.value_side, Some(Player::P1));
}
