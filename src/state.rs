use std::collections::VecDeque;

use chrono::{DateTime, NaiveDate, Utc};

use crate::chart::{
    self, ChartFrame, ChartKind, ChartModel, Tooltip, build_chart, build_win_prob_chart,
};
use crate::details::{Overview, build_overview};
use crate::error::FetchError;
use crate::history::HistoryArchive;
use crate::history_cache::{CachedHistory, HistoryCache};
use crate::keys::{PerfUnit, Player, RatingMode, SurfaceScope, TimeScope};
use crate::record::{FlatRecord, OddsRow};
use crate::timeline::{MergeInputs, MergedPoint, count_mean_changes, day_ms, merge_histories};
use crate::win_prob::DEFAULT_EDGE_THRESHOLD;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsTab {
    Overview,
    Ratings,
    WinProb,
    Performance,
    Form,
    Roles,
    H2h,
    Odds,
}

impl DetailsTab {
    pub const ALL: [DetailsTab; 8] = [
        DetailsTab::Overview,
        DetailsTab::Ratings,
        DetailsTab::WinProb,
        DetailsTab::Performance,
        DetailsTab::Form,
        DetailsTab::Roles,
        DetailsTab::H2h,
        DetailsTab::Odds,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DetailsTab::Overview => "Overview",
            DetailsTab::Ratings => "Ratings",
            DetailsTab::WinProb => "Win %",
            DetailsTab::Performance => "Performance",
            DetailsTab::Form => "Form",
            DetailsTab::Roles => "Fav/Dog",
            DetailsTab::H2h => "H2H",
            DetailsTab::Odds => "Odds",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Locked {
        unlocks_at: DateTime<Utc>,
        lock_hours: u32,
    },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryStatus {
    Idle,
    Loading,
    Ready,
    Unavailable(String),
}

/// What the session needs to know about a failed details fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchFailure {
    Locked {
        unlocks_at: DateTime<Utc>,
        lock_hours: u32,
    },
    Other(String),
}

impl From<&FetchError> for FetchFailure {
    fn from(err: &FetchError) -> Self {
        match err {
            FetchError::Locked {
                unlocks_at,
                lock_hours,
            } => FetchFailure::Locked {
                unlocks_at: *unlocks_at,
                lock_hours: *lock_hours,
            },
            other => FetchFailure::Other(other.user_message()),
        }
    }
}

/// Identity of a match as known from the list view, before its details arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRequest {
    pub match_id: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub finished: bool,
}

impl MatchRequest {
    pub fn new(match_id: i64) -> Self {
        Self {
            match_id,
            start_time: None,
            finished: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    FetchDetails {
        request: MatchRequest,
        generation: u64,
    },
    FetchHistory {
        player_id: i64,
    },
}

#[derive(Debug, Clone)]
pub enum Delta {
    DetailsLoaded {
        match_id: i64,
        generation: u64,
        record: FlatRecord,
    },
    DetailsFailed {
        match_id: i64,
        generation: u64,
        failure: FetchFailure,
    },
    HistoryLoaded {
        player_id: i64,
        archive: Option<HistoryArchive>,
    },
    HistoryFailed {
        player_id: i64,
        message: String,
    },
    Log(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRequest {
    pub match_id: i64,
    pub generation: u64,
}

/// One details-view session: the open match, its cached histories, selectors and the
/// series derived from them.
#[derive(Debug)]
pub struct DetailsState {
    pub active: Option<ActiveRequest>,
    next_generation: u64,
    pub status: LoadStatus,
    pub record: Option<FlatRecord>,
    pub history_status: HistoryStatus,
    pub histories: HistoryCache,
    pub merged: Vec<MergedPoint>,

    pub tab: DetailsTab,
    pub rating_mode: RatingMode,
    pub surface_scope: SurfaceScope,
    pub perf_unit: PerfUnit,
    pub perf_time: TimeScope,
    pub perf_surface: SurfaceScope,
    pub role_time: TimeScope,
    pub h2h_mode: RatingMode,
    pub h2h_surface: SurfaceScope,
    pub show_trend: bool,
    pub edge_threshold: f64,
    pub selected_bookie: Option<i64>,

    pub hover_idx: Option<usize>,
    pub pinned_idx: Option<usize>,

    pub logs: VecDeque<String>,
}

impl Default for DetailsState {
    fn default() -> Self {
        Self::new(true, DEFAULT_EDGE_THRESHOLD)
    }
}

impl DetailsState {
    pub fn new(show_trend: bool, edge_threshold: f64) -> Self {
        Self {
            active: None,
            next_generation: 0,
            status: LoadStatus::Idle,
            record: None,
            history_status: HistoryStatus::Idle,
            histories: HistoryCache::new(),
            merged: Vec::new(),
            tab: DetailsTab::Overview,
            rating_mode: RatingMode::M,
            surface_scope: SurfaceScope::All,
            perf_unit: PerfUnit::Match,
            perf_time: TimeScope::All,
            perf_surface: SurfaceScope::All,
            role_time: TimeScope::All,
            h2h_mode: RatingMode::M,
            h2h_surface: SurfaceScope::All,
            show_trend,
            edge_threshold,
            selected_bookie: None,
            hover_idx: None,
            pinned_idx: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
        }
    }

    /// Starts a details fetch. Any earlier in-flight fetch becomes stale.
    ///
    /// Switching to a different match starts a new session; reopening the active match
    /// keeps the loaded histories and retries failed ones.
    pub fn open_match(&mut self, request: MatchRequest) -> ProviderCommand {
        let same_match = self
            .active
            .is_some_and(|a| a.match_id == request.match_id);
        if same_match {
            self.histories.drop_failed();
        } else {
            self.histories.clear();
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        self.active = Some(ActiveRequest {
            match_id: request.match_id,
            generation,
        });
        self.status = LoadStatus::Loading;
        self.record = None;
        self.history_status = HistoryStatus::Idle;
        self.selected_bookie = None;
        self.clear_derived();
        ProviderCommand::FetchDetails {
            request,
            generation,
        }
    }

    /// Ends the session. Results still in flight are discarded when they arrive.
    pub fn close(&mut self) {
        self.active = None;
        self.status = LoadStatus::Idle;
        self.record = None;
        self.history_status = HistoryStatus::Idle;
        self.histories.clear();
        self.selected_bookie = None;
        self.clear_derived();
    }

    pub fn is_current(&self, match_id: i64, generation: u64) -> bool {
        self.active
            .is_some_and(|a| a.match_id == match_id && a.generation == generation)
    }

    pub fn player_ids(&self) -> Option<(i64, i64)> {
        let record = self.record.as_ref()?;
        Some((record.player_id(Player::P1)?, record.player_id(Player::P2)?))
    }

    /// Players of the loaded match whose history is not cached yet.
    pub fn missing_histories(&self) -> Vec<i64> {
        match self.player_ids() {
            Some((p1, p2)) => self.histories.missing(&[p1, p2]),
            None => Vec::new(),
        }
    }

    /// Commands for the histories still missing; marks history loading when any are due.
    pub fn history_commands(&mut self) -> Vec<ProviderCommand> {
        let missing = self.missing_histories();
        if !missing.is_empty() {
            self.history_status = HistoryStatus::Loading;
        }
        missing
            .into_iter()
            .map(|player_id| ProviderCommand::FetchHistory { player_id })
            .collect()
    }

    pub fn match_time(&self) -> Option<f64> {
        self.record
            .as_ref()
            .and_then(FlatRecord::match_day)
            .map(day_ms)
    }

    pub fn set_rating_mode(&mut self, mode: RatingMode) {
        if self.rating_mode != mode {
            self.rating_mode = mode;
            self.rebuild_series();
        }
    }

    pub fn set_surface_scope(&mut self, scope: SurfaceScope) {
        if self.surface_scope != scope {
            self.surface_scope = scope;
            self.rebuild_series();
        }
    }

    pub fn cycle_rating_mode(&mut self) {
        self.set_rating_mode(self.rating_mode.next());
    }

    pub fn cycle_surface_scope(&mut self) {
        self.set_surface_scope(self.surface_scope.next());
    }

    pub fn toggle_trend(&mut self) {
        self.show_trend = !self.show_trend;
    }

    pub fn cycle_perf_unit(&mut self) {
        self.perf_unit = cycle(&PerfUnit::ALL, self.perf_unit);
    }

    pub fn cycle_perf_time(&mut self) {
        self.perf_time = cycle(&TimeScope::ALL, self.perf_time);
    }

    pub fn cycle_perf_surface(&mut self) {
        self.perf_surface = self.perf_surface.next();
    }

    pub fn cycle_role_time(&mut self) {
        self.role_time = cycle(&TimeScope::ALL, self.role_time);
    }

    pub fn cycle_h2h_mode(&mut self) {
        self.h2h_mode = self.h2h_mode.next();
    }

    pub fn cycle_h2h_surface(&mut self) {
        self.h2h_surface = self.h2h_surface.next();
    }

    /// Moves the odds-history selection through the bookies of the latest-quote table.
    pub fn cycle_bookie(&mut self, bookies: &[&OddsRow]) {
        if bookies.is_empty() {
            self.selected_bookie = None;
            return;
        }
        let next = match self
            .selected_bookie
            .and_then(|id| bookies.iter().position(|r| r.bookie_id == id))
        {
            Some(i) if i + 1 < bookies.len() => Some(bookies[i + 1].bookie_id),
            Some(_) => None,
            None => Some(bookies[0].bookie_id),
        };
        self.selected_bookie = next;
    }

    /// Recomputes the merged series from cached histories; never triggers a fetch.
    pub fn rebuild_series(&mut self) {
        let Some((p1_id, p2_id)) = self.player_ids() else {
            self.clear_derived();
            return;
        };
        let (Some(p1), Some(p2)) = (self.histories.get(p1_id), self.histories.get(p2_id)) else {
            self.clear_derived();
            return;
        };
        if let Some(message) = failure_message(p1, p2) {
            self.clear_derived();
            self.history_status = HistoryStatus::Unavailable(message);
            return;
        }

        let empty = HistoryArchive::default();
        let a1 = p1.archive().unwrap_or(&empty);
        let a2 = p2.archive().unwrap_or(&empty);
        let mode = self.rating_mode;
        let inputs = MergeInputs {
            p1_all: a1.series(mode, SurfaceScope::All),
            p2_all: a2.series(mode, SurfaceScope::All),
            p1_surface: a1.series(mode, self.surface_scope),
            p2_surface: a2.series(mode, self.surface_scope),
            match_day: self.record.as_ref().and_then(FlatRecord::match_day),
        };
        self.merged = merge_histories(inputs, self.surface_scope);
        self.hover_idx = None;

        if self.merged.is_empty() {
            self.pinned_idx = None;
            self.history_status = HistoryStatus::Unavailable("No rating history".to_string());
            return;
        }
        log::debug!(
            "merged {} points for {}_{} ({} mean changes)",
            self.merged.len(),
            mode.code(),
            self.surface_scope.code(),
            count_mean_changes(&self.merged)
        );
        self.pinned_idx = self
            .match_time()
            .and_then(|t| chart::nearest_index(&self.merged, t))
            .or(Some(self.merged.len() - 1));
        self.history_status = HistoryStatus::Ready;
    }

    fn clear_derived(&mut self) {
        self.merged.clear();
        self.hover_idx = None;
        self.pinned_idx = None;
    }

    pub fn rating_chart(&self, frame: &ChartFrame) -> Option<ChartModel> {
        build_chart(
            frame,
            &self.merged,
            ChartKind::RatingMean,
            self.match_time(),
            self.hover_idx,
            self.show_trend,
        )
    }

    pub fn win_prob_chart(&self, frame: &ChartFrame) -> Option<ChartModel> {
        build_win_prob_chart(frame, &self.merged, self.match_time(), self.hover_idx)
    }

    /// Hover from a pointer position on the rating chart.
    pub fn hover_at(&mut self, frame: &ChartFrame, x: f64) {
        self.hover_idx = self
            .rating_chart(frame)
            .and_then(|model| chart::hover_index_at(frame, &model, &self.merged, x));
    }

    /// Keyboard hover: steps from the current hover (or the pinned point).
    pub fn step_hover(&mut self, step: isize) {
        if self.merged.is_empty() {
            self.hover_idx = None;
            return;
        }
        let last = self.merged.len() - 1;
        let from = self.hover_idx.or(self.pinned_idx).unwrap_or(last);
        self.hover_idx = Some(from.saturating_add_signed(step).min(last));
    }

    pub fn clear_hover(&mut self) {
        self.hover_idx = None;
    }

    /// Hover tooltip when hovering, the pinned match-day tooltip otherwise.
    pub fn tooltip(&self) -> Option<Tooltip> {
        let idx = self.hover_idx.or(self.pinned_idx)?;
        let record = self.record.as_ref()?;
        let (n1, n2) = (player_label(record, Player::P1), player_label(record, Player::P2));
        chart::tooltip_at(&self.merged, idx, (&n1, &n2))
    }

    pub fn overview(&self, today: NaiveDate) -> Option<Overview> {
        self.record
            .as_ref()
            .map(|record| build_overview(record, self.edge_threshold, today))
    }

    pub fn push_log(&mut self, line: String) {
        if self.logs.len() >= MAX_LOGS {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T) -> T {
    let i = all.iter().position(|v| *v == current).unwrap_or(0);
    all[(i + 1) % all.len()]
}

fn player_label(record: &FlatRecord, player: Player) -> String {
    record
        .player(player)
        .name
        .unwrap_or_else(|| player.label().to_string())
}

fn failure_message(p1: &CachedHistory, p2: &CachedHistory) -> Option<String> {
    match (p1, p2) {
        (CachedHistory::Failed(a), _) => Some(a.clone()),
        (_, CachedHistory::Failed(b)) => Some(b.clone()),
        _ => None,
    }
}

pub fn apply_delta(state: &mut DetailsState, delta: Delta) {
    match delta {
        Delta::DetailsLoaded {
            match_id,
            generation,
            record,
        } => {
            if !state.is_current(match_id, generation) {
                // Stale response for a match that is no longer open; discard.
                log::debug!("discarding stale details for match {match_id} (gen {generation})");
                return;
            }
            state.record = Some(record);
            state.status = LoadStatus::Ready;
            state.push_log(format!("[INFO] Details loaded for match {match_id}"));
            state.rebuild_series();
        }
        Delta::DetailsFailed {
            match_id,
            generation,
            failure,
        } => {
            if !state.is_current(match_id, generation) {
                // Stale failure; the user has moved on.
                return;
            }
            state.record = None;
            state.status = match failure {
                FetchFailure::Locked {
                    unlocks_at,
                    lock_hours,
                } => {
                    state.push_log(format!("[INFO] Match {match_id} details locked"));
                    LoadStatus::Locked {
                        unlocks_at,
                        lock_hours,
                    }
                }
                FetchFailure::Other(message) => {
                    state.push_log(format!("[WARN] Match {match_id} details failed: {message}"));
                    LoadStatus::Failed(message)
                }
            };
        }
        Delta::HistoryLoaded { player_id, archive } => {
            if state.active.is_none() {
                return;
            }
            let entry = match archive {
                Some(archive) => CachedHistory::Loaded(archive),
                None => CachedHistory::Missing,
            };
            state.histories.insert(player_id, entry);
            state.rebuild_series();
        }
        Delta::HistoryFailed { player_id, message } => {
            if state.active.is_none() {
                return;
            }
            state.push_log(format!("[WARN] History for player {player_id} failed: {message}"));
            state
                .histories
                .insert(player_id, CachedHistory::Failed(message));
            state.rebuild_series();
        }
        Delta::Log(line) => state.push_log(line),
    }
}
