//! Field-name resolution for the minified match-details archive.
//!
//! The archive stores every statistic under a flat `mNNN` key. Each metric family owns a
//! contiguous index range and lays its dimensions out with fixed strides, so a key is
//! computed from typed selectors instead of being looked up in a string table.

use std::fmt;

use serde::Serialize;

/// Index of an `mNNN` field in a details record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey(u16);

impl FieldKey {
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{:03}", self.0)
    }
}

pub const MATCH_ID: FieldKey = FieldKey(1);
pub const TOURNAMENT_EVENT_ID: FieldKey = FieldKey(2);
pub const START_TIME: FieldKey = FieldKey(3);
pub const P1_ID: FieldKey = FieldKey(4);
pub const P2_ID: FieldKey = FieldKey(5);
pub const P1_RANK: FieldKey = FieldKey(6);
pub const P2_RANK: FieldKey = FieldKey(7);
pub const P1_SEED: FieldKey = FieldKey(8);
pub const P2_SEED: FieldKey = FieldKey(9);
pub const RESULT: FieldKey = FieldKey(10);
pub const RESULT_DETAILS: FieldKey = FieldKey(11);
pub const P1_ODDS: FieldKey = FieldKey(12);
pub const P2_ODDS: FieldKey = FieldKey(13);
pub const OFFERED_BOOKIES: FieldKey = FieldKey(14);
pub const ODDS_UPDATED: FieldKey = FieldKey(15);
pub const SURFACE_ID: FieldKey = FieldKey(19);
pub const SURFACE_NAME: FieldKey = FieldKey(20);
pub const ROUND_ID: FieldKey = FieldKey(21);
pub const ROUND_NAME: FieldKey = FieldKey(22);
/// Model win probability for player 1, stored in percent.
pub const MODEL_WIN_PCT: FieldKey = FieldKey(655);
pub const IS_FINISHED: FieldKey = FieldKey(656);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Player {
    P1,
    P2,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::P1, Player::P2];

    pub const fn index(self) -> u16 {
        match self {
            Player::P1 => 0,
            Player::P2 => 1,
        }
    }

    pub const fn other(self) -> Player {
        match self {
            Player::P1 => Player::P2,
            Player::P2 => Player::P1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Player::P1 => "P1",
            Player::P2 => "P2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PerfUnit {
    Match,
    Set,
    Game,
}

impl PerfUnit {
    pub const ALL: [PerfUnit; 3] = [PerfUnit::Match, PerfUnit::Set, PerfUnit::Game];

    const fn base(self) -> u16 {
        match self {
            PerfUnit::Match => 158,
            PerfUnit::Set => 238,
            PerfUnit::Game => 318,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PerfUnit::Match => "Match",
            PerfUnit::Set => "Set",
            PerfUnit::Game => "Game",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TimeScope {
    All,
    Year,
    Month,
    Week,
}

impl TimeScope {
    pub const ALL: [TimeScope; 4] = [
        TimeScope::All,
        TimeScope::Year,
        TimeScope::Month,
        TimeScope::Week,
    ];

    pub const fn index(self) -> u16 {
        match self {
            TimeScope::All => 0,
            TimeScope::Year => 1,
            TimeScope::Month => 2,
            TimeScope::Week => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            TimeScope::All => "All",
            TimeScope::Year => "Year",
            TimeScope::Month => "Month",
            TimeScope::Week => "Week",
        }
    }
}

/// A specific court surface category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Surface {
    S1,
    S2,
    S3,
    S4,
}

impl Surface {
    pub const ALL: [Surface; 4] = [Surface::S1, Surface::S2, Surface::S3, Surface::S4];

    /// 1-based ordinal used by the archive (`S1` = 1).
    pub const fn ordinal(self) -> u16 {
        match self {
            Surface::S1 => 1,
            Surface::S2 => 2,
            Surface::S3 => 3,
            Surface::S4 => 4,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Surface::S1 => "S1",
            Surface::S2 => "S2",
            Surface::S3 => "S3",
            Surface::S4 => "S4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SurfaceScope {
    All,
    Only(Surface),
}

impl SurfaceScope {
    pub const ALL: [SurfaceScope; 5] = [
        SurfaceScope::All,
        SurfaceScope::Only(Surface::S1),
        SurfaceScope::Only(Surface::S2),
        SurfaceScope::Only(Surface::S3),
        SurfaceScope::Only(Surface::S4),
    ];

    pub const fn index(self) -> u16 {
        match self {
            SurfaceScope::All => 0,
            SurfaceScope::Only(s) => s.ordinal(),
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            SurfaceScope::All => "ALL",
            SurfaceScope::Only(s) => s.code(),
        }
    }

    pub const fn surface(self) -> Option<Surface> {
        match self {
            SurfaceScope::All => None,
            SurfaceScope::Only(s) => Some(s),
        }
    }

    pub fn next(self) -> SurfaceScope {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WinLoss {
    Win,
    Loss,
}

impl WinLoss {
    pub const ALL: [WinLoss; 2] = [WinLoss::Win, WinLoss::Loss];

    const fn index(self) -> u16 {
        match self {
            WinLoss::Win => 0,
            WinLoss::Loss => 1,
        }
    }
}

/// Rating scope maintained by the upstream rating system: per match, per set, per game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RatingMode {
    M,
    SM,
    GSM,
}

impl RatingMode {
    pub const ALL: [RatingMode; 3] = [RatingMode::M, RatingMode::SM, RatingMode::GSM];

    pub const fn index(self) -> u16 {
        match self {
            RatingMode::M => 0,
            RatingMode::SM => 1,
            RatingMode::GSM => 2,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            RatingMode::M => "M",
            RatingMode::SM => "SM",
            RatingMode::GSM => "GSM",
        }
    }

    pub fn next(self) -> RatingMode {
        Self::ALL[(self.index() as usize + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RatingMetric {
    Mean,
    Deviation,
}

impl RatingMetric {
    pub const ALL: [RatingMetric; 2] = [RatingMetric::Mean, RatingMetric::Deviation];

    const fn index(self) -> u16 {
        match self {
            RatingMetric::Mean => 0,
            RatingMetric::Deviation => 1,
        }
    }
}

/// Pre-match (`Old`) or post-match (`New`) rating snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RatingPhase {
    New,
    Old,
}

impl RatingPhase {
    pub const ALL: [RatingPhase; 2] = [RatingPhase::New, RatingPhase::Old];

    const fn index(self) -> u16 {
        match self {
            RatingPhase::New => 0,
            RatingPhase::Old => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RoleMetric {
    Wins,
    Losses,
    AvgWinProbWon,
    AvgWinProbLost,
}

impl RoleMetric {
    pub const ALL: [RoleMetric; 4] = [
        RoleMetric::Wins,
        RoleMetric::Losses,
        RoleMetric::AvgWinProbWon,
        RoleMetric::AvgWinProbLost,
    ];

    const fn is_average(self) -> bool {
        matches!(self, RoleMetric::AvgWinProbWon | RoleMetric::AvgWinProbLost)
    }

    const fn outcome_index(self) -> u16 {
        match self {
            RoleMetric::Wins | RoleMetric::AvgWinProbWon => 0,
            RoleMetric::Losses | RoleMetric::AvgWinProbLost => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RoleSide {
    Favourite,
    Underdog,
}

impl RoleSide {
    pub const ALL: [RoleSide; 2] = [RoleSide::Favourite, RoleSide::Underdog];

    const fn index(self) -> u16 {
        match self {
            RoleSide::Favourite => 0,
            RoleSide::Underdog => 1,
        }
    }
}

// Performance W/L counts: unit block, then surface, player, time scope, W/L.
const PERF_PER_TIME: u16 = 2;
const PERF_PER_PLAYER: u16 = 8;
const PERF_PER_SURFACE: u16 = 16;

pub const fn perf_key(
    unit: PerfUnit,
    player: Player,
    time: TimeScope,
    surface: SurfaceScope,
    wl: WinLoss,
) -> FieldKey {
    FieldKey(
        unit.base()
            + surface.index() * PERF_PER_SURFACE
            + player.index() * PERF_PER_PLAYER
            + time.index() * PERF_PER_TIME
            + wl.index(),
    )
}

pub const fn days_since_key(player: Player, last: WinLoss, surface: SurfaceScope) -> FieldKey {
    let base = match last {
        WinLoss::Win => 398,
        WinLoss::Loss => 408,
    };
    FieldKey(base + surface.index() * 2 + player.index())
}

// Rating summary blocks hold nine fields each: new p1 mean/sd, new p2 mean/sd,
// old p1 mean/sd, old p2 mean/sd, p1 win probability.
const RATING_BLOCK: u16 = 9;
const RATING_ALL_BASE: u16 = 23;
const RATING_SURFACE_BASE: u16 = 50;
const RATING_WIN_PROB_OFFSET: u16 = 8;

const fn rating_block_start(mode: RatingMode, surface: SurfaceScope) -> u16 {
    match surface {
        SurfaceScope::All => RATING_ALL_BASE + mode.index() * RATING_BLOCK,
        SurfaceScope::Only(s) => {
            RATING_SURFACE_BASE
                + (s.ordinal() - 1) * 3 * RATING_BLOCK
                + mode.index() * RATING_BLOCK
        }
    }
}

pub const fn rating_key(
    player: Player,
    metric: RatingMetric,
    phase: RatingPhase,
    mode: RatingMode,
    surface: SurfaceScope,
) -> FieldKey {
    FieldKey(
        rating_block_start(mode, surface)
            + phase.index() * 4
            + player.index() * 2
            + metric.index(),
    )
}

/// Player 1 win probability stored alongside a rating block (0..1, sometimes percent).
pub const fn rating_win_prob_key(mode: RatingMode, surface: SurfaceScope) -> FieldKey {
    FieldKey(rating_block_start(mode, surface) + RATING_WIN_PROB_OFFSET)
}

pub const fn role_key(
    metric: RoleMetric,
    player: Player,
    side: RoleSide,
    time: TimeScope,
) -> FieldKey {
    let base = 418 + time.index() * 16;
    let avg = if metric.is_average() { 8 } else { 0 };
    FieldKey(base + avg + metric.outcome_index() * 4 + side.index() * 2 + player.index())
}

pub const fn h2h_record_key(player: Player, surface: SurfaceScope, old: bool) -> FieldKey {
    let base = if old { 492 } else { 482 };
    FieldKey(base + surface.index() * 2 + player.index())
}

const H2H_ALL_BASE: u16 = 502;
const H2H_SURFACE_BASE: u16 = 529;

pub const fn h2h_rating_key(
    mode: RatingMode,
    player: Player,
    metric: RatingMetric,
    old: bool,
) -> FieldKey {
    let old_offset = if old { 4 } else { 0 };
    FieldKey(
        H2H_ALL_BASE
            + mode.index() * RATING_BLOCK
            + old_offset
            + player.index() * 2
            + metric.index(),
    )
}

const fn h2h_surface_block(mode: RatingMode, surface: Surface) -> u16 {
    H2H_SURFACE_BASE + (surface.ordinal() - 1) * 3 * RATING_BLOCK + mode.index() * RATING_BLOCK
}

pub const fn h2h_win_prob_key(mode: RatingMode, surface: SurfaceScope) -> FieldKey {
    match surface {
        SurfaceScope::All => {
            FieldKey(H2H_ALL_BASE + mode.index() * RATING_BLOCK + RATING_WIN_PROB_OFFSET)
        }
        SurfaceScope::Only(s) => FieldKey(h2h_surface_block(mode, s) + RATING_WIN_PROB_OFFSET),
    }
}

pub const fn h2h_surface_rating_key(
    mode: RatingMode,
    surface: Surface,
    player: Player,
    metric: RatingMetric,
    old: bool,
) -> FieldKey {
    let old_offset = if old { 4 } else { 0 };
    FieldKey(h2h_surface_block(mode, surface) + old_offset + player.index() * 2 + metric.index())
}

pub fn all_perf_keys() -> Vec<FieldKey> {
    let mut out = Vec::new();
    for unit in PerfUnit::ALL {
        for surface in SurfaceScope::ALL {
            for player in Player::ALL {
                for time in TimeScope::ALL {
                    for wl in WinLoss::ALL {
                        out.push(perf_key(unit, player, time, surface, wl));
                    }
                }
            }
        }
    }
    out
}

pub fn all_days_since_keys() -> Vec<FieldKey> {
    let mut out = Vec::new();
    for last in WinLoss::ALL {
        for surface in SurfaceScope::ALL {
            for player in Player::ALL {
                out.push(days_since_key(player, last, surface));
            }
        }
    }
    out
}

/// Every rating-summary field, win-probability slots included.
pub fn all_rating_keys() -> Vec<FieldKey> {
    let mut out = Vec::new();
    for surface in SurfaceScope::ALL {
        for mode in RatingMode::ALL {
            for phase in RatingPhase::ALL {
                for player in Player::ALL {
                    for metric in RatingMetric::ALL {
                        out.push(rating_key(player, metric, phase, mode, surface));
                    }
                }
            }
            out.push(rating_win_prob_key(mode, surface));
        }
    }
    out
}

pub fn all_role_keys() -> Vec<FieldKey> {
    let mut out = Vec::new();
    for time in TimeScope::ALL {
        for metric in RoleMetric::ALL {
            for side in RoleSide::ALL {
                for player in Player::ALL {
                    out.push(role_key(metric, player, side, time));
                }
            }
        }
    }
    out
}

pub fn all_h2h_record_keys() -> Vec<FieldKey> {
    let mut out = Vec::new();
    for old in [false, true] {
        for surface in SurfaceScope::ALL {
            for player in Player::ALL {
                out.push(h2h_record_key(player, surface, old));
            }
        }
    }
    out
}

/// Every head-to-head rating field (ALL and per surface), win-probability slots included.
pub fn all_h2h_rating_keys() -> Vec<FieldKey> {
    let mut out = Vec::new();
    for mode in RatingMode::ALL {
        for old in [false, true] {
            for player in Player::ALL {
                for metric in RatingMetric::ALL {
                    out.push(h2h_rating_key(mode, player, metric, old));
                    for surface in Surface::ALL {
                        out.push(h2h_surface_rating_key(mode, surface, player, metric, old));
                    }
                }
            }
        }
        for surface in SurfaceScope::ALL {
            out.push(h2h_win_prob_key(mode, surface));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_family(keys: Vec<FieldKey>, lo: u16, hi: u16) {
        let unique: HashSet<FieldKey> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keys.len(), "collision in family {lo}..={hi}");
        assert_eq!(keys.len(), (hi - lo + 1) as usize, "family {lo}..={hi} not dense");
        assert!(keys.iter().all(|k| (lo..=hi).contains(&k.index())));
    }

    #[test]
    fn key_display_is_zero_padded() {
        assert_eq!(FieldKey::new(23).to_string(), "m023");
        assert_eq!(MODEL_WIN_PCT.to_string(), "m655");
        assert_eq!(MATCH_ID.to_string(), "m001");
    }

    #[test]
    fn perf_keys_follow_documented_strides() {
        let k = perf_key(
            PerfUnit::Match,
            Player::P1,
            TimeScope::All,
            SurfaceScope::All,
            WinLoss::Win,
        );
        assert_eq!(k.to_string(), "m158");
        let k = perf_key(
            PerfUnit::Set,
            Player::P2,
            TimeScope::Month,
            SurfaceScope::Only(Surface::S3),
            WinLoss::Loss,
        );
        assert_eq!(k.index(), 238 + 3 * 16 + 8 + 2 * 2 + 1);
    }

    #[test]
    fn rating_keys_match_archive_table() {
        let k = rating_key(
            Player::P1,
            RatingMetric::Mean,
            RatingPhase::New,
            RatingMode::M,
            SurfaceScope::All,
        );
        assert_eq!(k.to_string(), "m023");
        let k = rating_key(
            Player::P2,
            RatingMetric::Deviation,
            RatingPhase::Old,
            RatingMode::GSM,
            SurfaceScope::All,
        );
        assert_eq!(k.to_string(), "m048");
        let k = rating_key(
            Player::P1,
            RatingMetric::Mean,
            RatingPhase::New,
            RatingMode::SM,
            SurfaceScope::Only(Surface::S2),
        );
        assert_eq!(k.to_string(), "m086");
        assert_eq!(
            rating_win_prob_key(RatingMode::GSM, SurfaceScope::Only(Surface::S4)).to_string(),
            "m157"
        );
    }

    #[test]
    fn role_keys_interleave_players() {
        let fav_p1 = role_key(RoleMetric::Wins, Player::P1, RoleSide::Favourite, TimeScope::All);
        let fav_p2 = role_key(RoleMetric::Wins, Player::P2, RoleSide::Favourite, TimeScope::All);
        assert_eq!(fav_p1.index(), 418);
        assert_eq!(fav_p2.index(), 419);
        let lost_dog = role_key(
            RoleMetric::AvgWinProbLost,
            Player::P2,
            RoleSide::Underdog,
            TimeScope::Week,
        );
        assert_eq!(lost_dog.index(), 466 + 8 + 4 + 2 + 1);
    }

    #[test]
    fn h2h_keys_match_archive_table() {
        assert_eq!(h2h_record_key(Player::P2, SurfaceScope::Only(Surface::S4), true).index(), 501);
        assert_eq!(
            h2h_rating_key(RatingMode::SM, Player::P2, RatingMetric::Deviation, true).index(),
            518
        );
        assert_eq!(h2h_win_prob_key(RatingMode::GSM, SurfaceScope::All).index(), 528);
        assert_eq!(
            h2h_win_prob_key(RatingMode::M, SurfaceScope::Only(Surface::S3)).index(),
            591
        );
        assert_eq!(
            h2h_surface_rating_key(
                RatingMode::GSM,
                Surface::S4,
                Player::P1,
                RatingMetric::Mean,
                false
            )
            .index(),
            628
        );
    }

    #[test]
    fn families_are_collision_free_and_dense() {
        assert_family(all_perf_keys(), 158, 397);
        assert_family(all_days_since_keys(), 398, 417);
        assert_family(all_rating_keys(), 23, 157);
        assert_family(all_role_keys(), 418, 481);
        assert_family(all_h2h_record_keys(), 482, 501);
        assert_family(all_h2h_rating_keys(), 502, 636);
    }
}
