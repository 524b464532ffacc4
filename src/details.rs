//! Derived statistics shown on the match-details tabs.
//!
//! Everything here reads the flat record through the key resolver; nothing is cached.

use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;

use crate::keys::{
    self, PerfUnit, Player, RatingMetric, RatingMode, RatingPhase, RoleMetric, RoleSide, Surface,
    SurfaceScope, TimeScope, WinLoss,
};
use crate::record::{FlatRecord, parse_timestamp};
use crate::win_prob::{self, prob_from_pct};

const STARS_MIN_RATING: f64 = 18.0;
const STARS_MAX_RATING: f64 = 32.0;
const MAX_STARS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerfLine {
    pub wins: f64,
    pub losses: f64,
    pub win_pct: f64,
}

pub fn perf(
    record: &FlatRecord,
    unit: PerfUnit,
    player: Player,
    time: TimeScope,
    surface: SurfaceScope,
) -> PerfLine {
    let wins = record.read_number(keys::perf_key(unit, player, time, surface, WinLoss::Win));
    let losses = record.read_number(keys::perf_key(unit, player, time, surface, WinLoss::Loss));
    PerfLine {
        wins,
        losses,
        win_pct: pct(wins, wins + losses),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LastResult {
    Win,
    Loss,
    Unknown,
}

impl LastResult {
    pub fn label(self) -> &'static str {
        match self {
            LastResult::Win => "WIN",
            LastResult::Loss => "LOSS",
            LastResult::Unknown => "N/A",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FormLine {
    pub days_since_win: f64,
    pub days_since_loss: f64,
    pub days_since_match: f64,
    pub last_result: LastResult,
}

/// Recency for one player; a zero counter means "no such result on record".
pub fn form(record: &FlatRecord, player: Player, surface: SurfaceScope) -> FormLine {
    let w = record.read_number(keys::days_since_key(player, WinLoss::Win, surface));
    let l = record.read_number(keys::days_since_key(player, WinLoss::Loss, surface));

    let (days_since_match, last_result) = match (w != 0.0, l != 0.0) {
        (false, false) => (0.0, LastResult::Unknown),
        (false, true) => (l, LastResult::Loss),
        (true, false) => (w, LastResult::Win),
        (true, true) if w <= l => (w, LastResult::Win),
        (true, true) => (l, LastResult::Loss),
    };

    FormLine {
        days_since_win: w,
        days_since_loss: l,
        days_since_match,
        last_result,
    }
}

pub fn fmt_days(v: f64) -> String {
    if v > 0.0 { format!("{v}") } else { "—".to_string() }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoleLine {
    pub wins: f64,
    pub losses: f64,
    pub avg_win_prob_won: f64,
    pub avg_win_prob_lost: f64,
    pub matches: f64,
    pub win_pct: f64,
    pub share_pct: f64,
}

/// Record as favourite or underdog within one time window.
pub fn role_line(record: &FlatRecord, player: Player, side: RoleSide, time: TimeScope) -> RoleLine {
    let count = |metric, side| record.read_number(keys::role_key(metric, player, side, time));
    let avg = |metric| {
        record
            .read_nullable_number(keys::role_key(metric, player, side, time))
            .unwrap_or(0.0)
    };

    let wins = count(RoleMetric::Wins, side);
    let losses = count(RoleMetric::Losses, side);
    let matches_as = |s| count(RoleMetric::Wins, s) + count(RoleMetric::Losses, s);
    let all_roles = matches_as(RoleSide::Favourite) + matches_as(RoleSide::Underdog);

    RoleLine {
        wins,
        losses,
        avg_win_prob_won: avg(RoleMetric::AvgWinProbWon),
        avg_win_prob_lost: avg(RoleMetric::AvgWinProbLost),
        matches: wins + losses,
        win_pct: pct(wins, wins + losses),
        share_pct: pct(wins + losses, all_roles),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingPair {
    pub mean: f64,
    pub deviation: f64,
}

/// Head-to-head wins of each player on one surface scope.
pub fn h2h_record(record: &FlatRecord, surface: SurfaceScope, old: bool) -> (f64, f64) {
    (
        record.read_number(keys::h2h_record_key(Player::P1, surface, old)),
        record.read_number(keys::h2h_record_key(Player::P2, surface, old)),
    )
}

pub fn h2h_rating(record: &FlatRecord, mode: RatingMode, player: Player, old: bool) -> RatingPair {
    let read = |metric| {
        record
            .read_nullable_number(keys::h2h_rating_key(mode, player, metric, old))
            .unwrap_or(0.0)
    };
    RatingPair {
        mean: read(RatingMetric::Mean),
        deviation: read(RatingMetric::Deviation),
    }
}

pub fn h2h_surface_rating(
    record: &FlatRecord,
    mode: RatingMode,
    surface: Surface,
    player: Player,
    old: bool,
) -> RatingPair {
    let read = |metric| {
        record
            .read_nullable_number(keys::h2h_surface_rating_key(mode, surface, player, metric, old))
            .unwrap_or(0.0)
    };
    RatingPair {
        mean: read(RatingMetric::Mean),
        deviation: read(RatingMetric::Deviation),
    }
}

/// Player 1 head-to-head win probability, `0` when absent.
pub fn h2h_win_prob(record: &FlatRecord, mode: RatingMode, surface: SurfaceScope) -> f64 {
    record
        .read_nullable_number(keys::h2h_win_prob_key(mode, surface))
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub phase: RatingPhase,
    pub p1_mean: Option<f64>,
    pub p1_deviation: Option<f64>,
    pub p2_mean: Option<f64>,
    pub p2_deviation: Option<f64>,
    pub p1_win_prob: Option<f64>,
}

impl RatingSummary {
    pub fn p2_win_prob(&self) -> Option<f64> {
        self.p1_win_prob.map(|p| 1.0 - p)
    }
}

/// Stored rating snapshot for the selected mode and surface: post-match ratings once the
/// match is finished, pre-match ratings otherwise.
pub fn rating_summary(record: &FlatRecord, mode: RatingMode, surface: SurfaceScope) -> RatingSummary {
    let phase = if record.is_finished() {
        RatingPhase::New
    } else {
        RatingPhase::Old
    };
    let read = |player, metric| {
        record.read_nullable_number(keys::rating_key(player, metric, phase, mode, surface))
    };
    RatingSummary {
        phase,
        p1_mean: read(Player::P1, RatingMetric::Mean),
        p1_deviation: read(Player::P1, RatingMetric::Deviation),
        p2_mean: read(Player::P2, RatingMetric::Mean),
        p2_deviation: read(Player::P2, RatingMetric::Deviation),
        p1_win_prob: record
            .read_nullable_number(keys::rating_win_prob_key(mode, surface))
            .and_then(win_prob::normalize_prob),
    }
}

/// Average of the pre-match ALL-surface means over the three rating modes.
pub fn combined_strength(record: &FlatRecord, player: Player) -> Option<f64> {
    let mut sum = 0.0;
    for mode in RatingMode::ALL {
        let key = keys::rating_key(
            player,
            RatingMetric::Mean,
            RatingPhase::Old,
            mode,
            SurfaceScope::All,
        );
        sum += record.read_nullable_number(key)?;
    }
    Some(sum / RatingMode::ALL.len() as f64)
}

/// Rating on a 0..5 star scale in half-star steps.
pub fn rating_to_stars(rating: Option<f64>) -> f64 {
    let Some(r) = rating.filter(|r| r.is_finite()) else {
        return 0.0;
    };
    let t = (r - STARS_MIN_RATING) / (STARS_MAX_RATING - STARS_MIN_RATING);
    let stars = t.clamp(0.0, 1.0) * MAX_STARS;
    (stars * 2.0).round() / 2.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TournamentHeader {
    pub name: String,
    pub iso2: String,
    pub iso3: String,
    pub country: String,
    pub round: String,
    pub surface: String,
    pub date_text: String,
    pub prize_text: String,
    pub strength: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerCard {
    pub id: Option<i64>,
    pub name: String,
    pub iso2: String,
    pub iso3: String,
    pub country: String,
    pub rank: Option<f64>,
    pub seed: Option<String>,
    pub born: String,
    pub plays: String,
    pub height: String,
    pub weight: String,
    pub rating_mean: Option<f64>,
    pub model_prob: Option<f64>,
    pub odds: Option<f64>,
}

impl PlayerCard {
    /// `"Name (ISO)"`, or just the name when the country code is missing.
    pub fn label(&self) -> String {
        if self.iso3.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.iso3)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub header: TournamentHeader,
    pub p1: PlayerCard,
    pub p2: PlayerCard,
    pub finished: bool,
    pub score_main: String,
    pub score_sets: String,
    pub edge_p1: Option<f64>,
    pub edge_p2: Option<f64>,
    pub value_side: Option<Player>,
    pub profit: Option<f64>,
}

impl Overview {
    pub fn card(&self, player: Player) -> &PlayerCard {
        match player {
            Player::P1 => &self.p1,
            Player::P2 => &self.p2,
        }
    }
}

pub fn build_overview(record: &FlatRecord, edge_threshold: f64, today: NaiveDate) -> Overview {
    let t = record.tournament();
    let header = TournamentHeader {
        name: text_or_dash(t.name),
        iso2: t.iso2.unwrap_or_default(),
        iso3: t.iso3.unwrap_or_default(),
        country: t.country.unwrap_or_default(),
        round: text_or_dash(record.read_text(keys::ROUND_NAME)),
        surface: text_or_dash(record.read_text(keys::SURFACE_NAME)),
        date_text: format_match_date(record.read_text(keys::START_TIME).as_deref()),
        prize_text: t
            .prize
            .filter(|p| *p != 0.0)
            .map(format_prize)
            .unwrap_or_else(|| "—".to_string()),
        strength: t.strength,
    };

    let mut p1 = player_card(record, Player::P1, today);
    let mut p2 = player_card(record, Player::P2, today);

    let main_raw = record.read_text(keys::RESULT).unwrap_or_default();
    let details_raw = record.read_text(keys::RESULT_DETAILS).unwrap_or_default();
    let tokens = parse_set_tokens(&details_raw, &main_raw);
    let score_sets = format_sets(&tokens);
    let score_main = main_from_sets(&tokens).unwrap_or_else(|| format_main_score(&main_raw));
    let finished = record.is_finished() || !tokens.is_empty() || !main_raw.is_empty();

    if let Some(p) = record
        .read_nullable_number(keys::MODEL_WIN_PCT)
        .and_then(prob_from_pct)
    {
        p1.model_prob = Some(p);
        p2.model_prob = Some(1.0 - p);
    }

    let edge_p1 = p1.model_prob.zip(p1.odds).and_then(|(p, o)| win_prob::edge(p, o));
    let edge_p2 = p2.model_prob.zip(p2.odds).and_then(|(p, o)| win_prob::edge(p, o));
    let value_side = win_prob::pick_value_side(edge_p1, edge_p2, edge_threshold);
    let profit = win_prob::settle_flat_stake(value_side, finished, p1.odds);

    Overview {
        header,
        p1,
        p2,
        finished,
        score_main: if finished { score_main } else { "—".to_string() },
        score_sets: if finished { score_sets } else { String::new() },
        edge_p1,
        edge_p2,
        value_side,
        profit,
    }
}

fn player_card(record: &FlatRecord, player: Player, today: NaiveDate) -> PlayerCard {
    let info = record.player(player);
    let (rank_key, seed_key, odds_key) = match player {
        Player::P1 => (keys::P1_RANK, keys::P1_SEED, keys::P1_ODDS),
        Player::P2 => (keys::P2_RANK, keys::P2_SEED, keys::P2_ODDS),
    };
    PlayerCard {
        id: record.player_id(player).or(info.id),
        name: text_or_dash(info.name),
        iso2: info.iso2.unwrap_or_default(),
        iso3: info.iso3.unwrap_or_default(),
        country: info.country.unwrap_or_else(|| "World".to_string()),
        rank: record.read_nullable_number(rank_key),
        seed: record.read_text(seed_key),
        born: info
            .birth_date
            .map(|b| format_born(b, today))
            .unwrap_or_default(),
        plays: info.plays.unwrap_or_default(),
        height: info.height_cm.map(|h| format!("{h} cm")).unwrap_or_default(),
        weight: info.weight_kg.map(|w| format!("{w} kg")).unwrap_or_default(),
        rating_mean: info.rating_mean,
        model_prob: None,
        odds: record.read_nullable_number(odds_key),
    }
}

fn text_or_dash(v: Option<String>) -> String {
    v.unwrap_or_else(|| "—".to_string())
}

fn pct(part: f64, total: f64) -> f64 {
    if total > 0.0 { part / total * 100.0 } else { 0.0 }
}

/// Whole amount with `.` thousands separators and a trailing `$`.
pub fn format_prize(amount: f64) -> String {
    if !amount.is_finite() {
        return "—".to_string();
    }
    let rounded = amount.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}{grouped} $")
}

/// `dd.mm.yyyy HH:MM` (UTC); old archive rows carry no reliable time of day.
pub fn format_match_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return "—".to_string();
    };
    let Some(dt) = parse_timestamp(raw) else {
        return raw.to_string();
    };
    if dt.year() < 2004 {
        return dt.format("%d.%m.%Y").to_string();
    }
    format!("{} {:02}:{:02}", dt.format("%d.%m.%Y"), dt.hour(), dt.minute())
}

fn format_born(birth: NaiveDate, today: NaiveDate) -> String {
    let date = birth.format("%d.%m.%Y");
    match age_on(birth, today) {
        Some(age) => format!("{date} ({age})"),
        None => date.to_string(),
    }
}

pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    u32::try_from(age).ok().filter(|a| *a < 120)
}

/// Set tokens from the detailed result (`"20 64 75"`), without a leading match-score token.
pub fn parse_set_tokens(details: &str, main_raw: &str) -> Vec<String> {
    let mut tokens: Vec<String> = details.split_whitespace().map(str::to_string).collect();
    let Some(first) = tokens.first() else {
        return tokens;
    };
    let looks_like_main = first.len() == 2 && first.chars().all(|c| c.is_ascii_digit());
    let main_digits: String = main_raw.chars().filter(char::is_ascii_digit).collect();
    let same_as_main = !main_raw.is_empty() && main_digits == *first;
    if looks_like_main && (same_as_main || tokens.len() >= 3) {
        tokens.remove(0);
    }
    tokens
}

/// `"64"` -> `"6:4"`, `"67(10)"` -> `"6:7(10)"`.
pub fn format_sets(tokens: &[String]) -> String {
    tokens
        .iter()
        .filter_map(|t| {
            let mut chars = t.trim().chars();
            let first = chars.next()?;
            Some(format!("{first}:{}", chars.as_str()))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Games of one set token, ignoring a trailing tiebreak count.
pub fn set_games(token: &str) -> Option<(u32, u32)> {
    let token = token.trim();
    let (games, tiebreak) = match token.find('(') {
        Some(i) => (&token[..i], Some(&token[i..])),
        None => (token, None),
    };
    if let Some(tb) = tiebreak {
        let inner = tb.strip_prefix('(')?.strip_suffix(')')?;
        if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }
    let mut digits = games.chars();
    let a = digits.next()?.to_digit(10)?;
    let b = digits.next()?.to_digit(10)?;
    if digits.next().is_some() {
        return None;
    }
    Some((a, b))
}

/// Sets won by each player as `"a : b"`; `None` when no set token is readable.
pub fn main_from_sets(tokens: &[String]) -> Option<String> {
    let (mut p1, mut p2) = (0, 0);
    for (a, b) in tokens.iter().filter_map(|t| set_games(t)) {
        if a > b {
            p1 += 1;
        } else if b > a {
            p2 += 1;
        }
    }
    if p1 == 0 && p2 == 0 {
        return None;
    }
    Some(format!("{p1} : {p2}"))
}

pub fn format_main_score(raw: &str) -> String {
    if raw.is_empty() {
        return "—".to_string();
    }
    if let Some((a, b)) = raw.split_once(':') {
        return format!("{} : {}", a.trim(), b.trim());
    }
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() == 2 {
        return format!("{} : {}", chars[0], chars[1]);
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn record(v: Value) -> FlatRecord {
        FlatRecord::from_value(v).expect("object")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn perf_line_reads_wins_and_losses() {
        // Match unit, P2, YEAR, S1: 158 + 16 + 8 + 2 = 184/185.
        let r = record(json!({ "m184": 6, "m185": 2 }));
        let line = perf(&r, PerfUnit::Match, Player::P2, TimeScope::Year, SurfaceScope::Only(Surface::S1));
        assert_eq!(line.wins, 6.0);
        assert_eq!(line.losses, 2.0);
        assert_eq!(line.win_pct, 75.0);

        let empty = perf(&r, PerfUnit::Set, Player::P1, TimeScope::All, SurfaceScope::All);
        assert_eq!(empty.win_pct, 0.0);
    }

    #[test]
    fn form_derives_last_result() {
        // P1 ALL: win m398, loss m408. P2 ALL: win m399, loss m409.
        let r = record(json!({ "m398": 4, "m408": 9, "m409": 3 }));
        let p1 = form(&r, Player::P1, SurfaceScope::All);
        assert_eq!(p1.last_result, LastResult::Win);
        assert_eq!(p1.days_since_match, 4.0);

        let p2 = form(&r, Player::P2, SurfaceScope::All);
        assert_eq!(p2.last_result, LastResult::Loss);
        assert_eq!(p2.days_since_match, 3.0);

        let none = form(&r, Player::P1, SurfaceScope::Only(Surface::S2));
        assert_eq!(none.last_result, LastResult::Unknown);
        assert_eq!(fmt_days(none.days_since_match), "—");
        assert_eq!(fmt_days(12.0), "12");
    }

    #[test]
    fn role_line_shares_and_averages() {
        // ALL window: P1 fav wins m418, dog wins m420, fav losses m422, dog losses m424,
        // avg wp won fav m426.
        let r = record(json!({ "m418": 6, "m420": 1, "m422": 2, "m424": 1, "m426": 0.71 }));
        let fav = role_line(&r, Player::P1, RoleSide::Favourite, TimeScope::All);
        assert_eq!(fav.matches, 8.0);
        assert_eq!(fav.win_pct, 75.0);
        assert_eq!(fav.share_pct, 80.0);
        assert_eq!(fav.avg_win_prob_won, 0.71);
        assert_eq!(fav.avg_win_prob_lost, 0.0);

        let dog = role_line(&r, Player::P1, RoleSide::Underdog, TimeScope::All);
        assert_eq!(dog.share_pct, 20.0);
    }

    #[test]
    fn h2h_reads_records_and_ratings() {
        let r = record(json!({
            "m482": 3, "m483": 1,
            "m502": 28.5, "m503": 3.1,
            "m510": 0.64,
            "m537": 0.7,
            "m529": 29.0
        }));
        assert_eq!(h2h_record(&r, SurfaceScope::All, false), (3.0, 1.0));
        let cur = h2h_rating(&r, RatingMode::M, Player::P1, false);
        assert_eq!(cur, RatingPair { mean: 28.5, deviation: 3.1 });
        assert_eq!(h2h_rating(&r, RatingMode::M, Player::P2, true).mean, 0.0);
        assert_eq!(h2h_win_prob(&r, RatingMode::M, SurfaceScope::All), 0.64);
        assert_eq!(h2h_win_prob(&r, RatingMode::M, SurfaceScope::Only(Surface::S1)), 0.7);
        assert_eq!(h2h_surface_rating(&r, RatingMode::M, Surface::S1, Player::P1, false).mean, 29.0);
    }

    #[test]
    fn rating_summary_picks_phase_by_finished_flag() {
        let r = record(json!({
            "m023": 30.0, "m027": 27.0, "m031": 62.0,
            "m656": true
        }));
        let s = rating_summary(&r, RatingMode::M, SurfaceScope::All);
        assert_eq!(s.phase, RatingPhase::New);
        assert_eq!(s.p1_mean, Some(30.0));
        assert_eq!(s.p1_win_prob, Some(0.62));
        assert!((s.p2_win_prob().unwrap() - 0.38).abs() < 1e-12);

        let pending = record(json!({ "m023": 30.0, "m027": 27.0 }));
        let s = rating_summary(&pending, RatingMode::M, SurfaceScope::All);
        assert_eq!(s.phase, RatingPhase::Old);
        assert_eq!(s.p1_mean, Some(27.0));
        assert_eq!(s.p1_win_prob, None);
    }

    #[test]
    fn strength_needs_all_three_modes() {
        let r = record(json!({ "m027": 24.0, "m036": 25.0, "m045": 26.0, "m029": 20.0 }));
        assert_eq!(combined_strength(&r, Player::P1), Some(25.0));
        assert_eq!(combined_strength(&r, Player::P2), None);
        assert_eq!(rating_to_stars(Some(25.0)), 2.5);
        assert_eq!(rating_to_stars(Some(40.0)), 5.0);
        assert_eq!(rating_to_stars(Some(10.0)), 0.0);
        assert_eq!(rating_to_stars(None), 0.0);
    }

    #[test]
    fn score_tokens_drop_leading_main_score() {
        let tokens = parse_set_tokens("20 64 76(5)", "20");
        assert_eq!(tokens, vec!["64", "76(5)"]);
        assert_eq!(format_sets(&tokens), "6:4 7:6(5)");
        assert_eq!(main_from_sets(&tokens).as_deref(), Some("2 : 0"));

        // Two tokens and no matching main score: keep both.
        assert_eq!(parse_set_tokens("64 36", ""), vec!["64", "36"]);
        assert_eq!(main_from_sets(&parse_set_tokens("64 36", "")).as_deref(), Some("1 : 1"));
        assert!(parse_set_tokens("", "21").is_empty());
    }

    #[test]
    fn set_games_rejects_garbage() {
        assert_eq!(set_games("67(10)"), Some((6, 7)));
        assert_eq!(set_games("ret"), None);
        assert_eq!(set_games("641"), None);
        assert_eq!(set_games("64(x)"), None);
    }

    #[test]
    fn main_score_fallbacks() {
        assert_eq!(format_main_score("2:1"), "2 : 1");
        assert_eq!(format_main_score("21"), "2 : 1");
        assert_eq!(format_main_score(""), "—");
        assert_eq!(format_main_score("W/O"), "W/O");
    }

    #[test]
    fn prize_uses_dot_thousands() {
        assert_eq!(format_prize(30000.0), "30.000 $");
        assert_eq!(format_prize(1234567.4), "1.234.567 $");
        assert_eq!(format_prize(950.0), "950 $");
    }

    #[test]
    fn match_date_formats() {
        assert_eq!(format_match_date(Some("2024-01-05T14:30:00")), "05.01.2024 14:30");
        assert_eq!(format_match_date(Some("1999-07-02T00:00:00")), "02.07.1999");
        assert_eq!(format_match_date(None), "—");
        assert_eq!(format_match_date(Some("soon")), "soon");
    }

    #[test]
    fn age_counts_birthday() {
        let birth = NaiveDate::from_ymd_opt(2000, 6, 2).unwrap();
        assert_eq!(age_on(birth, today()), Some(23));
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()), Some(24));
    }

    #[test]
    fn overview_flags_single_value_side() {
        let r = record(json!({
            "m003": "2024-01-05T14:30:00",
            "m012": 1.80, "m013": 2.00,
            "m655": 60.0,
            "m010": "20",
            "m011": "20 64 63",
            "m656": true,
            "p1": { "p02": "Alpha", "p04": "ITA", "p09": "2000-06-02" },
            "p2": { "p02": "Beta" },
            "t": { "t02": "Open", "t14": 30000 }
        }));
        let ov = build_overview(&r, 0.02, today());
        assert!(ov.finished);
        assert_eq!(ov.score_main, "2 : 0");
        assert_eq!(ov.score_sets, "6:4 6:3");
        assert!((ov.edge_p1.unwrap() - 0.0444).abs() < 1e-4);
        assert!((ov.edge_p2.unwrap() + 0.10).abs() < 1e-9);
        assert_eq!(ov.value_side, Some(Player::P1));
        assert!((ov.profit.unwrap() - 0.8).abs() < 1e-9);
        assert_eq!(ov.header.prize_text, "30.000 $");
        assert_eq!(ov.p1.label(), "Alpha (ITA)");
        assert_eq!(ov.p1.born, "02.06.2000 (23)");
        assert_eq!(ov.p2.country, "World");

        let strict = build_overview(&r, 0.05, today());
        assert_eq!(strict.value_side, None);
        assert_eq!(strict.profit, None);
    }

    #[test]
    fn unfinished_overview_hides_score() {
        let r = record(json!({ "m012": 1.5, "m013": 2.6, "m655": 30.0 }));
        let ov = build_overview(&r, 0.03, today());
        assert!(!ov.finished);
        assert_eq!(ov.score_main, "—");
        assert_eq!(ov.value_side, Some(Player::P2));
        assert_eq!(ov.profit, None);
        assert_eq!(ov.header.prize_text, "—");
    }
}
