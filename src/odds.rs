use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::keys::Player;
use crate::record::OddsRow;
use crate::win_prob::implied_probability;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketSummary {
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

impl OddsRow {
    /// Not flagged by the feed and priced on both sides.
    pub fn is_clean(&self) -> bool {
        let flagged = self.suspicious || self.switched || self.suspicious_mask != 0;
        !flagged && self.p1_odds > 0.0 && self.p2_odds > 0.0
    }

    pub fn price(&self, player: Player) -> f64 {
        match player {
            Player::P1 => self.p1_odds,
            Player::P2 => self.p2_odds,
        }
    }

    /// Bookmaker margin as a fraction (`0.05` = 5%).
    pub fn overround(&self) -> Option<f64> {
        let p1 = implied_probability(self.p1_odds)?;
        let p2 = implied_probability(self.p2_odds)?;
        Some(p1 + p2 - 1.0)
    }

    fn recency(&self) -> (i64, i64) {
        let t = self.quoted_at.map(|t| t.timestamp_millis()).unwrap_or(-1);
        (t, self.series_ordinal)
    }
}

pub fn clean_rows(rows: &[OddsRow]) -> impl Iterator<Item = &OddsRow> {
    rows.iter().filter(|r| r.is_clean())
}

/// Clean row with the highest price for `player`; the first one wins ties.
pub fn best_price(rows: &[OddsRow], player: Player) -> Option<&OddsRow> {
    let mut best: Option<&OddsRow> = None;
    for row in clean_rows(rows) {
        if best.is_none_or(|b| row.price(player) > b.price(player)) {
            best = Some(row);
        }
    }
    best
}

pub fn market_summary(rows: &[OddsRow], player: Player) -> Option<MarketSummary> {
    let mut prices: Vec<f64> = clean_rows(rows)
        .map(|r| r.price(player))
        .filter(|p| p.is_finite() && *p > 0.0)
        .collect();
    if prices.is_empty() {
        return None;
    }
    prices.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Some(MarketSummary {
        min: prices[0],
        median: median_sorted(&prices)?,
        max: prices[prices.len() - 1],
    })
}

fn median_sorted(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most recent clean quote per bookmaker, ordered by bookmaker name.
///
/// Recency compares the quote time first (missing times sort oldest), then the series
/// ordinal.
pub fn latest_by_bookie(rows: &[OddsRow]) -> Vec<&OddsRow> {
    let mut latest: HashMap<i64, &OddsRow> = HashMap::new();
    for row in clean_rows(rows) {
        latest
            .entry(row.bookie_id)
            .and_modify(|cur| {
                if row.recency() > cur.recency() {
                    *cur = row;
                }
            })
            .or_insert(row);
    }
    let mut out: Vec<&OddsRow> = latest.into_values().collect();
    out.sort_by(|a, b| {
        a.bookie_name
            .cmp(&b.bookie_name)
            .then(a.bookie_id.cmp(&b.bookie_id))
    });
    out
}

/// Clean quotes of one bookmaker, newest first.
pub fn bookie_history(rows: &[OddsRow], bookie_id: i64) -> Vec<&OddsRow> {
    let mut out: Vec<&OddsRow> = clean_rows(rows)
        .filter(|r| r.bookie_id == bookie_id)
        .collect();
    out.sort_by_key(|r| std::cmp::Reverse(r.recency()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_timestamp;

    fn row(id: i64, name: &str, at: Option<&str>, ord: i64, p1: f64, p2: f64) -> OddsRow {
        OddsRow {
            bookie_id: id,
            bookie_name: name.to_string(),
            quoted_at: at.and_then(parse_timestamp),
            series_ordinal: ord,
            p1_odds: p1,
            p2_odds: p2,
            ..OddsRow::default()
        }
    }

    #[test]
    fn flagged_or_unpriced_rows_are_not_clean() {
        let mut r = row(1, "A", None, 0, 1.8, 2.0);
        assert!(r.is_clean());
        r.suspicious_mask = 4;
        assert!(!r.is_clean());
        assert!(!row(1, "A", None, 0, 0.0, 2.0).is_clean());
        let mut switched = row(1, "A", None, 0, 1.8, 2.0);
        switched.switched = true;
        assert!(!switched.is_clean());
    }

    #[test]
    fn overround_of_fair_book_is_zero() {
        let fair = row(1, "A", None, 0, 2.0, 2.0);
        assert!(fair.overround().unwrap().abs() < 1e-12);
        let margin = row(1, "A", None, 0, 1.8, 2.0).overround().unwrap();
        assert!((margin - 0.0556).abs() < 1e-3);
        assert!(row(1, "A", None, 0, 0.0, 2.0).overround().is_none());
    }

    #[test]
    fn best_and_summary_skip_dirty_rows() {
        let mut dirty = row(3, "C", None, 0, 9.0, 9.0);
        dirty.suspicious = true;
        let rows = vec![
            row(1, "A", None, 0, 1.8, 2.1),
            row(2, "B", None, 0, 1.9, 2.0),
            dirty,
            row(4, "D", None, 0, 1.7, 2.2),
            row(5, "E", None, 0, 2.0, 1.9),
        ];
        assert_eq!(best_price(&rows, Player::P1).map(|r| r.bookie_id), Some(5));
        assert_eq!(best_price(&rows, Player::P2).map(|r| r.bookie_id), Some(4));

        let s = market_summary(&rows, Player::P1).unwrap();
        assert_eq!(s.min, 1.7);
        assert_eq!(s.max, 2.0);
        assert!((s.median - 1.85).abs() < 1e-12);
        assert!(market_summary(&[], Player::P1).is_none());
    }

    #[test]
    fn latest_per_bookie_uses_time_then_ordinal() {
        let rows = vec![
            row(2, "Zeta", Some("2024-01-01T10:00:00Z"), 1, 1.8, 2.0),
            row(2, "Zeta", Some("2024-01-01T12:00:00Z"), 0, 1.7, 2.1),
            row(1, "Alpha", Some("2024-01-01T12:00:00Z"), 1, 1.9, 1.9),
            row(1, "Alpha", Some("2024-01-01T12:00:00Z"), 3, 1.95, 1.85),
            row(1, "Alpha", None, 9, 1.5, 2.5),
        ];
        let latest = latest_by_bookie(&rows);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].bookie_name, "Alpha");
        assert_eq!(latest[0].series_ordinal, 3);
        assert_eq!(latest[1].p1_odds, 1.7);

        let hist = bookie_history(&rows, 1);
        let ords: Vec<i64> = hist.iter().map(|r| r.series_ordinal).collect();
        assert_eq!(ords, vec![3, 1, 9]);
    }
}
