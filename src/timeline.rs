//! Joint rating timeline for the two players of a match.
//!
//! Both players are projected onto one shared, strictly increasing set of calendar days.
//! On each day a player carries their most recent observation at or before that day
//! (forward-fill) and the rating prior before their first observation.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::history::RatingSample;
use crate::keys::SurfaceScope;
use crate::win_prob::{DEFAULT_DEVIATION, DEFAULT_MEAN, p1_win_probability};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedPoint {
    pub day: NaiveDate,
    pub p1_mean: f64,
    pub p1_deviation: f64,
    pub p2_mean: f64,
    pub p2_deviation: f64,
    pub p1_win_prob: f64,
}

impl MergedPoint {
    fn new(day: NaiveDate, p1: Rating, p2: Rating) -> Self {
        Self {
            day,
            p1_mean: p1.mean,
            p1_deviation: p1.deviation,
            p2_mean: p2.mean,
            p2_deviation: p2.deviation,
            p1_win_prob: p1_win_probability(p1.mean, p1.deviation, p2.mean, p2.deviation),
        }
    }

    pub fn p2_win_prob(&self) -> f64 {
        1.0 - self.p1_win_prob
    }

    /// Day start as unix milliseconds, the chart's time axis unit.
    pub fn time_ms(&self) -> f64 {
        day_ms(self.day)
    }
}

pub fn day_ms(day: NaiveDate) -> f64 {
    day.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis() as f64)
        .unwrap_or(0.0)
}

/// Inputs for one merge: each player's ALL-surface history, the selected surface's
/// history, and the match day.
#[derive(Debug, Clone, Copy)]
pub struct MergeInputs<'a> {
    pub p1_all: &'a [RatingSample],
    pub p2_all: &'a [RatingSample],
    pub p1_surface: &'a [RatingSample],
    pub p2_surface: &'a [RatingSample],
    pub match_day: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rating {
    mean: f64,
    deviation: f64,
}

impl Default for Rating {
    fn default() -> Self {
        Self {
            mean: DEFAULT_MEAN,
            deviation: DEFAULT_DEVIATION,
        }
    }
}

/// Walks one sorted history forward, yielding the latest rating at or before a day.
struct ForwardFill<'a> {
    samples: &'a [RatingSample],
    next: usize,
    current: Rating,
}

impl<'a> ForwardFill<'a> {
    fn new(samples: &'a [RatingSample]) -> Self {
        Self {
            samples,
            next: 0,
            current: Rating::default(),
        }
    }

    fn advance_to(&mut self, day: NaiveDate) -> Rating {
        while let Some(sample) = self.samples.get(self.next) {
            if sample.day > day {
                break;
            }
            self.current = Rating {
                mean: sample.mean,
                deviation: sample.deviation,
            };
            self.next += 1;
        }
        self.current
    }
}

pub fn merge_histories(inputs: MergeInputs<'_>, scope: SurfaceScope) -> Vec<MergedPoint> {
    match scope {
        SurfaceScope::All => merge_union(inputs.p1_all, inputs.p2_all, inputs.match_day),
        SurfaceScope::Only(_) => merge_surface(inputs),
    }
}

/// Sorted union of both players' ALL-surface days plus the match day. Fewer than two
/// days cannot form a chart and yield an empty timeline.
pub fn shared_timeline(
    p1_all: &[RatingSample],
    p2_all: &[RatingSample],
    match_day: Option<NaiveDate>,
) -> Vec<NaiveDate> {
    if p1_all.is_empty() && p2_all.is_empty() {
        return Vec::new();
    }
    let mut days: BTreeSet<NaiveDate> = p1_all.iter().chain(p2_all).map(|s| s.day).collect();
    if let Some(day) = match_day {
        days.insert(day);
    }
    if days.len() < 2 {
        return Vec::new();
    }
    days.into_iter().collect()
}

/// ALL-surface merge: values come from the same histories that define the timeline.
pub fn merge_union(
    p1_all: &[RatingSample],
    p2_all: &[RatingSample],
    match_day: Option<NaiveDate>,
) -> Vec<MergedPoint> {
    let timeline = shared_timeline(p1_all, p2_all, match_day);
    fill_along(&timeline, p1_all, p2_all)
}

/// Surface-conditioned merge: the x-axis stays on the ALL-surface timeline while values
/// come from the surface-specific histories.
pub fn merge_surface(inputs: MergeInputs<'_>) -> Vec<MergedPoint> {
    let timeline = shared_timeline(inputs.p1_all, inputs.p2_all, inputs.match_day);
    fill_along(&timeline, inputs.p1_surface, inputs.p2_surface)
}

fn fill_along(timeline: &[NaiveDate], p1: &[RatingSample], p2: &[RatingSample]) -> Vec<MergedPoint> {
    let mut fill1 = ForwardFill::new(p1);
    let mut fill2 = ForwardFill::new(p2);
    timeline
        .iter()
        .map(|&day| MergedPoint::new(day, fill1.advance_to(day), fill2.advance_to(day)))
        .collect()
}

/// Number of consecutive-day steps where either player's mean moved.
pub fn count_mean_changes(series: &[MergedPoint]) -> usize {
    series
        .windows(2)
        .filter(|w| w[0].p1_mean != w[1].p1_mean || w[0].p2_mean != w[1].p2_mean)
        .count()
}
