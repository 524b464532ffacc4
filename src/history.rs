use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use serde_json::Value;

use crate::keys::{RatingMode, SurfaceScope};
use crate::record::parse_day;

/// One rating observation after a match, at day resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSample {
    pub match_id: i64,
    pub day: NaiveDate,
    pub mean: f64,
    pub deviation: f64,
}

/// Per-player rating history keyed by `"{mode}_{surface}"` (e.g. `M_ALL`, `GSM_S3`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryArchive {
    pub player_id: Option<i64>,
    series: HashMap<String, Vec<RatingSample>>,
}

#[derive(Debug, Deserialize)]
struct RawSample {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    m: f64,
    d: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    t: f64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    s: f64,
}

pub fn series_key(mode: RatingMode, scope: SurfaceScope) -> String {
    format!("{}_{}", mode.code(), scope.code())
}

impl HistoryArchive {
    /// Parses a history payload. Returns `Ok(None)` when the payload carries no series map,
    /// which callers treat as "history unavailable".
    pub fn from_json(raw: &str) -> Result<Option<Self>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }
        let root: Value = serde_json::from_str(trimmed).context("invalid rating history json")?;
        Ok(Self::from_value(&root))
    }

    pub fn from_value(root: &Value) -> Option<Self> {
        // Backend envelope: { ok, playerTPId, data: { p, s } }.
        let body = match root.get("data") {
            Some(inner) if inner.get("s").is_some() => inner,
            _ => root,
        };
        let series_map = body.get("s")?.as_object()?;

        let mut series = HashMap::new();
        for (key, arr) in series_map {
            let Some(arr) = arr.as_array() else {
                continue;
            };
            series.insert(key.clone(), normalize_samples(arr));
        }

        Some(Self {
            player_id: body.get("p").and_then(Value::as_i64),
            series,
        })
    }

    pub fn from_series(
        player_id: Option<i64>,
        series: impl IntoIterator<Item = (String, Vec<RatingSample>)>,
    ) -> Self {
        Self {
            player_id,
            series: series.into_iter().collect(),
        }
    }

    /// Normalized series for one selector; empty when the archive lacks it.
    pub fn series(&self, mode: RatingMode, scope: SurfaceScope) -> &[RatingSample] {
        self.series
            .get(&series_key(mode, scope))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }
}

/// Day-truncates, validates, and dedupes raw samples: one sample per day, ascending,
/// keeping the highest match id when several samples share a day.
pub fn normalize_samples(raw: &[Value]) -> Vec<RatingSample> {
    let mut parsed: Vec<RatingSample> = raw
        .iter()
        .filter_map(|v| serde_json::from_value::<RawSample>(v.clone()).ok())
        .filter(|r| r.m.is_finite() && r.t.is_finite() && r.s.is_finite())
        .filter_map(|r| {
            Some(RatingSample {
                match_id: r.m as i64,
                day: parse_day(&r.d)?,
                mean: r.t,
                deviation: r.s,
            })
        })
        .collect();

    parsed.sort_by(|a, b| a.day.cmp(&b.day).then(a.match_id.cmp(&b.match_id)));

    let mut out: Vec<RatingSample> = Vec::with_capacity(parsed.len());
    for sample in parsed {
        match out.last_mut() {
            Some(last) if last.day == sample.day => *last = sample,
            _ => out.push(sample),
        }
    }
    out
}
