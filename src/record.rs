use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::keys::{self, FieldKey, Player};

/// Decoded match-details record: minified `mNNN` scalars plus nested `p1`, `p2`, `t`, `o`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord {
    fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub iso2: Option<String>,
    pub iso3: Option<String>,
    pub country: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub plays: Option<String>,
    pub rating_mean: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentInfo {
    pub name: Option<String>,
    pub tour_type: Option<String>,
    pub iso3: Option<String>,
    pub iso2: Option<String>,
    pub country: Option<String>,
    pub prize: Option<f64>,
    pub strength: Option<f64>,
}

/// One bookmaker quote from the `o` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OddsRow {
    pub bookie_id: i64,
    pub bookie_name: String,
    pub quoted_at: Option<DateTime<Utc>>,
    pub series_ordinal: i64,
    pub p1_odds: f64,
    pub p2_odds: f64,
    pub suspicious: bool,
    pub switched: bool,
    pub suspicious_mask: i64,
}

impl FlatRecord {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Err(anyhow!("empty match details payload"));
        }
        let root: Value = serde_json::from_str(trimmed).context("invalid match details json")?;
        Self::from_value(root)
    }

    pub fn from_value(root: Value) -> Result<Self> {
        match root {
            Value::Object(mut map) => {
                // API responses sometimes wrap the record as { data: {...} }.
                if !map.contains_key(&keys::MATCH_ID.to_string())
                    && let Some(Value::Object(inner)) = map.remove("data")
                {
                    return Ok(Self { fields: inner });
                }
                Ok(Self { fields: map })
            }
            other => Err(anyhow!(
                "match details payload is not an object ({})",
                json_kind(&other)
            )),
        }
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn field(&self, key: FieldKey) -> Option<&Value> {
        self.fields.get(&key.to_string())
    }

    /// Finite number at `key`, or `0.0` when missing or not numeric.
    pub fn read_number(&self, key: FieldKey) -> f64 {
        self.read_nullable_number(key).unwrap_or(0.0)
    }

    /// Finite number at `key`, or `None` when missing or not numeric.
    pub fn read_nullable_number(&self, key: FieldKey) -> Option<f64> {
        self.field(key).and_then(finite_number)
    }

    pub fn read_text(&self, key: FieldKey) -> Option<String> {
        self.field(key).and_then(text_value)
    }

    pub fn read_bool(&self, key: FieldKey) -> bool {
        self.field(key).is_some_and(truthy)
    }

    pub fn match_id(&self) -> Option<i64> {
        self.read_nullable_number(keys::MATCH_ID).map(|v| v as i64)
    }

    pub fn player_id(&self, player: Player) -> Option<i64> {
        let key = match player {
            Player::P1 => keys::P1_ID,
            Player::P2 => keys::P2_ID,
        };
        self.read_nullable_number(key).map(|v| v as i64)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.read_text(keys::START_TIME)
            .as_deref()
            .and_then(parse_timestamp)
    }

    pub fn match_day(&self) -> Option<NaiveDate> {
        self.read_text(keys::START_TIME)
            .as_deref()
            .and_then(parse_day)
    }

    pub fn is_finished(&self) -> bool {
        self.read_bool(keys::IS_FINISHED)
    }

    pub fn player(&self, player: Player) -> PlayerInfo {
        let key = match player {
            Player::P1 => "p1",
            Player::P2 => "p2",
        };
        let Some(obj) = self.fields.get(key).and_then(Value::as_object) else {
            return PlayerInfo::default();
        };
        PlayerInfo {
            id: obj.get("p01").and_then(finite_number).map(|v| v as i64),
            name: obj.get("p02").and_then(text_value),
            iso3: obj.get("p04").and_then(text_value),
            iso2: obj.get("p05").and_then(text_value),
            country: obj.get("p06").and_then(text_value),
            birth_date: obj
                .get("p09")
                .and_then(text_value)
                .as_deref()
                .and_then(parse_day),
            height_cm: obj.get("p10").and_then(finite_number).filter(|v| *v > 0.0),
            weight_kg: obj.get("p11").and_then(finite_number).filter(|v| *v > 0.0),
            plays: obj.get("p14").and_then(text_value),
            rating_mean: obj.get("trueSkillMean").and_then(finite_number),
        }
    }

    pub fn tournament(&self) -> TournamentInfo {
        let Some(obj) = self.fields.get("t").and_then(Value::as_object) else {
            return TournamentInfo::default();
        };
        TournamentInfo {
            name: obj.get("t02").and_then(text_value),
            tour_type: obj.get("t03").and_then(text_value),
            iso3: obj.get("t04").and_then(text_value),
            iso2: obj.get("t05").and_then(text_value),
            country: obj.get("t06").and_then(text_value),
            prize: obj.get("t14").and_then(finite_number),
            strength: obj.get("t17").and_then(finite_number),
        }
    }

    pub fn odds_rows(&self) -> Vec<OddsRow> {
        let Some(rows) = self.fields.get("o").and_then(Value::as_array) else {
            return Vec::new();
        };
        rows.iter()
            .filter_map(Value::as_object)
            .map(|obj| OddsRow {
                bookie_id: obj.get("o01").and_then(finite_number).unwrap_or(0.0) as i64,
                bookie_name: obj.get("o02").and_then(text_value).unwrap_or_default(),
                quoted_at: obj
                    .get("o03")
                    .and_then(text_value)
                    .as_deref()
                    .and_then(parse_timestamp),
                series_ordinal: obj.get("o04").and_then(finite_number).unwrap_or(0.0) as i64,
                p1_odds: obj.get("o05").and_then(finite_number).unwrap_or(0.0),
                p2_odds: obj.get("o06").and_then(finite_number).unwrap_or(0.0),
                suspicious: obj.get("o07").is_some_and(truthy),
                switched: obj.get("o08").is_some_and(truthy),
                suspicious_mask: obj.get("o09").and_then(finite_number).unwrap_or(0.0) as i64,
            })
            .collect()
    }
}

/// Numbers only; numeric strings are not coerced so that counters stay strict.
fn finite_number(v: &Value) -> Option<f64> {
    v.as_f64().filter(|n| n.is_finite())
}

fn text_value(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() { None } else { Some(s) }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Calendar day from the first ten characters of an ISO date or timestamp.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    parse_day(trimmed)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> FlatRecord {
        FlatRecord::from_value(v).expect("object")
    }

    #[test]
    fn read_number_defaults_to_zero() {
        let r = record(json!({ "m158": 12, "m159": "7", "m160": null }));
        assert_eq!(r.read_number(FieldKey::new(158)), 12.0);
        assert_eq!(r.read_number(FieldKey::new(159)), 0.0);
        assert_eq!(r.read_number(FieldKey::new(160)), 0.0);
        assert_eq!(r.read_number(FieldKey::new(161)), 0.0);
    }

    #[test]
    fn read_nullable_number_distinguishes_absent_from_zero() {
        let r = record(json!({ "m023": 0.0, "m024": true }));
        assert_eq!(r.read_nullable_number(FieldKey::new(23)), Some(0.0));
        assert_eq!(r.read_nullable_number(FieldKey::new(24)), None);
        assert_eq!(r.read_nullable_number(FieldKey::new(25)), None);
    }

    #[test]
    fn data_envelope_is_unwrapped() {
        let r = FlatRecord::from_json(r#"{"ok":true,"data":{"m001":77,"m656":true}}"#)
            .expect("parse");
        assert_eq!(r.match_id(), Some(77));
        assert!(r.is_finished());
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(FlatRecord::from_json("[1,2]").is_err());
        assert!(FlatRecord::from_json("null").is_err());
    }

    #[test]
    fn match_day_truncates_timestamp() {
        let r = record(json!({ "m003": "2024-01-05T14:30:00" }));
        assert_eq!(r.match_day(), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert!(r.start_time().is_some());
    }

    #[test]
    fn nested_player_and_odds_tolerate_garbage() {
        let r = record(json!({
            "p1": { "p02": "  Alpha ", "p04": "ITA", "p10": 0, "trueSkillMean": 27.5 },
            "o": [
                { "o01": 3, "o02": "Book", "o05": 1.8, "o06": 2.0, "o07": 0 },
                "junk",
                { "o01": 4, "o05": "x", "o08": true }
            ]
        }));
        let p1 = r.player(Player::P1);
        assert_eq!(p1.name.as_deref(), Some("Alpha"));
        assert_eq!(p1.height_cm, None);
        assert_eq!(p1.rating_mean, Some(27.5));
        assert_eq!(r.player(Player::P2), PlayerInfo::default());

        let rows = r.odds_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bookie_name, "Book");
        assert_eq!(rows[1].p1_odds, 0.0);
        assert!(rows[1].switched);
    }
}
