use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_option_number_from_string;
use serde_json::Value;

use crate::access::{Entitlements, check_details_access};
use crate::config::Config;
use crate::error::FetchError;
use crate::history::HistoryArchive;
use crate::http_client::http_client;
use crate::record::{FlatRecord, parse_timestamp};
use crate::state::MatchRequest;

const SNIFF_LEN: usize = 32;
const LOCKED_CODE: &str = "DETAILS_LOCKED";

/// Reads match-details records and rating histories from the backend API.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    api_base: String,
    client: Client,
    entitlements: Entitlements,
    lock_hours: u32,
}

#[derive(Debug, Deserialize)]
struct LockedPayload {
    code: Option<String>,
    #[serde(rename = "unlocksAt")]
    unlocks_at: Option<String>,
    #[serde(
        rename = "lockHours",
        default,
        deserialize_with = "deserialize_option_number_from_string"
    )]
    lock_hours: Option<u32>,
}

impl ArchiveClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = http_client(config.http_timeout).context("archive client")?;
        Ok(Self {
            api_base: config.api_base.clone(),
            client: client.clone(),
            entitlements: config.entitlements,
            lock_hours: config.lock_hours,
        })
    }

    pub fn details_url(&self, match_id: i64) -> String {
        format!("{}/match-details/{match_id}", self.api_base)
    }

    pub fn history_url(&self, player_id: i64) -> String {
        format!("{}/ts/{player_id}", self.api_base)
    }

    /// Applies the lock window before touching the network.
    pub fn fetch_details_guarded(
        &self,
        request: &MatchRequest,
        now: DateTime<Utc>,
    ) -> Result<FlatRecord, FetchError> {
        check_details_access(
            now,
            request.start_time,
            request.finished,
            self.entitlements,
            self.lock_hours,
        )?;
        self.fetch_details(request.match_id)
    }

    pub fn fetch_details(&self, match_id: i64) -> Result<FlatRecord, FetchError> {
        let url = self.details_url(match_id);
        let (status, body) = self.get_bytes(&url)?;
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { url });
        }
        let value = decode_payload(&body, &url);
        if let Ok(value) = value.as_ref()
            && let Some(locked) = locked_from_value(value, self.lock_hours)
        {
            return Err(locked);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }
        FlatRecord::from_value(value?).map_err(|err| FetchError::Decode {
            url,
            message: err.to_string(),
        })
    }

    /// `Ok(None)` when the backend has no history for the player.
    pub fn fetch_history(&self, player_id: i64) -> Result<Option<HistoryArchive>, FetchError> {
        let url = self.history_url(player_id);
        let (status, body) = self.get_bytes(&url)?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let value = decode_payload(&body, &url)?;
        let archive = HistoryArchive::from_value(&value);
        if archive.is_none() {
            log::warn!("history payload for player {player_id} has no series map");
        }
        Ok(archive)
    }

    fn get_bytes(&self, url: &str) -> Result<(StatusCode, Vec<u8>), FetchError> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        let body = resp.bytes()?;
        Ok((status, body.to_vec()))
    }
}

/// Sniffs the first bytes: HTML pages and compressed archives are rejected, JSON is parsed.
pub fn decode_payload(bytes: &[u8], url: &str) -> Result<Value, FetchError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let head_len = bytes.len().min(SNIFF_LEN);
    let head = String::from_utf8_lossy(&bytes[..head_len]).to_ascii_lowercase();
    let head = head.trim_start();

    if head.starts_with("<!doctype") || head.starts_with("<html") {
        return Err(FetchError::Html {
            url: url.to_string(),
        });
    }
    if !(head.starts_with('{') || head.starts_with('[')) {
        return Err(FetchError::UnsupportedEncoding {
            url: url.to_string(),
        });
    }
    serde_json::from_slice(bytes).map_err(|err| FetchError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })
}

/// Recognises the backend's `{ code: "DETAILS_LOCKED", unlocksAt, lockHours }` reply.
pub fn locked_from_value(value: &Value, default_hours: u32) -> Option<FetchError> {
    let payload = LockedPayload::deserialize(value).ok()?;
    if payload.code.as_deref() != Some(LOCKED_CODE) {
        return None;
    }
    let unlocks_at = payload
        .unlocks_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now);
    Some(FetchError::Locked {
        unlocks_at,
        lock_hours: payload.lock_hours.unwrap_or(default_hours),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn html_is_reported_as_html() {
        let err = decode_payload(b"  <!DOCTYPE html><html></html>", "u").unwrap_err();
        assert!(matches!(err, FetchError::Html { .. }));
        let err = decode_payload(b"<HTML>", "u").unwrap_err();
        assert!(matches!(err, FetchError::Html { .. }));
    }

    #[test]
    fn json_with_bom_and_whitespace_parses() {
        let value = decode_payload(b"\xEF\xBB\xBF \n{\"m001\": 5}", "u").unwrap();
        assert_eq!(value["m001"], 5);
        assert!(decode_payload(b"[1,2]", "u").unwrap().is_array());
    }

    #[test]
    fn binary_payload_is_unsupported() {
        let err = decode_payload(&[0x1b, 0x8c, 0x02, 0x00], "u").unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedEncoding { .. }));
    }

    #[test]
    fn broken_json_is_a_decode_error() {
        let err = decode_payload(b"{\"m001\":", "u").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[test]
    fn locked_reply_is_recognised() {
        let value = json!({
            "code": "DETAILS_LOCKED",
            "unlocksAt": "2024-01-05T12:00:00Z",
            "lockHours": "3"
        });
        match locked_from_value(&value, 2) {
            Some(FetchError::Locked {
                unlocks_at,
                lock_hours,
            }) => {
                assert_eq!(unlocks_at, Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap());
                assert_eq!(lock_hours, 3);
            }
            other => panic!("expected lock, got {other:?}"),
        }
        assert!(locked_from_value(&json!({ "m001": 1 }), 2).is_none());
        assert!(locked_from_value(&json!([1, 2]), 2).is_none());
    }

    #[test]
    fn urls_follow_api_base() {
        let config = Config {
            api_base: "https://example.test/api".to_string(),
            ..Config::default()
        };
        let client = ArchiveClient::new(&config).unwrap();
        assert_eq!(client.details_url(7), "https://example.test/api/match-details/7");
        assert_eq!(client.history_url(42), "https://example.test/api/ts/42");
    }

    #[test]
    fn guarded_fetch_short_circuits_when_locked() {
        let client = ArchiveClient::new(&Config::default()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap();
        let request = MatchRequest {
            match_id: 1,
            start_time: Some(Utc.with_ymd_and_hms(2024, 1, 5, 14, 0, 0).unwrap()),
            finished: false,
        };
        let err = client.fetch_details_guarded(&request, now).unwrap_err();
        assert!(err.is_locked());
    }
}
