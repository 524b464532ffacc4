use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures of the details/history fetch path that the viewer reports differently.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("match details are locked until {unlocks_at} ({lock_hours}h before start)")]
    Locked {
        unlocks_at: DateTime<Utc>,
        lock_hours: u32,
    },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("got HTML instead of data from {url}")]
    Html { url: String },

    #[error("compressed archive payloads are not supported ({url})")]
    UnsupportedEncoding { url: String },

    #[error("invalid payload from {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    pub fn is_locked(&self) -> bool {
        matches!(self, FetchError::Locked { .. })
    }

    /// Short text for the status line.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Locked { unlocks_at, .. } => format!(
                "Details unlock at {}",
                unlocks_at.format("%d.%m.%Y %H:%M UTC")
            ),
            FetchError::NotFound { .. } => "Match details not found.".to_string(),
            FetchError::Html { .. } | FetchError::UnsupportedEncoding { .. } => {
                "Archive payload could not be read.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn locked_message_names_unlock_time() {
        let err = FetchError::Locked {
            unlocks_at: Utc.with_ymd_and_hms(2024, 1, 5, 12, 30, 0).unwrap(),
            lock_hours: 2,
        };
        assert!(err.is_locked());
        assert_eq!(err.user_message(), "Details unlock at 05.01.2024 12:30 UTC");
        assert!(err.to_string().contains("2h before start"));
    }

    #[test]
    fn generic_errors_fall_back_to_display() {
        let err = FetchError::Status {
            status: 503,
            url: "http://x/ts/1".to_string(),
        };
        assert!(!err.is_locked());
        assert_eq!(err.user_message(), "HTTP 503 from http://x/ts/1");
    }
}
