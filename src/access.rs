use chrono::{DateTime, Duration, Utc};

use crate::error::FetchError;

pub const DEFAULT_LOCK_HOURS: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Entitlements {
    pub logged_in: bool,
    pub admin: bool,
    pub premium: bool,
    pub trial: bool,
}

impl Entitlements {
    pub fn privileged(&self) -> bool {
        self.admin || self.premium || self.trial
    }
}

/// Moment a pending match opens to non-privileged users.
pub fn unlocks_at(start_time: DateTime<Utc>, lock_hours: u32) -> DateTime<Utc> {
    start_time - Duration::hours(i64::from(lock_hours))
}

/// Gate in front of the details fetch.
///
/// Finished matches and privileged users always pass. Everyone else waits until
/// `lock_hours` before the scheduled start; a match without a start time is open.
pub fn check_details_access(
    now: DateTime<Utc>,
    start_time: Option<DateTime<Utc>>,
    finished: bool,
    entitlements: Entitlements,
    lock_hours: u32,
) -> Result<(), FetchError> {
    if finished || entitlements.privileged() {
        return Ok(());
    }
    let Some(start) = start_time else {
        return Ok(());
    };
    let opens = unlocks_at(start, lock_hours);
    if now < opens {
        return Err(FetchError::Locked {
            unlocks_at: opens,
            lock_hours,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, h, m, 0).unwrap()
    }

    #[test]
    fn free_user_is_locked_before_window() {
        let res = check_details_access(at(11, 0), Some(at(14, 0)), false, Entitlements::default(), 2);
        match res {
            Err(FetchError::Locked { unlocks_at, lock_hours }) => {
                assert_eq!(unlocks_at, at(12, 0));
                assert_eq!(lock_hours, 2);
            }
            other => panic!("expected lock, got {other:?}"),
        }
        assert!(check_details_access(at(12, 0), Some(at(14, 0)), false, Entitlements::default(), 2).is_ok());
    }

    #[test]
    fn finished_or_privileged_always_pass() {
        assert!(check_details_access(at(1, 0), Some(at(14, 0)), true, Entitlements::default(), 2).is_ok());
        let trial = Entitlements {
            logged_in: true,
            trial: true,
            ..Entitlements::default()
        };
        assert!(check_details_access(at(1, 0), Some(at(14, 0)), false, trial, 2).is_ok());
        let logged_in_only = Entitlements {
            logged_in: true,
            ..Entitlements::default()
        };
        assert!(check_details_access(at(1, 0), Some(at(14, 0)), false, logged_in_only, 2).is_err());
    }

    #[test]
    fn unknown_start_time_is_open() {
        assert!(check_details_access(at(1, 0), None, false, Entitlements::default(), 2).is_ok());
    }
}
