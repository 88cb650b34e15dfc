//! Brute-force lockout state machine.
//!
//! Pure functions over an account's `(failed_attempts, locked_until)` pair.
//! Callers pass `now` explicitly; persistence and atomicity live in the
//! repository layer.

use chrono::{DateTime, Duration, Utc};

use crate::config::LockoutConfig;

/// Persisted lockout fields of a single account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockState {
    pub failed_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Where an account stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Open { failed_attempts: u32 },
    Locked { remaining_minutes: i64 },
    /// A lock was set but has elapsed; the record must be cleared before use.
    Expired,
}

/// Result of recording a failed credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    AttemptsRemaining(u32),
    LockedOut { minutes: i64 },
}

impl LockState {
    #[must_use]
    pub const fn cleared() -> Self {
        Self {
            failed_attempts: 0,
            locked_until: None,
        }
    }

    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> LockStatus {
        match self.locked_until {
            Some(until) if now < until => LockStatus::Locked {
                remaining_minutes: remaining_minutes(until, now),
            },
            Some(_) => LockStatus::Expired,
            None => LockStatus::Open {
                failed_attempts: self.failed_attempts,
            },
        }
    }

    /// Applies the lazy expiry transition: an elapsed lock becomes a cleared record.
    #[must_use]
    pub fn normalized(self, now: DateTime<Utc>) -> Self {
        match self.status(now) {
            LockStatus::Expired => Self::cleared(),
            _ => self,
        }
    }

    #[must_use]
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status(now), LockStatus::Locked { .. })
    }
}

/// Threshold and duration of the lockout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    max_attempts: u32,
    duration: Duration,
}

impl LockoutPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, lockout_minutes: i64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            duration: Duration::minutes(lockout_minutes.max(1)),
        }
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn lockout_minutes(&self) -> i64 {
        self.duration.num_minutes()
    }

    /// Transition for a failed credential check on an open account.
    ///
    /// The caller must have normalized the state and confirmed it is not locked.
    #[must_use]
    pub fn register_failure(
        &self,
        state: LockState,
        now: DateTime<Utc>,
    ) -> (LockState, FailureOutcome) {
        let failed_attempts = state.failed_attempts.saturating_add(1);

        if failed_attempts >= self.max_attempts {
            let next = LockState {
                failed_attempts,
                locked_until: Some(now + self.duration),
            };
            (
                next,
                FailureOutcome::LockedOut {
                    minutes: self.lockout_minutes(),
                },
            )
        } else {
            let next = LockState {
                failed_attempts,
                locked_until: None,
            };
            (
                next,
                FailureOutcome::AttemptsRemaining(self.max_attempts - failed_attempts),
            )
        }
    }

    /// Transition for a successful credential check.
    #[must_use]
    pub const fn register_success(&self) -> LockState {
        LockState::cleared()
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::from(&LockoutConfig::default())
    }
}

impl From<&LockoutConfig> for LockoutPolicy {
    fn from(config: &LockoutConfig) -> Self {
        Self::new(config.max_attempts, config.lockout_minutes)
    }
}

/// Whole minutes left on a lock, rounded up, never less than one while locked.
#[must_use]
pub fn remaining_minutes(locked_until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let remaining_ms = (locked_until - now).num_milliseconds();
    if remaining_ms <= 0 {
        return 0;
    }
    ((remaining_ms + 59_999) / 60_000).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn failures_count_down_then_lock() {
        let policy = LockoutPolicy::new(5, 15);
        let mut state = LockState::cleared();
        let mut reported = Vec::new();

        for _ in 0..4 {
            let (next, outcome) = policy.register_failure(state, at(0));
            state = next;
            reported.push(outcome);
        }

        assert_eq!(
            reported,
            vec![
                FailureOutcome::AttemptsRemaining(4),
                FailureOutcome::AttemptsRemaining(3),
                FailureOutcome::AttemptsRemaining(2),
                FailureOutcome::AttemptsRemaining(1),
            ]
        );

        let (locked, outcome) = policy.register_failure(state, at(0));
        assert_eq!(outcome, FailureOutcome::LockedOut { minutes: 15 });
        assert_eq!(locked.failed_attempts, 5);
        assert_eq!(locked.locked_until, Some(at(15 * 60)));
        assert!(locked.is_locked(at(0)));
    }

    #[test]
    fn lock_self_clears_after_expiry() {
        let state = LockState {
            failed_attempts: 5,
            locked_until: Some(at(60)),
        };

        assert_eq!(state.status(at(60)), LockStatus::Expired);
        assert_eq!(state.status(at(3600)), LockStatus::Expired);
        assert_eq!(state.normalized(at(61)), LockState::cleared());
        assert_eq!(state.normalized(at(59)), state);
    }

    #[test]
    fn remaining_minutes_rounds_up_with_floor_of_one() {
        assert_eq!(remaining_minutes(at(15 * 60), at(0)), 15);
        assert_eq!(remaining_minutes(at(15 * 60), at(1)), 15);
        assert_eq!(remaining_minutes(at(15 * 60), at(60)), 14);
        assert_eq!(remaining_minutes(at(1), at(0)), 1);
        assert_eq!(remaining_minutes(at(0), at(0)), 0);
        assert_eq!(remaining_minutes(at(0), at(10)), 0);
    }

    #[test]
    fn locked_status_reports_remaining_minutes() {
        let state = LockState {
            failed_attempts: 5,
            locked_until: Some(at(90)),
        };
        assert_eq!(
            state.status(at(0)),
            LockStatus::Locked {
                remaining_minutes: 2
            }
        );
    }

    #[test]
    fn success_clears_any_count() {
        let policy = LockoutPolicy::default();
        assert_eq!(policy.register_success(), LockState::cleared());
    }

    #[test]
    fn over_threshold_count_relocks_on_next_failure() {
        let policy = LockoutPolicy::new(3, 10);
        let state = LockState {
            failed_attempts: 7,
            locked_until: None,
        };
        let (next, outcome) = policy.register_failure(state, at(0));
        assert_eq!(outcome, FailureOutcome::LockedOut { minutes: 10 });
        assert_eq!(next.locked_until, Some(at(600)));
    }
}
