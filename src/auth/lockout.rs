/// Account Lockout Policy
///
/// Pure decision logic over (failed attempts, lock timestamp, now). The
/// orchestrator persists whatever this module decides; nothing here touches
/// the database or the clock.
use chrono::{DateTime, Duration, Utc};

/// Consecutive failed logins that trigger a lock.
pub const MAX_FAILED_LOGIN_ATTEMPTS: i32 = 5;

/// How long an account stays locked, in minutes. Single source of truth for
/// both enforcement and user-facing messages.
pub const LOCKOUT_DURATION_MINUTES: i64 = 15;

/// Lock state of an account at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Open,
    Locked { minutes_remaining: i64 },
}

/// Outcome of recording one more failed login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedLogin {
    pub attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Decide whether the account is currently locked. A lock in the past is
/// treated as open; no explicit unlock transition exists.
pub fn check(locked_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> LockState {
    match locked_until {
        Some(until) if until > now => {
            let remaining_seconds = (until - now).num_seconds();
            // Round up so the user is never told zero minutes.
            let minutes_remaining = (remaining_seconds + 59) / 60;
            LockState::Locked {
                minutes_remaining: minutes_remaining.max(1),
            }
        }
        _ => LockState::Open,
    }
}

/// Record a failed attempt on top of `previous_attempts`. The lock engages
/// exactly when the counter reaches the threshold.
pub fn record_failure(previous_attempts: i32, now: DateTime<Utc>) -> FailedLogin {
    let attempts = previous_attempts + 1;
    let locked_until = if attempts >= MAX_FAILED_LOGIN_ATTEMPTS {
        Some(now + Duration::minutes(LOCKOUT_DURATION_MINUTES))
    } else {
        None
    };

    FailedLogin {
        attempts,
        locked_until,
    }
}
