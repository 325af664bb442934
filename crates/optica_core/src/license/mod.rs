//! License gate: a time-boxed trial evaluated once at startup.
//!
//! # Responsibility
//! - Decide whether the session may reach patient/order data.
//! - Accept the unlock secret while the trial is expired.
//!
//! # Invariants
//! - Evaluation happens once per boot; a session that crosses the trial
//!   boundary keeps running until the next restart.
//! - `Licensed` is terminal and survives restarts.
//! - A rejected secret leaves state and storage unchanged and raises an
//!   indicator that stays visible for exactly [`REJECTION_INDICATOR_MS`].
//! - This is a product gate, not a security boundary.

pub mod flags;

use crate::repo::kv_repo::{KeyValueStore, StorageError};
use chrono::{DateTime, Duration, Utc};
use flags::{mark_licensed, LicenseFlags, TrialStart};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// How long the wrong-secret indicator stays visible.
pub const REJECTION_INDICATOR_MS: i64 = 2_000;

pub type LicenseResult<T> = Result<T, LicenseError>;

#[derive(Debug)]
pub enum LicenseError {
    InvalidSecret,
    Storage(StorageError),
}

impl Display for LicenseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSecret => write!(f, "invalid product key"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LicenseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSecret => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<StorageError> for LicenseError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseState {
    InTrial,
    Expired,
    Licensed,
}

impl LicenseState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InTrial => "in_trial",
            Self::Expired => "expired",
            Self::Licensed => "licensed",
        }
    }
}

/// Trial length and the product key accepted by the lock screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialPolicy {
    pub trial_days: i64,
    pub unlock_secret: String,
}

impl Default for TrialPolicy {
    fn default() -> Self {
        Self {
            trial_days: 30,
            unlock_secret: "opticage".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LicenseGate {
    state: LicenseState,
    policy: TrialPolicy,
    elapsed_days: Option<i64>,
    last_rejection: Option<DateTime<Utc>>,
}

impl LicenseGate {
    /// Evaluates the gate from persisted flags.
    ///
    /// # Side effects
    /// - Writes the trial start when it is absent.
    pub fn evaluate<S: KeyValueStore>(
        kv: &S,
        policy: TrialPolicy,
        now: DateTime<Utc>,
    ) -> LicenseResult<Self> {
        let flags = LicenseFlags::load_or_initialize(kv, now)?;
        let (state, elapsed_days) = decide(&flags, policy.trial_days, now);
        info!(
            "event=license_evaluate module=license status=ok state={} elapsed_days={}",
            state.as_str(),
            elapsed_days.map_or_else(|| "none".to_string(), |d| d.to_string())
        );
        Ok(Self {
            state,
            policy,
            elapsed_days,
            last_rejection: None,
        })
    }

    pub fn state(&self) -> LicenseState {
        self.state
    }

    /// Whether patient/order data may be reached.
    pub fn allows_access(&self) -> bool {
        !matches!(self.state, LicenseState::Expired)
    }

    pub fn elapsed_days(&self) -> Option<i64> {
        self.elapsed_days
    }

    /// Whole trial days left; `None` unless in trial.
    pub fn trial_days_remaining(&self) -> Option<i64> {
        match (self.state, self.elapsed_days) {
            (LicenseState::InTrial, Some(elapsed)) => {
                Some((self.policy.trial_days - elapsed).max(0))
            }
            _ => None,
        }
    }

    /// Submits the product key.
    ///
    /// Outside `Expired` this is a no-op. A correct key persists the licensed
    /// flag before the state changes.
    ///
    /// # Errors
    /// - [`LicenseError::InvalidSecret`] for a wrong key; state stays `Expired`.
    /// - [`LicenseError::Storage`] when the flag cannot be written; state
    ///   stays `Expired`.
    pub fn submit_unlock_secret<S: KeyValueStore>(
        &mut self,
        kv: &S,
        secret: &str,
        now: DateTime<Utc>,
    ) -> LicenseResult<()> {
        if self.state != LicenseState::Expired {
            return Ok(());
        }

        if secret != self.policy.unlock_secret {
            self.last_rejection = Some(now);
            warn!("event=license_unlock module=license status=rejected");
            return Err(LicenseError::InvalidSecret);
        }

        mark_licensed(kv)?;
        self.state = LicenseState::Licensed;
        self.last_rejection = None;
        info!("event=license_unlock module=license status=ok");
        Ok(())
    }

    /// Whether the wrong-key indicator should be shown at `now`.
    pub fn rejection_visible(&self, now: DateTime<Utc>) -> bool {
        self.last_rejection
            .is_some_and(|at| now < at + Duration::milliseconds(REJECTION_INDICATOR_MS))
    }
}

fn decide(
    flags: &LicenseFlags,
    trial_days: i64,
    now: DateTime<Utc>,
) -> (LicenseState, Option<i64>) {
    if flags.licensed {
        return (LicenseState::Licensed, None);
    }
    match flags.trial_start.as_ref().and_then(TrialStart::instant) {
        Some(start) => {
            let elapsed = elapsed_days(start, now);
            let state = if elapsed > trial_days {
                LicenseState::Expired
            } else {
                LicenseState::InTrial
            };
            (state, Some(elapsed))
        }
        // Unreadable start: fail closed rather than restart the trial.
        None => (LicenseState::Expired, None),
    }
}

/// Whole days between `start` and `now`, rounded up.
///
/// The distance is absolute, so a clock set before the trial start still
/// counts toward the trial.
pub fn elapsed_days(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (now - start).num_milliseconds().abs();
    (ms + DAY_MS - 1) / DAY_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn elapsed_days_rounds_up_partial_days() {
        assert_eq!(elapsed_days(t0(), t0()), 0);
        assert_eq!(elapsed_days(t0(), t0() + Duration::milliseconds(1)), 1);
        assert_eq!(elapsed_days(t0(), t0() + Duration::days(30)), 30);
        assert_eq!(
            elapsed_days(t0(), t0() + Duration::days(30) + Duration::seconds(1)),
            31
        );
        assert_eq!(elapsed_days(t0(), t0() - Duration::hours(5)), 1);
    }

    #[test]
    fn boundary_day_thirty_is_still_in_trial() {
        let flags = LicenseFlags {
            licensed: false,
            trial_start: Some(TrialStart::Stored(t0())),
        };
        let (state, _) = decide(&flags, 30, t0() + Duration::days(30));
        assert_eq!(state, LicenseState::InTrial);

        let (state, _) = decide(&flags, 30, t0() + Duration::days(30) + Duration::minutes(1));
        assert_eq!(state, LicenseState::Expired);
    }

    #[test]
    fn unreadable_start_fails_closed() {
        let flags = LicenseFlags {
            licensed: false,
            trial_start: Some(TrialStart::Unreadable("yesterday".to_string())),
        };
        assert_eq!(decide(&flags, 30, t0()), (LicenseState::Expired, None));
    }
}
