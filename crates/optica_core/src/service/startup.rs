//! Startup sequence: the license gate runs before any clinic data is read.
//!
//! # Invariants
//! - Rehydration only happens for sessions the gate admits.
//! - A locked session exposes nothing but secret submission.

use super::clinic_service::ClinicService;
use super::ServiceResult;
use crate::license::{LicenseGate, LicenseResult, LicenseState, TrialPolicy};
use crate::repo::kv_repo::KeyValueStore;
use chrono::{DateTime, Utc};

/// Result of booting a session.
pub enum Startup<S: KeyValueStore> {
    Unlocked(ClinicService<S>),
    Locked(LockScreen<S>),
}

impl<S: KeyValueStore> Startup<S> {
    pub fn license_state(&self) -> LicenseState {
        match self {
            Self::Unlocked(service) => service.license().state(),
            Self::Locked(lock) => lock.gate.state(),
        }
    }
}

/// Evaluates the license gate and, when admitted, rehydrates the store.
///
/// # Side effects
/// - Persists the trial start on first boot.
pub fn boot<S: KeyValueStore>(
    kv: S,
    policy: TrialPolicy,
    now: DateTime<Utc>,
) -> ServiceResult<Startup<S>> {
    let gate = LicenseGate::evaluate(&kv, policy, now)?;
    admit(kv, gate)
}

fn admit<S: KeyValueStore>(kv: S, gate: LicenseGate) -> ServiceResult<Startup<S>> {
    if gate.allows_access() {
        Ok(Startup::Unlocked(ClinicService::open(kv, gate)?))
    } else {
        Ok(Startup::Locked(LockScreen { kv, gate }))
    }
}

/// Session held behind an expired trial.
pub struct LockScreen<S: KeyValueStore> {
    kv: S,
    gate: LicenseGate,
}

impl<S: KeyValueStore> LockScreen<S> {
    pub fn gate(&self) -> &LicenseGate {
        &self.gate
    }

    /// Submits the product key; see [`LicenseGate::submit_unlock_secret`].
    pub fn submit_secret(&mut self, secret: &str, now: DateTime<Utc>) -> LicenseResult<()> {
        self.gate.submit_unlock_secret(&self.kv, secret, now)
    }

    pub fn rejection_visible(&self, now: DateTime<Utc>) -> bool {
        self.gate.rejection_visible(now)
    }

    /// Leaves the lock screen. Returns `Locked(self)` while still expired.
    pub fn enter(self) -> ServiceResult<Startup<S>> {
        admit(self.kv, self.gate)
    }
}
