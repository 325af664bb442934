//! Persisted licensing flags.
//!
//! # Invariants
//! - The trial start is written at most once per installation and never
//!   rewritten, even when the stored value cannot be parsed.
//! - The licensed flag only ever moves from absent to `"true"`.

use crate::model::format_timestamp;
use crate::persist::keys::{LICENSE_ACTIVE_KEY, TRIAL_START_KEY};
use crate::repo::kv_repo::{KeyValueStore, StorageResult};
use chrono::{DateTime, Utc};
use log::{info, warn};

const LICENSED_VALUE: &str = "true";

/// Trial start as found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialStart {
    /// Written by this boot because the key was absent.
    Initialized(DateTime<Utc>),
    Stored(DateTime<Utc>),
    /// Present but not an ISO-8601 timestamp; lossy text of the stored bytes.
    Unreadable(String),
}

impl TrialStart {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Initialized(at) | Self::Stored(at) => Some(*at),
            Self::Unreadable(_) => None,
        }
    }
}

/// Snapshot of the licensing keys taken at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseFlags {
    pub licensed: bool,
    pub trial_start: Option<TrialStart>,
}

impl LicenseFlags {
    /// Reads the flags; when not licensed, makes sure a trial start exists.
    pub fn load_or_initialize<S: KeyValueStore>(
        kv: &S,
        now: DateTime<Utc>,
    ) -> StorageResult<Self> {
        if is_licensed(kv)? {
            return Ok(Self {
                licensed: true,
                trial_start: None,
            });
        }

        let trial_start = match kv.get_bytes(TRIAL_START_KEY)? {
            Some(raw) => match parse_trial_start(&raw) {
                Some(at) => TrialStart::Stored(at),
                None => {
                    warn!(
                        "event=trial_start_read module=license status=error bytes={}",
                        raw.len()
                    );
                    TrialStart::Unreadable(String::from_utf8_lossy(&raw).into_owned())
                }
            },
            None => {
                kv.put(TRIAL_START_KEY, &format_timestamp(now))?;
                info!("event=trial_start_init module=license status=ok");
                TrialStart::Initialized(now)
            }
        };

        Ok(Self {
            licensed: false,
            trial_start: Some(trial_start),
        })
    }
}

fn parse_trial_start(raw: &[u8]) -> Option<DateTime<Utc>> {
    let text = std::str::from_utf8(raw).ok()?;
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

pub fn is_licensed<S: KeyValueStore>(kv: &S) -> StorageResult<bool> {
    Ok(kv.get_bytes(LICENSE_ACTIVE_KEY)?.as_deref() == Some(LICENSED_VALUE.as_bytes()))
}

pub fn mark_licensed<S: KeyValueStore>(kv: &S) -> StorageResult<()> {
    kv.put(LICENSE_ACTIVE_KEY, LICENSED_VALUE)
}
