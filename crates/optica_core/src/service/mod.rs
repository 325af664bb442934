//! Core use-case services.
//!
//! # Responsibility
//! - Sequence startup: license gate first, then rehydration.
//! - Wrap every entity-store mutation with write-through persistence.
//! - Keep the CLI decoupled from storage details.
//!
//! # Invariants
//! - A [`ClinicService`] only exists for a session the license gate admits.
//! - In-memory state changes only after the matching storage write succeeds.

pub mod clinic_service;
pub mod dashboard;
pub mod preferences;
pub mod startup;

pub use clinic_service::ClinicService;
pub use dashboard::{DashboardSummary, RecentOrder, RevenuePoint};
pub use preferences::ThemePreference;
pub use startup::{boot, LockScreen, Startup};

use crate::backup::BackupFormatError;
use crate::license::LicenseError;
use crate::model::RecordValidationError;
use crate::repo::kv_repo::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level error for clinic use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Record rejected before any state changed.
    Validation(RecordValidationError),
    /// Durable write or read failed; in-memory state is unchanged.
    Storage(StorageError),
    /// Backup payload rejected; store and storage are unchanged.
    Backup(BackupFormatError),
    License(LicenseError),
    Serialization(serde_json::Error),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Backup(err) => write!(f, "backup rejected: {err}"),
            Self::License(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "serialization failed: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Backup(err) => Some(err),
            Self::License(err) => Some(err),
            Self::Serialization(err) => Some(err),
        }
    }
}

impl From<RecordValidationError> for ServiceError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for ServiceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<BackupFormatError> for ServiceError {
    fn from(value: BackupFormatError) -> Self {
        Self::Backup(value)
    }
}

impl From<LicenseError> for ServiceError {
    fn from(value: LicenseError) -> Self {
        Self::License(value)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}
