//! Core domain logic for the optics clinic.
//! This crate is the single source of truth for business invariants.

pub mod backup;
pub mod config;
pub mod db;
pub mod drafting;
pub mod license;
pub mod logging;
pub mod model;
pub mod persist;
pub mod repo;
pub mod service;
pub mod store;

pub use backup::{BackupFormatError, Snapshot, SnapshotSummary, BACKUP_FORMAT_VERSION};
pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use drafting::{DraftError, DraftRequest, MessageDrafter, OfflineDrafter, Tone};
pub use license::{LicenseError, LicenseGate, LicenseState, TrialPolicy};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::order::{Order, OrderStatus};
pub use model::patient::{EyePrescription, Patient, Prescription};
pub use model::RecordValidationError;
pub use persist::{CollectionLoad, PersistenceGateway, RehydrateReport};
pub use repo::kv_repo::{KeyValueStore, SqliteKeyValueStore, StorageError, StorageResult};
pub use service::{
    boot, ClinicService, DashboardSummary, LockScreen, ServiceError, ServiceResult, Startup,
    ThemePreference,
};
pub use store::{EntityStore, MutationOutcome, PatientRef};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
