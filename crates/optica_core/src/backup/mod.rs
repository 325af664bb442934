//! Backup codec: portable, versioned snapshots of the whole dataset.
//!
//! # Responsibility
//! - Produce a full point-in-time [`Snapshot`] of the entity store.
//! - Decode and validate backup files before anything is replaced.
//!
//! # Invariants
//! - Export is a pure read; the store is never touched.
//! - Import validates the complete payload first and returns a tagged result;
//!   callers commit only an `Ok(Snapshot)`, so a rejected file changes nothing.
//! - A snapshot replaces the current state; it is never merged.
//! - `import(&to_json(&export(store)))` yields collections equal to `store`.

use crate::model::order::Order;
use crate::model::patient::Patient;
use crate::model::{format_timestamp, RecordValidationError};
use crate::store::EntityStore;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Format version written into every exported snapshot.
pub const BACKUP_FORMAT_VERSION: &str = "1.0";

const BACKUP_FILE_PREFIX: &str = "optica_backup_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub timestamp: String,
    pub patients: Vec<Patient>,
    pub orders: Vec<Order>,
}

impl Snapshot {
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            version: self.version.clone(),
            timestamp: self.timestamp.clone(),
            patient_count: self.patients.len(),
            order_count: self.orders.len(),
        }
    }

    /// Pretty-printed JSON, as written to backup files.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Counts shown to the user before a restore is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub version: String,
    pub timestamp: String,
    pub patient_count: usize,
    pub order_count: usize,
}

/// Collection names inside a backup file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Patients,
    Orders,
}

impl Collection {
    pub fn field(self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Orders => "orders",
        }
    }
}

/// Reasons a backup payload is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum BackupFormatError {
    InvalidJson(String),
    NotAnObject,
    MissingCollection(Collection),
    CollectionNotArray(Collection),
    InvalidRecord {
        collection: Collection,
        index: usize,
        message: String,
    },
    RejectedRecord {
        collection: Collection,
        index: usize,
        source: RecordValidationError,
    },
}

impl Display for BackupFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(message) => write!(f, "backup is not valid JSON: {message}"),
            Self::NotAnObject => write!(f, "backup root must be a JSON object"),
            Self::MissingCollection(collection) => {
                write!(f, "backup is missing the `{}` array", collection.field())
            }
            Self::CollectionNotArray(collection) => {
                write!(f, "backup field `{}` must be an array", collection.field())
            }
            Self::InvalidRecord {
                collection,
                index,
                message,
            } => write!(
                f,
                "backup `{}[{index}]` is malformed: {message}",
                collection.field()
            ),
            Self::RejectedRecord {
                collection,
                index,
                source,
            } => write!(
                f,
                "backup `{}[{index}]` is invalid: {source}",
                collection.field()
            ),
        }
    }
}

impl Error for BackupFormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RejectedRecord { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Captures the store as a snapshot stamped with `now`.
pub fn export(store: &EntityStore, now: DateTime<Utc>) -> Snapshot {
    Snapshot {
        version: BACKUP_FORMAT_VERSION.to_string(),
        timestamp: format_timestamp(now),
        patients: store.patients().to_vec(),
        orders: store.orders().to_vec(),
    }
}

/// Decodes and validates a backup payload.
///
/// Only `patients` and `orders` are required; `version` and `timestamp`
/// default to empty strings and unknown top-level fields are ignored.
///
/// # Errors
/// - Payload is not a JSON object, or either collection is missing or not
///   an array.
/// - Any element fails to decode: patients need `id` and `name`; orders need
///   `id`, `patientId`, `amount` and `status`. One bad element rejects the
///   whole backup.
/// - Any record fails validation (blank id, negative or non-finite amount).
pub fn import(raw: &str) -> Result<Snapshot, BackupFormatError> {
    let root: Value = serde_json::from_str(raw.trim_start_matches('\u{feff}'))
        .map_err(|err| BackupFormatError::InvalidJson(err.to_string()))?;
    let Value::Object(root) = root else {
        return Err(BackupFormatError::NotAnObject);
    };

    let patient_values = collection_array(&root, Collection::Patients)?;
    let order_values = collection_array(&root, Collection::Orders)?;

    let patients = decode_records(patient_values, Collection::Patients, Patient::validate)?;
    let orders = decode_records(order_values, Collection::Orders, Order::validate)?;

    Ok(Snapshot {
        version: string_field(&root, "version"),
        timestamp: string_field(&root, "timestamp"),
        patients,
        orders,
    })
}

/// File name for a backup exported on `date`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("{BACKUP_FILE_PREFIX}{}.json", date.format("%Y-%m-%d"))
}

fn collection_array(
    root: &Map<String, Value>,
    collection: Collection,
) -> Result<&Vec<Value>, BackupFormatError> {
    match root.get(collection.field()) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(BackupFormatError::CollectionNotArray(collection)),
        None => Err(BackupFormatError::MissingCollection(collection)),
    }
}

fn decode_records<T, V>(
    values: &[Value],
    collection: Collection,
    validate: V,
) -> Result<Vec<T>, BackupFormatError>
where
    T: for<'de> Deserialize<'de>,
    V: Fn(&T) -> Result<(), RecordValidationError>,
{
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let record = T::deserialize(value).map_err(|err| BackupFormatError::InvalidRecord {
                collection,
                index,
                message: err.to_string(),
            })?;
            validate(&record).map_err(|source| BackupFormatError::RejectedRecord {
                collection,
                index,
                source,
            })?;
            Ok(record)
        })
        .collect()
}

fn string_field(root: &Map<String, Value>, field: &str) -> String {
    root.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
