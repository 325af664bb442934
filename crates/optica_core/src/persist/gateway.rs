//! Persistence gateway between the entity store and key-value storage.

use super::keys::{unreadable_key, ORDERS_KEY, PATIENTS_KEY};
use crate::model::order::Order;
use crate::model::patient::Patient;
use crate::repo::kv_repo::{KeyValueStore, StorageError, StorageResult};
use crate::store::EntityStore;
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Outcome of loading one collection at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionLoad {
    /// Key absent; collection starts empty.
    Missing,
    Loaded { count: usize },
    /// Stored bytes could not be decoded, whether as UTF-8 or as JSON. They
    /// are kept here and copied verbatim to `quarantine_key`.
    Unreadable {
        raw: Vec<u8>,
        reason: String,
        quarantine_key: String,
    },
}

impl CollectionLoad {
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::Unreadable { .. })
    }
}

/// Per-collection diagnostics produced by [`PersistenceGateway::rehydrate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RehydrateReport {
    pub patients: CollectionLoad,
    pub orders: CollectionLoad,
}

impl RehydrateReport {
    pub fn has_storage_read_errors(&self) -> bool {
        self.patients.is_unreadable() || self.orders.is_unreadable()
    }
}

pub struct Rehydrated {
    pub store: EntityStore,
    pub report: RehydrateReport,
}

pub struct PersistenceGateway<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn storage(&self) -> &S {
        &self.kv
    }

    /// Loads both collections.
    ///
    /// # Errors
    /// - Only backend transport failures; undecodable values are recovered.
    pub fn rehydrate(&self) -> StorageResult<Rehydrated> {
        let (patients, patients_load) = self.load_collection::<Patient>(PATIENTS_KEY)?;
        let (orders, orders_load) = self.load_collection::<Order>(ORDERS_KEY)?;
        let report = RehydrateReport {
            patients: patients_load,
            orders: orders_load,
        };
        info!(
            "event=rehydrate module=persist status={} patients={} orders={}",
            if report.has_storage_read_errors() {
                "degraded"
            } else {
                "ok"
            },
            patients.len(),
            orders.len()
        );
        Ok(Rehydrated {
            store: EntityStore::from_parts(patients, orders),
            report,
        })
    }

    pub fn write_patients(&self, patients: &[Patient]) -> StorageResult<()> {
        self.write_collection(PATIENTS_KEY, patients)
    }

    pub fn write_orders(&self, orders: &[Order]) -> StorageResult<()> {
        self.write_collection(ORDERS_KEY, orders)
    }

    /// Writes both collections in one storage transaction.
    pub fn write_all(&self, patients: &[Patient], orders: &[Order]) -> StorageResult<()> {
        let patients_json = encode(patients);
        let orders_json = encode(orders);
        self.kv
            .put_many(&[
                (PATIENTS_KEY, patients_json.as_str()),
                (ORDERS_KEY, orders_json.as_str()),
            ])
            .inspect_err(|err| {
                error!("event=write_through module=persist status=error key=all error={err}");
            })?;
        info!(
            "event=write_through module=persist status=ok key=all patients={} orders={}",
            patients.len(),
            orders.len()
        );
        Ok(())
    }

    fn write_collection<T: Serialize>(&self, key: &str, items: &[T]) -> StorageResult<()> {
        let json = encode(items);
        match self.kv.put(key, &json) {
            Ok(()) => {
                info!(
                    "event=write_through module=persist status=ok key={key} count={}",
                    items.len()
                );
                Ok(())
            }
            Err(err) => {
                error!("event=write_through module=persist status=error key={key} error={err}");
                Err(err)
            }
        }
    }

    fn load_collection<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> StorageResult<(Vec<T>, CollectionLoad)> {
        let Some(raw) = self.kv.get_bytes(key)? else {
            return Ok((Vec::new(), CollectionLoad::Missing));
        };

        match serde_json::from_slice::<Vec<T>>(&raw) {
            Ok(items) => {
                let count = items.len();
                Ok((items, CollectionLoad::Loaded { count }))
            }
            Err(err) => {
                let quarantine_key = unreadable_key(key);
                warn!(
                    "event=storage_read_error module=persist status=recovered key={key} bytes={} quarantine_key={quarantine_key} error={err}",
                    raw.len()
                );
                self.quarantine(&quarantine_key, &raw)?;
                Ok((
                    Vec::new(),
                    CollectionLoad::Unreadable {
                        raw,
                        reason: err.to_string(),
                        quarantine_key,
                    },
                ))
            }
        }
    }

    fn quarantine(&self, quarantine_key: &str, raw: &[u8]) -> Result<(), StorageError> {
        self.kv.put_bytes(quarantine_key, raw)
    }
}

/// Serializes a collection of plain records.
///
/// Records only hold strings, numbers, booleans and unit enums, so
/// `serde_json` cannot fail on them; a failure would be a programming error
/// and degrades to an empty array rather than a panic.
fn encode<T: Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_else(|err| {
        error!("event=encode module=persist status=error error={err}");
        "[]".to_string()
    })
}
