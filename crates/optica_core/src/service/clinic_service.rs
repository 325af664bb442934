//! Clinic use-case service.
//!
//! # Responsibility
//! - Expose entity-store operations with synchronous write-through.
//! - Export and import backup snapshots.
//! - Derive dashboard figures and expose the theme preference.
//!
//! # Invariants
//! - Every applied mutation rewrites the whole touched collection before the
//!   in-memory store changes; a failed write leaves the store untouched.
//! - A `NoMatch` mutation performs no write.
//! - Import validates the whole payload, writes both collections in one
//!   storage transaction, then swaps the store. Any failure leaves memory and
//!   storage as they were.

use super::dashboard::{summarize, DashboardSummary};
use super::preferences::ThemePreference;
use super::ServiceResult;
use crate::backup::{self, BackupFormatError, Snapshot, SnapshotSummary};
use crate::license::LicenseGate;
use crate::model::order::{Order, OrderStatus};
use crate::model::patient::Patient;
use crate::persist::{PersistenceGateway, RehydrateReport, Rehydrated};
use crate::repo::kv_repo::KeyValueStore;
use crate::store::{EntityStore, MutationOutcome, PatientRef, StoreResult};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Patients,
    Orders,
}

impl Collection {
    fn as_str(self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Orders => "orders",
        }
    }
}

/// Session facade over the entity store and its persistence gateway.
///
/// Only constructed by [`super::startup`] once the license gate admits the
/// session.
pub struct ClinicService<S: KeyValueStore> {
    store: EntityStore,
    gateway: PersistenceGateway<S>,
    report: RehydrateReport,
    license: LicenseGate,
}

impl<S: KeyValueStore> ClinicService<S> {
    pub(crate) fn open(kv: S, license: LicenseGate) -> ServiceResult<Self> {
        let gateway = PersistenceGateway::new(kv);
        let Rehydrated { store, report } = gateway.rehydrate()?;
        Ok(Self {
            store,
            gateway,
            report,
            license,
        })
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Diagnostics from startup rehydration.
    pub fn rehydrate_report(&self) -> &RehydrateReport {
        &self.report
    }

    pub fn license(&self) -> &LicenseGate {
        &self.license
    }

    pub fn add_patient(&mut self, patient: Patient) -> ServiceResult<()> {
        self.mutate(Collection::Patients, "add_patient", |store| {
            store.add_patient(patient).map(|()| MutationOutcome::Applied)
        })
        .map(|_| ())
    }

    pub fn update_patient(&mut self, patient: Patient) -> ServiceResult<MutationOutcome> {
        self.mutate(Collection::Patients, "update_patient", |store| {
            store.update_patient(patient)
        })
    }

    /// Removes a patient. Orders referencing it are left in place.
    pub fn delete_patient(&mut self, id: &str) -> ServiceResult<MutationOutcome> {
        self.mutate(Collection::Patients, "delete_patient", |store| {
            Ok(store.delete_patient(id))
        })
    }

    pub fn create_order(&mut self, order: Order) -> ServiceResult<()> {
        self.mutate(Collection::Orders, "create_order", |store| {
            store.create_order(order).map(|()| MutationOutcome::Applied)
        })
        .map(|_| ())
    }

    pub fn update_order(&mut self, order: Order) -> ServiceResult<MutationOutcome> {
        self.mutate(Collection::Orders, "update_order", |store| {
            store.update_order(order)
        })
    }

    pub fn delete_order(&mut self, id: &str) -> ServiceResult<MutationOutcome> {
        self.mutate(Collection::Orders, "delete_order", |store| {
            Ok(store.delete_order(id))
        })
    }

    pub fn update_order_status(
        &mut self,
        order_id: &str,
        status: OrderStatus,
    ) -> ServiceResult<MutationOutcome> {
        self.mutate(Collection::Orders, "update_order_status", |store| {
            Ok(store.update_order_status(order_id, status))
        })
    }

    pub fn search_patients(&self, term: &str) -> Vec<&Patient> {
        self.store.search_patients(term)
    }

    pub fn orders_for_patient(&self, patient_id: &str) -> Vec<&Order> {
        self.store.orders_for_patient(patient_id)
    }

    pub fn patient_for_order(&self, order: &Order) -> PatientRef<'_> {
        self.store.patient_for_order(order)
    }

    pub fn export_backup(&self, now: DateTime<Utc>) -> Snapshot {
        let snapshot = backup::export(&self.store, now);
        info!(
            "event=backup_export module=service status=ok patients={} orders={}",
            snapshot.patients.len(),
            snapshot.orders.len()
        );
        snapshot
    }

    /// Pretty-printed backup document.
    pub fn export_backup_json(&self, now: DateTime<Utc>) -> ServiceResult<String> {
        Ok(self.export_backup(now).to_json()?)
    }

    /// Validates a backup without touching any state.
    pub fn preview_import(&self, raw: &str) -> Result<SnapshotSummary, BackupFormatError> {
        backup::import(raw).map(|snapshot| snapshot.summary())
    }

    /// Replaces both collections with the contents of a backup.
    ///
    /// # Errors
    /// - [`super::ServiceError::Backup`] when the payload is rejected.
    /// - [`super::ServiceError::Storage`] when the combined write fails.
    pub fn import_backup(&mut self, raw: &str) -> ServiceResult<SnapshotSummary> {
        let snapshot = backup::import(raw).inspect_err(|err| {
            warn!("event=backup_import module=service status=rejected error={err}");
        })?;
        let summary = snapshot.summary();

        self.gateway
            .write_all(&snapshot.patients, &snapshot.orders)?;
        self.store.replace_all(snapshot.patients, snapshot.orders);

        info!(
            "event=backup_import module=service status=accepted version={} patients={} orders={}",
            summary.version, summary.patient_count, summary.order_count
        );
        Ok(summary)
    }

    pub fn dashboard(&self) -> DashboardSummary {
        summarize(&self.store)
    }

    pub fn theme(&self) -> ServiceResult<ThemePreference> {
        Ok(ThemePreference::load(self.gateway.storage())?)
    }

    pub fn set_theme(&self, theme: ThemePreference) -> ServiceResult<()> {
        Ok(theme.store(self.gateway.storage())?)
    }

    /// Applies `op` to a staged copy, persists the touched collection, then
    /// commits the copy.
    fn mutate<F>(
        &mut self,
        collection: Collection,
        operation: &'static str,
        op: F,
    ) -> ServiceResult<MutationOutcome>
    where
        F: FnOnce(&mut EntityStore) -> StoreResult<MutationOutcome>,
    {
        let mut staged = self.store.clone();
        let outcome = op(&mut staged).inspect_err(|err| {
            warn!("event={operation} module=service status=invalid error={err}");
        })?;

        if !outcome.is_applied() {
            debug!(
                "event={operation} module=service status=no_match collection={}",
                collection.as_str()
            );
            return Ok(outcome);
        }

        match collection {
            Collection::Patients => self.gateway.write_patients(staged.patients())?,
            Collection::Orders => self.gateway.write_orders(staged.orders())?,
        }
        self.store = staged;
        Ok(outcome)
    }
}
