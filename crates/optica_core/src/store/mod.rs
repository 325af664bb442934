//! In-memory entity store for patients and orders.
//!
//! # Responsibility
//! - Hold the authoritative patient and order collections for a session.
//! - Provide total mutation operations keyed on record id.
//!
//! # Invariants
//! - Update and delete with an unknown id change nothing and report
//!   [`MutationOutcome::NoMatch`]; they never fail.
//! - Deleting a patient never touches orders, even orders pointing at it.
//! - Ill-formed records (blank id, negative amount) are rejected before the
//!   collection is touched.
//! - Insertion order is preserved; the store does not check id collisions.

use crate::model::order::{Order, OrderStatus};
use crate::model::patient::Patient;
use crate::model::RecordValidationError;

pub type StoreResult<T> = Result<T, RecordValidationError>;

/// Whether a keyed mutation found its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    NoMatch,
}

impl MutationOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }

    fn from_hit(hit: bool) -> Self {
        if hit {
            Self::Applied
        } else {
            Self::NoMatch
        }
    }
}

/// Read-time resolution of an order's weak patient reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatientRef<'a> {
    Known(&'a Patient),
    Unknown,
}

impl<'a> PatientRef<'a> {
    /// Display name, or `fallback` for an orphaned order.
    pub fn name_or(self, fallback: &'a str) -> &'a str {
        match self {
            Self::Known(patient) => patient.name.as_str(),
            Self::Unknown => fallback,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    patients: Vec<Patient>,
    orders: Vec<Order>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from already-loaded collections without validation.
    pub fn from_parts(patients: Vec<Patient>, orders: Vec<Order>) -> Self {
        Self { patients, orders }
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn patient(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn add_patient(&mut self, patient: Patient) -> StoreResult<()> {
        patient.validate()?;
        self.patients.push(patient);
        Ok(())
    }

    /// Replaces every patient whose id matches `patient.id`.
    pub fn update_patient(&mut self, patient: Patient) -> StoreResult<MutationOutcome> {
        patient.validate()?;
        let mut hit = false;
        for slot in self.patients.iter_mut().filter(|p| p.id == patient.id) {
            *slot = patient.clone();
            hit = true;
        }
        Ok(MutationOutcome::from_hit(hit))
    }

    pub fn delete_patient(&mut self, id: &str) -> MutationOutcome {
        let before = self.patients.len();
        self.patients.retain(|p| p.id != id);
        MutationOutcome::from_hit(self.patients.len() != before)
    }

    pub fn create_order(&mut self, order: Order) -> StoreResult<()> {
        order.validate()?;
        self.orders.push(order);
        Ok(())
    }

    /// Replaces every order whose id matches `order.id`.
    pub fn update_order(&mut self, order: Order) -> StoreResult<MutationOutcome> {
        order.validate()?;
        let mut hit = false;
        for slot in self.orders.iter_mut().filter(|o| o.id == order.id) {
            *slot = order.clone();
            hit = true;
        }
        Ok(MutationOutcome::from_hit(hit))
    }

    pub fn delete_order(&mut self, id: &str) -> MutationOutcome {
        let before = self.orders.len();
        self.orders.retain(|o| o.id != id);
        MutationOutcome::from_hit(self.orders.len() != before)
    }

    /// Sets only `status` on the matching order; every other field is kept.
    pub fn update_order_status(&mut self, order_id: &str, status: OrderStatus) -> MutationOutcome {
        let mut hit = false;
        for order in self.orders.iter_mut().filter(|o| o.id == order_id) {
            order.status = status;
            hit = true;
        }
        MutationOutcome::from_hit(hit)
    }

    /// Swaps both collections at once.
    pub fn replace_all(&mut self, patients: Vec<Patient>, orders: Vec<Order>) {
        self.patients = patients;
        self.orders = orders;
    }

    pub fn patient_for_order(&self, order: &Order) -> PatientRef<'_> {
        match self.patient(&order.patient_id) {
            Some(patient) => PatientRef::Known(patient),
            None => PatientRef::Unknown,
        }
    }

    pub fn orders_for_patient(&self, patient_id: &str) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| o.patient_id == patient_id)
            .collect()
    }

    /// Orders whose patient reference no longer resolves.
    pub fn orphaned_orders(&self) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| self.patient(&o.patient_id).is_none())
            .collect()
    }

    pub fn search_patients(&self, term: &str) -> Vec<&Patient> {
        self.patients
            .iter()
            .filter(|p| p.matches_search(term))
            .collect()
    }
}
