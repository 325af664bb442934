//! Patient record and eye prescription.

use super::{timestamp_now, RecordKind, RecordValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Refraction values for one eye.
///
/// Values stay as strings so `"+1.25"` or `"-0.50"` keep the exact
/// formatting the optometrist typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyePrescription {
    pub sph: String,
    pub cyl: String,
    pub axis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<String>,
}

impl Default for EyePrescription {
    fn default() -> Self {
        Self {
            sph: "0.00".to_string(),
            cyl: "0.00".to_string(),
            axis: "0".to_string(),
            add: None,
        }
    }
}

/// Prescription for both eyes: `od` (right) and `oi` (left).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub od: EyePrescription,
    pub oi: EyePrescription,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub registration_date: String,
    #[serde(default)]
    pub prescription: Prescription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Patient {
    /// Creates a patient with a generated id, a zeroed prescription and the
    /// current registration timestamp.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, phone)
    }

    /// Creates a patient with a caller-provided id.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: phone.into(),
            email: None,
            address: None,
            description: None,
            registration_date: timestamp_now(),
            prescription: Prescription::default(),
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.id.trim().is_empty() {
            return Err(RecordValidationError::BlankId(RecordKind::Patient));
        }
        Ok(())
    }

    /// Case-insensitive name match or plain phone substring match.
    ///
    /// A blank term matches every patient.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term.to_lowercase()) || self.phone.contains(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_patient_has_uuid_and_zeroed_prescription() {
        let patient = Patient::new("Ana", "555");
        assert_eq!(patient.id.len(), 36);
        assert_eq!(patient.prescription.od.sph, "0.00");
        assert_eq!(patient.prescription.oi.axis, "0");
        assert!(patient.prescription.od.add.is_none());
        assert!(patient.registration_date.ends_with('Z'));
    }

    #[test]
    fn blank_id_is_rejected() {
        let patient = Patient::with_id("  ", "Ana", "555");
        assert_eq!(
            patient.validate(),
            Err(RecordValidationError::BlankId(RecordKind::Patient))
        );
    }

    #[test]
    fn search_matches_name_case_insensitively_and_phone_verbatim() {
        let patient = Patient::with_id("p1", "Ana María", "+240 555 123");
        assert!(patient.matches_search("ana"));
        assert!(patient.matches_search("MARÍA"));
        assert!(patient.matches_search("555"));
        assert!(patient.matches_search("   "));
        assert!(!patient.matches_search("Luis"));
    }

    #[test]
    fn serializes_with_legacy_field_names() {
        let mut patient = Patient::with_id("p1", "Ana", "555");
        patient.prescription.od.add = Some("+2.00".to_string());
        let json = serde_json::to_value(&patient).unwrap();

        assert!(json.get("registrationDate").is_some());
        assert_eq!(json["prescription"]["od"]["add"], "+2.00");
        assert!(json["prescription"]["oi"].get("add").is_none());
        assert!(json.get("email").is_none());
    }

    #[test]
    fn missing_optional_fields_deserialize_to_defaults() {
        let patient: Patient = serde_json::from_str(r#"{"id":"p9","name":"Luis"}"#).unwrap();
        assert_eq!(patient.phone, "");
        assert_eq!(patient.prescription, Prescription::default());
        assert!(patient.notes.is_none());
    }
}
