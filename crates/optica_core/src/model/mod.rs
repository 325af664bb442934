//! Domain records for the optics practice.
//!
//! # Responsibility
//! - Define the canonical `Patient` and `Order` shapes shared by the entity
//!   store, the persisted collections and backup files.
//! - Keep the JSON field naming of the legacy data (`camelCase`) so existing
//!   stored collections and backup files remain readable.
//!
//! # Invariants
//! - Every record is identified by a non-blank opaque string id.
//! - `Order::amount` is finite and never negative.
//! - `Order::patient_id` is a weak reference and is never checked.

pub mod order;
pub mod patient;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Patient,
    Order,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Order => "order",
        }
    }
}

/// Rejection reasons for records that are not well-formed.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValidationError {
    BlankId(RecordKind),
    NegativeAmount { order_id: String, amount: f64 },
    NonFiniteAmount { order_id: String },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId(kind) => write!(f, "{} id must not be blank", kind.as_str()),
            Self::NegativeAmount { order_id, amount } => {
                write!(f, "order `{order_id}` has negative amount {amount}")
            }
            Self::NonFiniteAmount { order_id } => {
                write!(f, "order `{order_id}` has a non-finite amount")
            }
        }
    }
}

impl Error for RecordValidationError {}

/// Current instant formatted the way stored timestamps are written
/// (RFC 3339, millisecond precision, `Z` suffix).
pub(crate) fn timestamp_now() -> String {
    format_timestamp(chrono::Utc::now())
}

pub(crate) fn format_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
