//! Sales order record and its status lifecycle.

use super::{timestamp_now, RecordKind, RecordValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Item description used when an order is created without one.
pub const DEFAULT_ORDER_ITEMS: &str = "Gafas Graduadas";

/// Order lifecycle state.
///
/// Serialized with the labels stored by earlier releases; English variant
/// names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Pendiente", alias = "Pending")]
    Pending,
    #[serde(rename = "En Proceso", alias = "InProgress")]
    InProgress,
    #[serde(rename = "Listo para Retiro", alias = "Ready")]
    Ready,
    #[serde(rename = "Entregado", alias = "Delivered")]
    Delivered,
    #[serde(rename = "Cancelado", alias = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::InProgress,
        Self::Ready,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Stored/display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::InProgress => "En Proceso",
            Self::Ready => "Listo para Retiro",
            Self::Delivered => "Entregado",
            Self::Cancelled => "Cancelado",
        }
    }

    /// Parses either the stored label or the English variant name
    /// (case-insensitive, `_`/`-`/space tolerant).
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if let Some(status) = Self::ALL.into_iter().find(|s| s.label() == trimmed) {
            return Some(status);
        }
        let folded: String = trimmed
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "pending" => Some(Self::Pending),
            "inprogress" => Some(Self::InProgress),
            "ready" => Some(Self::Ready),
            "delivered" => Some(Self::Delivered),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether the order still needs work (not delivered, not cancelled).
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Weak reference to `Patient::id`; may point at a deleted patient.
    pub patient_id: String,
    #[serde(default)]
    pub date: String,
    pub amount: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub items: String,
}

impl Order {
    /// Creates a pending, unpaid order dated now with a generated id.
    ///
    /// Blank `items` fall back to [`DEFAULT_ORDER_ITEMS`].
    pub fn new(patient_id: impl Into<String>, items: impl Into<String>, amount: f64) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), patient_id, items, amount)
    }

    pub fn with_id(
        id: impl Into<String>,
        patient_id: impl Into<String>,
        items: impl Into<String>,
        amount: f64,
    ) -> Self {
        let items = items.into();
        Self {
            id: id.into(),
            patient_id: patient_id.into(),
            date: timestamp_now(),
            amount,
            status: OrderStatus::Pending,
            is_paid: false,
            items: if items.trim().is_empty() {
                DEFAULT_ORDER_ITEMS.to_string()
            } else {
                items
            },
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.id.trim().is_empty() {
            return Err(RecordValidationError::BlankId(RecordKind::Order));
        }
        if !self.amount.is_finite() {
            return Err(RecordValidationError::NonFiniteAmount {
                order_id: self.id.clone(),
            });
        }
        if self.amount < 0.0 {
            return Err(RecordValidationError::NegativeAmount {
                order_id: self.id.clone(),
                amount: self.amount,
            });
        }
        Ok(())
    }
}
