//! Boundary to the message-drafting collaborator.
//!
//! # Responsibility
//! - Describe a drafting request (patient name, context, tone).
//! - Guarantee callers always get text back: any drafter failure turns into
//!   a deterministic fallback that embeds the name and context verbatim.
//! - Build the WhatsApp deep link used to send the drafted message.
//!
//! # Invariants
//! - [`draft_or_fallback`] never returns an error and never panics.

pub mod prompts;
#[cfg(feature = "remote-drafting")]
pub mod remote;

use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const BUSINESS_NAME: &str = "Optica Maxima G.E";

/// Returned when the drafter answers with no text.
pub const EMPTY_DRAFT_TEXT: &str = "No se pudo generar el mensaje.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    Formal,
    #[default]
    Friendly,
}

impl Tone {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "formal" => Some(Self::Formal),
            "friendly" => Some(Self::Friendly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRequest {
    pub patient_name: String,
    pub context: String,
    pub tone: Tone,
}

impl DraftRequest {
    pub fn new(patient_name: impl Into<String>, context: impl Into<String>, tone: Tone) -> Self {
        Self {
            patient_name: patient_name.into(),
            context: context.into(),
            tone,
        }
    }
}

#[derive(Debug)]
pub enum DraftError {
    Network(String),
    Auth(String),
    Quota(String),
    InvalidResponse(String),
    /// No drafter is configured for this build.
    Unavailable,
}

impl Display for DraftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(message) => write!(f, "drafting service unreachable: {message}"),
            Self::Auth(message) => write!(f, "drafting service rejected credentials: {message}"),
            Self::Quota(message) => write!(f, "drafting service quota exhausted: {message}"),
            Self::InvalidResponse(message) => {
                write!(f, "drafting service returned an unusable response: {message}")
            }
            Self::Unavailable => write!(f, "no drafting service configured"),
        }
    }
}

impl Error for DraftError {}

/// External service producing a short patient message.
pub trait MessageDrafter {
    /// Returns the drafted text; an empty string means "nothing generated".
    fn draft(&self, request: &DraftRequest) -> Result<String, DraftError>;
}

/// Drafter used when no service is configured; always unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineDrafter;

impl MessageDrafter for OfflineDrafter {
    fn draft(&self, _request: &DraftRequest) -> Result<String, DraftError> {
        Err(DraftError::Unavailable)
    }
}

/// Drafts a message, degrading to [`fallback_message`] on any failure.
pub fn draft_or_fallback<D: MessageDrafter + ?Sized>(drafter: &D, request: &DraftRequest) -> String {
    match drafter.draft(request) {
        Ok(text) if text.trim().is_empty() => EMPTY_DRAFT_TEXT.to_string(),
        Ok(text) => {
            info!("event=draft_message module=drafting status=ok chars={}", text.chars().count());
            text
        }
        Err(err) => {
            warn!("event=draft_message module=drafting status=fallback error={err}");
            fallback_message(&request.patient_name, &request.context)
        }
    }
}

/// Deterministic text used when drafting fails.
pub fn fallback_message(patient_name: &str, context: &str) -> String {
    format!("Hola {patient_name}, te escribimos de {BUSINESS_NAME} para informarte sobre: {context}")
}

/// Starter text offered before anything is drafted.
pub fn greeting_template(patient_name: &str) -> String {
    format!("Hola {patient_name}, soy de {BUSINESS_NAME}. Te contactamos para...")
}

/// `https://wa.me` link that opens a chat with `phone` prefilled with `message`.
pub fn whatsapp_link(phone: &str, message: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    format!("https://wa.me/{digits}?text={}", urlencoding::encode(message))
}
