//! HTTP drafter backed by the Gemini `generateContent` endpoint.
//!
//! Compiled only with the `remote-drafting` feature.

use super::prompts::make_message_prompt;
use super::{DraftError, DraftRequest, MessageDrafter};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

pub struct GeminiDrafter {
    client: Client,
    api_key: String,
}

impl GeminiDrafter {
    pub fn new(api_key: impl Into<String>) -> Result<Self, DraftError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| DraftError::Network(err.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }

    /// Reads the key from `API_KEY`.
    pub fn from_env() -> Result<Self, DraftError> {
        let key = std::env::var("API_KEY")
            .map_err(|_| DraftError::Auth("API_KEY is not set".to_string()))?;
        Self::new(key)
    }
}

impl MessageDrafter for GeminiDrafter {
    fn draft(&self, request: &DraftRequest) -> Result<String, DraftError> {
        let prompt = make_message_prompt(request);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };
        let url = format!("{ENDPOINT}/{MODEL}:generateContent");

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|err| DraftError::Network(err.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(DraftError::Auth(response.status().to_string()))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(DraftError::Quota(response.status().to_string()))
            }
            status if !status.is_success() => {
                return Err(DraftError::Network(status.to_string()))
            }
            _ => {}
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|err| DraftError::InvalidResponse(err.to_string()))?;
        Ok(parsed.text().trim().to_string())
    }
}
