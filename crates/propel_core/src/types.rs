use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Correlation id attached to every message of one request cycle.
pub type CycleId = u64;

/// Extracted text shorter than this (in characters, after normalization) is unusable.
pub const MIN_CONTENT_CHARS: usize = 150;

/// Stand-in identity sent with every generation request until a real identity source exists.
pub const PLACEHOLDER_USER_ID: &str = "anonymous_dev_user";

/// Shown when the backend could not be reached or gave no usable explanation.
pub const CONNECTIVITY_MESSAGE: &str =
    "Error connecting to the idea service. Is the backend running?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailureReason {
    ContentTooShort { chars: usize },
    NoContent,
    PageUnavailable(String),
}

impl fmt::Display for ExtractionFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionFailureReason::ContentTooShort { chars } => write!(
                f,
                "content too short ({chars} characters, at least {MIN_CONTENT_CHARS} needed)"
            ),
            ExtractionFailureReason::NoContent => write!(f, "no readable content on page"),
            ExtractionFailureReason::PageUnavailable(message) => {
                write!(f, "page unavailable: {message}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    pub url: String,
    pub reason: ExtractionFailureReason,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("invalid page url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("page text is empty")]
    EmptyText,
}

/// Body of the single outbound generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub url: String,
    pub text_content: String,
    pub user_id: String,
}

impl GenerationRequest {
    pub fn new(
        url: impl Into<String>,
        text_content: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self, RequestError> {
        let url = url.into();
        let text_content = text_content.into();
        Url::parse(&url).map_err(|err| RequestError::InvalidUrl {
            url: url.clone(),
            message: err.to_string(),
        })?;
        if text_content.trim().is_empty() {
            return Err(RequestError::EmptyText);
        }
        Ok(Self {
            url,
            text_content,
            user_id: user_id.into(),
        })
    }
}

/// One generated idea. The backend uses capitalized keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Problem")]
    pub problem: String,
    #[serde(rename = "Solution")]
    pub solution: String,
}

/// Why a submission did not produce ideas, reduced to what the popup needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayFailure {
    Rejected { status: u16, detail: Option<String> },
    Connectivity,
    InvalidResponse,
}

impl GatewayFailure {
    pub fn user_message(&self) -> String {
        match self {
            GatewayFailure::Rejected {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            _ => CONNECTIVITY_MESSAGE.to_string(),
        }
    }
}

/// Collapses every whitespace run into one space and trims both ends.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
