use std::fmt;

use propel_core::{CycleId, GatewayFailure, IdeaRecord, RelayMessage};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The page-context extractor reported its single outcome for a cycle.
    PageMessage(RelayMessage),
    /// The outbound generation call finished. Never sent for an aborted cycle.
    GatewayCompleted {
        cycle: CycleId,
        result: Result<Vec<IdeaRecord>, GatewayError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub kind: FailureKind,
    pub message: String,
}

impl GatewayError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for GatewayError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    HttpStatus { status: u16, detail: Option<String> },
    Timeout,
    Network,
    InvalidResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::HttpStatus { status, .. } => write!(f, "http status {status}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
        }
    }
}

impl From<&GatewayError> for GatewayFailure {
    fn from(err: &GatewayError) -> Self {
        match &err.kind {
            FailureKind::HttpStatus { status, detail } => GatewayFailure::Rejected {
                status: *status,
                detail: detail.clone(),
            },
            FailureKind::Timeout | FailureKind::Network => GatewayFailure::Connectivity,
            FailureKind::InvalidResponse => GatewayFailure::InvalidResponse,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: serde_json::Value,
}

/// Pulls the `detail` field out of a backend error body.
///
/// Validation errors carry a list of `{msg}` objects instead of a string; their
/// messages are joined.
pub(crate) fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(detail) if !detail.trim().is_empty() => Some(detail),
        serde_json::Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|msg| msg.as_str()))
                .collect::<Vec<_>>()
                .join("; ");
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}
