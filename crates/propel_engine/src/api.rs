//! Client for the web application's REST surface (login, history, starring, ...).

use std::sync::Arc;

use chrono::NaiveDateTime;
use propel_logging::propel_debug;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::error_detail;
use crate::{CredentialProvider, PropelConfig};

const UNKNOWN_ERROR: &str = "Unknown Error";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401 on a protected endpoint; the caller should send the user to log in.
    #[error("not authorized: {detail}")]
    Unauthorized { detail: String },
    #[error("{detail} (status {status})")]
    Status { status: u16, detail: String },
    #[error("could not reach backend: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error(transparent)]
    Config(#[from] crate::ConfigError),
}

impl ApiError {
    /// Text shown to the user: the server's detail when it sent one.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Unauthorized { detail } | ApiError::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Greeting {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
struct PromptRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tone: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedIdea {
    pub id: u64,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedIdeas {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ideas: Vec<GeneratedIdea>,
    #[serde(default)]
    pub credits_remaining: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub problem: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub is_starred: Option<bool>,
    #[serde(default)]
    pub generated_at: Option<NaiveDateTime>,
}

impl HistoryEntry {
    pub fn starred(&self) -> bool {
        self.is_starred.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusMessage {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StarToggle {
    pub status: String,
    pub is_starred: bool,
}

pub struct ApiClient {
    client: reqwest::Client,
    config: PropelConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    pub fn new(
        config: PropelConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.config.endpoint(path)?;
        propel_debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        Ok(match self.credentials.current_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        if !status.is_success() {
            let detail = error_detail(&body).unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            return Err(if status == reqwest::StatusCode::UNAUTHORIZED {
                ApiError::Unauthorized { detail }
            } else {
                ApiError::Status {
                    status: status.as_u16(),
                    detail,
                }
            });
        }
        serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// `POST /auth/login`. The caller stores the returned token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let builder = self
            .request(Method::POST, "/auth/login")?
            .json(&Credentials { email, password });
        self.send(builder).await
    }

    pub async fn greeting(&self) -> Result<Greeting, ApiError> {
        let builder = self.request(Method::GET, "/api/greeting")?;
        self.send(builder).await
    }

    pub async fn generate_idea(
        &self,
        prompt: &str,
        tone: Option<&str>,
    ) -> Result<GeneratedIdeas, ApiError> {
        let builder = self
            .request(Method::POST, "/api/generate")?
            .json(&PromptRequest { prompt, tone });
        self.send(builder).await
    }

    /// Newest first, as the backend orders it.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let builder = self.request(Method::GET, "/api/history")?;
        self.send(builder).await
    }

    pub async fn delete_idea(&self, id: u64) -> Result<StatusMessage, ApiError> {
        let builder = self.request(Method::DELETE, &format!("/api/ideas/{id}"))?;
        self.send(builder).await
    }

    pub async fn toggle_star(&self, id: u64) -> Result<StarToggle, ApiError> {
        let builder = self.request(Method::PATCH, &format!("/api/ideas/{id}/toggle-star"))?;
        self.send(builder).await
    }
}
