use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use propel_core::{GenerationRequest, IdeaRecord};
use propel_logging::{propel_debug, propel_info};
use serde::Deserialize;
use url::Url;

use crate::types::error_detail;
use crate::{ConfigError, CredentialProvider, FailureKind, GatewayError, PropelConfig};

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub endpoint: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl GatewaySettings {
    pub fn from_config(config: &PropelConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: config.generate_endpoint()?,
            connect_timeout: config.connect_timeout(),
            request_timeout: config.request_timeout(),
        })
    }
}

/// The one outbound call that turns page text into ideas. Single attempt, no retry.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<IdeaRecord>, GatewayError>;
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    message: Option<String>,
    /// Absent and `null` both mean no ideas.
    #[serde(default)]
    ideas: Option<Vec<IdeaRecord>>,
}

pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpGateway {
    pub fn new(
        settings: GatewaySettings,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| GatewayError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint,
            credentials,
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<IdeaRecord>, GatewayError> {
        let mut builder = self.client.post(self.endpoint.clone()).json(request);
        if let Some(token) = self.credentials.current_token() {
            builder = builder.bearer_auth(token);
        }

        propel_debug!("POST {}", self.endpoint);
        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            let detail = error_detail(&body);
            let message = detail
                .clone()
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
            return Err(GatewayError::new(
                FailureKind::HttpStatus {
                    status: status.as_u16(),
                    detail,
                },
                message,
            ));
        }

        let parsed: GenerateResponse = serde_json::from_slice(&body)
            .map_err(|err| GatewayError::new(FailureKind::InvalidResponse, err.to_string()))?;
        if let Some(message) = parsed.message.as_deref() {
            propel_info!("backend: {}", message);
        }
        Ok(parsed.ideas.unwrap_or_default())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::new(FailureKind::Timeout, err.to_string())
    } else if err.is_decode() {
        GatewayError::new(FailureKind::InvalidResponse, err.to_string())
    } else {
        GatewayError::new(FailureKind::Network, err.to_string())
    }
}
