use std::path::PathBuf;

use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::StreamExt;
use propel_logging::{propel_debug, propel_info};
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::decode::decode_html;
use crate::PageSettings;

/// A parsed-once copy of a page: what the extractor sees instead of a live DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageLoadError {
    #[error("invalid page address {address}: {message}")]
    InvalidAddress { address: String, message: String },
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timed out loading page")]
    Timeout,
    #[error("redirect limit exceeded")]
    RedirectLimitExceeded,
    #[error("page larger than {max_bytes} bytes")]
    TooLarge { max_bytes: u64 },
    #[error("unsupported content type {0}")]
    UnsupportedContentType(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },
}

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn load(&self, address: &str) -> Result<PageSnapshot, PageLoadError>;
}

#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: reqwest::Client,
    settings: PageSettings,
}

impl HttpPageSource {
    pub fn new(settings: PageSettings) -> Result<Self, PageLoadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.request_timeout())
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| PageLoadError::Network(err.to_string()))?;
        Ok(Self { client, settings })
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }

    fn too_large(&self) -> PageLoadError {
        PageLoadError::TooLarge {
            max_bytes: self.settings.max_bytes,
        }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn load(&self, address: &str) -> Result<PageSnapshot, PageLoadError> {
        let url = Url::parse(address).map_err(|err| PageLoadError::InvalidAddress {
            address: address.to_string(),
            message: err.to_string(),
        })?;

        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PageLoadError::HttpStatus(status.as_u16()));
        }
        if response
            .content_length()
            .is_some_and(|len| len > self.settings.max_bytes)
        {
            return Err(self.too_large());
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(PageLoadError::UnsupportedContentType(ct.to_string()));
            }
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if body.len() as u64 + chunk.len() as u64 > self.settings.max_bytes {
                return Err(self.too_large());
            }
            body.extend_from_slice(&chunk);
        }

        let decoded = decode_html(&body, content_type.as_deref());
        propel_info!(
            "loaded {} ({} bytes, {})",
            final_url,
            body.len(),
            decoded.encoding_label
        );
        Ok(PageSnapshot::new(final_url, decoded.html))
    }
}

/// Reads saved `.html` files; the snapshot url is the file's `file://` url.
#[derive(Debug, Clone, Default)]
pub struct FilePageSource;

#[async_trait]
impl PageSource for FilePageSource {
    async fn load(&self, address: &str) -> Result<PageSnapshot, PageLoadError> {
        let io_error = |err: std::io::Error| PageLoadError::Io {
            path: address.to_string(),
            message: err.to_string(),
        };
        let path = tokio::fs::canonicalize(local_path(address)?)
            .await
            .map_err(io_error)?;
        let bytes = tokio::fs::read(&path).await.map_err(io_error)?;
        let url = Url::from_file_path(&path).map_err(|()| PageLoadError::InvalidAddress {
            address: address.to_string(),
            message: "not an absolute path".to_string(),
        })?;
        propel_debug!("read {} bytes from {}", bytes.len(), path.display());
        Ok(PageSnapshot::new(url, decode_html(&bytes, None).html))
    }
}

/// Accepts plain paths as well as the `file://` urls this source reports.
fn local_path(address: &str) -> Result<PathBuf, PageLoadError> {
    if !address.get(..7).is_some_and(|scheme| scheme.eq_ignore_ascii_case("file://")) {
        return Ok(PathBuf::from(address));
    }
    let invalid = |message: String| PageLoadError::InvalidAddress {
        address: address.to_string(),
        message,
    };
    Url::parse(address)
        .map_err(|err| invalid(err.to_string()))?
        .to_file_path()
        .map_err(|()| invalid("not a local file url".to_string()))
}

/// Sends `http(s)://` addresses to the network and everything else to the filesystem.
pub struct RoutingPageSource {
    http: HttpPageSource,
    files: FilePageSource,
}

impl RoutingPageSource {
    pub fn new(settings: PageSettings) -> Result<Self, PageLoadError> {
        Ok(Self {
            http: HttpPageSource::new(settings)?,
            files: FilePageSource,
        })
    }
}

#[async_trait]
impl PageSource for RoutingPageSource {
    async fn load(&self, address: &str) -> Result<PageSnapshot, PageLoadError> {
        let lower = address.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            self.http.load(address.trim()).await
        } else {
            self.files.load(address).await
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> PageLoadError {
    if err.is_timeout() {
        PageLoadError::Timeout
    } else if err.is_redirect() {
        PageLoadError::RedirectLimitExceeded
    } else {
        PageLoadError::Network(err.to_string())
    }
}
