//! Propel engine: page loading, content extraction, backend calls and effect execution.
mod api;
mod config;
mod credentials;
mod decode;
mod engine;
mod extract;
mod gateway;
mod page;
mod types;

pub use api::{
    ApiClient, ApiError, GeneratedIdea, GeneratedIdeas, Greeting, HistoryEntry, LoginResponse,
    StarToggle, StatusMessage,
};
pub use config::{ConfigError, PageSettings, PropelConfig, API_BASE_URL_ENV};
pub use credentials::{CredentialProvider, NoCredentials, StaticToken, TokenStore, TokenStoreError};
pub use decode::{decode_html, DecodedHtml};
pub use engine::{EngineError, EngineHandle, EngineParts};
pub use extract::{
    outcome_message, visible_text, BodyFallback, ContentStrategy, Extractor, PrioritizedExtractor,
    SelectorStrategy, DEFAULT_CONTENT_SELECTORS,
};
pub use gateway::{Gateway, GatewaySettings, HttpGateway};
pub use page::{
    FilePageSource, HttpPageSource, PageLoadError, PageSnapshot, PageSource, RoutingPageSource,
};
pub use types::{EngineEvent, FailureKind, GatewayError};
