//! Client Configuration Types
//!
//! Plain data describing how to reach the backend. Loading, validation and
//! persistence live in the application crate; the HTTP binding only consumes
//! [`ClientConfig`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default backend base URL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Default timeout for non-streaming calls
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Proxy protocol type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

/// Outbound proxy used for every backend call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Never written back to disk.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Proxy URL without credentials
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }
}

/// Which generation endpoint shape the backend exposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerateRoute {
    /// `POST /lawsuit/{id}/generate`
    #[default]
    Path,
    /// `POST /lawsuit/generate?id={id}` (older deployments)
    Query,
}

/// Everything the REST binding needs to talk to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL for revision endpoints
    pub api_base_url: String,
    /// Base URL for the generation endpoint; some deployments run the
    /// generator as a separate service
    pub generator_base_url: String,
    /// Timeout for revision calls. The generation stream has none.
    pub request_timeout: Duration,
    /// Bearer token forwarded on every request
    pub auth_token: Option<String>,
    pub proxy: Option<ProxyConfig>,
    pub generate_route: GenerateRoute,
}

impl ClientConfig {
    /// Config pointing both endpoints at the same base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            generator_base_url: base_url.clone(),
            api_base_url: base_url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            auth_token: None,
            proxy: None,
            generate_route: GenerateRoute::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}
