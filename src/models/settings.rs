//! Settings Models
//!
//! Application configuration and settings data structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use abogabot_core::config::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use abogabot_core::{ClientConfig, GenerateRoute, ProxyConfig};

/// Environment variable overriding `api_base_url`
pub const ENV_API_URL: &str = "ABOGABOT_API_URL";
/// Environment variable overriding `generator_base_url`
pub const ENV_GENERATOR_URL: &str = "ABOGABOT_GENERATOR_URL";
/// Environment variable overriding `auth_token`
pub const ENV_AUTH_TOKEN: &str = "ABOGABOT_AUTH_TOKEN";

/// Application configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Backend base URL for revision endpoints
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Base URL of the generation service, when it differs from `api_base_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_base_url: Option<String>,
    /// Timeout in seconds for revision calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Abort a generation run after this many seconds (no limit when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_timeout_secs: Option<u64>,
    /// Bearer token forwarded to the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub generate_route: GenerateRoute,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            generator_base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            generation_timeout_secs: None,
            auth_token: None,
            proxy: None,
            generate_route: GenerateRoute::default(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub api_base_url: Option<String>,
    pub generator_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub generation_timeout_secs: Option<u64>,
    pub auth_token: Option<String>,
    pub proxy: Option<ProxyConfig>,
    pub generate_route: Option<GenerateRoute>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(url) = update.api_base_url {
            self.api_base_url = url;
        }
        if let Some(url) = update.generator_base_url {
            self.generator_base_url = Some(url);
        }
        if let Some(secs) = update.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = update.generation_timeout_secs {
            self.generation_timeout_secs = Some(secs);
        }
        if let Some(token) = update.auth_token {
            self.auth_token = Some(token);
        }
        if let Some(proxy) = update.proxy {
            self.proxy = Some(proxy);
        }
        if let Some(route) = update.generate_route {
            self.generate_route = route;
        }
    }

    /// Apply `ABOGABOT_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup; empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(url) = get(ENV_GENERATOR_URL) {
            self.generator_base_url = Some(url);
        }
        if let Some(token) = get(ENV_AUTH_TOKEN) {
            self.auth_token = Some(token);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        validate_base_url("api_base_url", &self.api_base_url)?;
        if let Some(url) = &self.generator_base_url {
            validate_base_url("generator_base_url", url)?;
        }

        if self.request_timeout_secs < 1 {
            return Err("request_timeout_secs must be at least 1 second".to_string());
        }
        if self.generation_timeout_secs == Some(0) {
            return Err("generation_timeout_secs must be at least 1 second".to_string());
        }

        if let Some(proxy) = &self.proxy {
            if proxy.host.trim().is_empty() {
                return Err("proxy host must not be empty".to_string());
            }
            if proxy.port == 0 {
                return Err("proxy port must not be 0".to_string());
            }
        }

        Ok(())
    }

    /// Caller-side generation timeout, if configured
    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_secs.map(Duration::from_secs)
    }

    /// Convert into the configuration consumed by the REST binding
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.api_base_url.clone(),
            generator_base_url: self
                .generator_base_url
                .clone()
                .unwrap_or_else(|| self.api_base_url.clone()),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            auth_token: self.auth_token.clone(),
            proxy: self.proxy.clone(),
            generate_route: self.generate_route,
        }
    }
}

fn validate_base_url(field: &str, raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("Invalid {}: {} ({})", field, raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!(
            "Invalid {}: {}. Scheme must be 'http' or 'https', got '{}'",
            field, raw, other
        )),
    }
}
