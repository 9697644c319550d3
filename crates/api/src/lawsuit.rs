//! Lawsuit Resource Client
//!
//! reqwest implementation of the two backend capabilities the generation core
//! consumes:
//!
//! - `POST /lawsuit/{id}/generate` (or `POST /lawsuit/generate?id={id}`):
//!   raw text streamed back without framing
//! - `GET /lawsuit/{id}/revisions`: JSON list of `{ uuid, createdAt }`
//! - `GET /lawsuit/{id}/revisions/{uuid}`: revision body, read as plain text
//!   whatever the declared content type

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use thiserror::Error;
use url::Url;

use abogabot_core::{
    CaseId, ChunkStream, ClientConfig, GenerateRoute, GenerationError, GenerationResult,
    GenerationTransport, RevisionError, RevisionResult, RevisionStore, RevisionSummary,
};

use crate::http_client::build_http_client;
use crate::response::{parse_generation_error, parse_revision_error, parse_revision_list};

/// Errors raised while constructing a [`LawsuitClient`].
#[derive(Error, Debug)]
pub enum ClientBuildError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP client for the lawsuit generation and revision endpoints.
pub struct LawsuitClient {
    api_base: Url,
    generator_base: Url,
    config: ClientConfig,
    /// Client for revision calls, bounded by `request_timeout`
    api: reqwest::Client,
    /// Client for the generation stream, no overall timeout
    generator: reqwest::Client,
}

impl LawsuitClient {
    /// Creates a client from configuration, building both reqwest clients.
    pub fn new(config: ClientConfig) -> Result<Self, ClientBuildError> {
        let api = build_http_client(config.proxy.as_ref(), Some(config.request_timeout))?;
        let generator = build_http_client(config.proxy.as_ref(), None)?;
        Self::with_reqwest_clients(api, generator, config)
    }

    /// Creates a client wrapping existing reqwest clients.
    ///
    /// Useful for tests or when the caller controls TLS/proxy settings.
    pub fn with_reqwest_clients(
        api: reqwest::Client,
        generator: reqwest::Client,
        config: ClientConfig,
    ) -> Result<Self, ClientBuildError> {
        Ok(Self {
            api_base: parse_base(&config.api_base_url)?,
            generator_base: parse_base(&config.generator_base_url)?,
            config,
            api,
            generator,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// URL of the generation endpoint for a case.
    pub fn generate_url(&self, case_id: &CaseId) -> Url {
        match self.config.generate_route {
            GenerateRoute::Path => {
                join(&self.generator_base, &["lawsuit", case_id.as_str(), "generate"])
            }
            GenerateRoute::Query => {
                let mut url = join(&self.generator_base, &["lawsuit", "generate"]);
                url.query_pairs_mut().append_pair("id", case_id.as_str());
                url
            }
        }
    }

    /// URL of the revision list for a case.
    pub fn revisions_url(&self, case_id: &CaseId) -> Url {
        join(&self.api_base, &["lawsuit", case_id.as_str(), "revisions"])
    }

    /// URL of one revision body.
    pub fn revision_url(&self, case_id: &CaseId, uuid: &str) -> Url {
        join(
            &self.api_base,
            &["lawsuit", case_id.as_str(), "revisions", uuid],
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.auth_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_text(&self, url: Url) -> RevisionResult<String> {
        tracing::debug!(url = %url, "GET");
        let response = self
            .authorize(self.api.get(url.clone()))
            .send()
            .await
            .map_err(|e| RevisionError::network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RevisionError::network(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "revision request failed");
            return Err(parse_revision_error(status.as_u16(), &body));
        }
        Ok(body)
    }
}

fn parse_base(raw: &str) -> Result<Url, ClientBuildError> {
    let url = Url::parse(raw).map_err(|e| ClientBuildError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientBuildError::InvalidUrl {
            url: raw.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }
    Ok(url)
}

/// Append path segments to a base URL, tolerating a trailing slash on the
/// base and percent-encoding each segment.
fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[async_trait]
impl GenerationTransport for LawsuitClient {
    async fn open(&self, case_id: &CaseId) -> GenerationResult<ChunkStream> {
        let url = self.generate_url(case_id);
        tracing::info!(case_id = %case_id, url = %url, "opening generation stream");

        let request = self
            .generator
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "*/*");

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| GenerationError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Drain the error body so the connection is not left half-read.
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(case_id = %case_id, status = status.as_u16(), "generation request rejected");
            return Err(parse_generation_error(status.as_u16(), &body));
        }

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| GenerationError::network(format!("Stream read error: {}", e)))
        });
        Ok(stream.boxed())
    }
}

#[async_trait]
impl RevisionStore for LawsuitClient {
    async fn list_revisions(&self, case_id: &CaseId) -> RevisionResult<Vec<RevisionSummary>> {
        let body = self.get_text(self.revisions_url(case_id)).await?;
        parse_revision_list(&body)
    }

    async fn fetch_revision(&self, case_id: &CaseId, uuid: &str) -> RevisionResult<String> {
        self.get_text(self.revision_url(case_id, uuid)).await
    }
}
