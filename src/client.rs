use std::future::Future;

use tracing::debug;
use wreq::Client;

use crate::types::{LookupOutcome, RemoteAddress};

pub const DEFAULT_BASE_URL: &str = "https://viacep.com.br";

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("lookup request failed: {0}")]
    Transport(#[from] wreq::Error),
    #[error("lookup service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse lookup response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Resolves an eight-digit CEP to an address.
///
/// Implementations only see complete, digit-only codes; the form controller
/// filters everything else out before calling.
pub trait LookupClient: Send + Sync {
    fn fetch(
        &self,
        digits: &str,
    ) -> impl Future<Output = Result<LookupOutcome, LookupError>> + Send;
}

/// Client for the public ViaCEP service
#[derive(Clone)]
pub struct ViaCepClient {
    http_client: Client,
    base_url: String,
}

impl ViaCepClient {
    pub fn new() -> Result<Self, LookupError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at another deployment (or a local stub)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, LookupError> {
        // No timeout: a hung request just never updates the form.
        let http_client = Client::builder().gzip(true).brotli(true).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, digits: &str) -> String {
        format!("{}/ws/{}/json/", self.base_url, digits)
    }
}

impl LookupClient for ViaCepClient {
    async fn fetch(&self, digits: &str) -> Result<LookupOutcome, LookupError> {
        let url = self.url_for(digits);
        debug!(%url, "querying CEP lookup service");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let remote: RemoteAddress = serde_json::from_str(&body)?;
        if remote.is_not_found() {
            return Ok(LookupOutcome::NotFound);
        }
        Ok(LookupOutcome::Found(remote))
    }
}
