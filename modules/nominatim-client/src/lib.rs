pub mod error;
pub mod types;

pub use error::{NominatimError, Result};
pub use types::{Address, Place, SearchQuery};

use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Client for a Nominatim-compatible search API.
///
/// Carries no throttling of its own; the public instance allows one request
/// per second per application, so callers must pace requests themselves.
#[derive(Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// `user_agent` identifies the application, as the usage policy requires.
    /// `timeout` bounds the whole request including reading the body.
    pub fn new(base_url: Option<&str>, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Free-form search. Returns the provider's ranked matches, possibly empty.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Place>> {
        let url = format!("{}/search", self.base_url);
        let resp = self.client.get(&url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NominatimError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = resp.bytes().await?;
        let places: Vec<Place> = serde_json::from_slice(&bytes)?;
        tracing::debug!(q = %query.q, count = places.len(), "Nominatim search returned");
        Ok(places)
    }
}
