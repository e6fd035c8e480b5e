//! City lookup capability and its HTTP implementation.

use std::future::Future;

use canavial_core::SearchConfig;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::types::{parse_suggestions, City, LookupError};

/// Resolves a free-text query to candidate cities.
///
/// Implementations must resolve to [`LookupError::Cancelled`] once `cancel`
/// fires. The scheduler enforces this as well, so a slow implementation
/// only wastes work.
pub trait CityLookup: Send + Sync + 'static {
    fn lookup_cities(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Vec<City>, LookupError>> + Send;
}

/// Lookup against the `/api/cities?q=` proxy endpoint.
#[derive(Debug, Clone)]
pub struct HttpCityLookup {
    client: Client,
    endpoint: Url,
    min_query_chars: usize,
}

impl HttpCityLookup {
    /// Build a lookup client from search settings.
    ///
    /// # Errors
    /// Fails when the endpoint is not a valid URL or the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, LookupError> {
        let endpoint = Url::parse(&config.endpoint_url).map_err(|e| {
            LookupError::Parse(format!("invalid endpoint {}: {}", config.endpoint_url, e))
        })?;

        let mut builder = Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(config.request_timeout());
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint,
            min_query_chars: config.min_query_chars.max(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", query);
        url
    }

    async fn fetch(&self, query: &str) -> Result<Vec<City>, LookupError> {
        let url = self.request_url(query);
        tracing::debug!("Looking up cities: {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response.json().await?;
        let cities = parse_suggestions(body)?;
        tracing::debug!("City lookup for {:?} returned {} result(s)", query, cities.len());
        Ok(cities)
    }
}

impl CityLookup for HttpCityLookup {
    async fn lookup_cities(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<City>, LookupError> {
        let query = query.trim();
        if query.chars().count() < self.min_query_chars {
            return Err(LookupError::QueryTooShort(query.to_string()));
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LookupError::Cancelled),
            result = self.fetch(query) => result,
        }
    }
}
