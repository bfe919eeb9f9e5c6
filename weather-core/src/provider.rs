use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use crate::model::{LocationQuery, RawResponse, Units};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Why a fetch produced no data. Callers currently treat every variant the same.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never got an HTTP response.
    #[error("Connection failed: {0}")]
    Network(String),

    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not JSON of the expected shape.
    #[error("Failed to parse weather JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result of the one-shot API key check made before the menu starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Valid,
    /// HTTP 401. `test_url` can be pasted into a browser to check the key by hand.
    Unauthorized { test_url: String },
    Status { status: u16, body: String },
    /// No connection could be made to the server.
    Unreachable(String),
    /// Any other transport failure, e.g. a timeout.
    Failed(String),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_by_city(&self, name: &str, units: Units) -> Result<RawResponse, FetchError>;

    async fn fetch_by_postal_code(
        &self,
        code: &str,
        country: &str,
        units: Units,
    ) -> Result<RawResponse, FetchError>;

    async fn probe(&self) -> ProbeOutcome;

    async fn fetch(&self, query: &LocationQuery, units: Units) -> Result<RawResponse, FetchError> {
        match query {
            LocationQuery::City { name } => self.fetch_by_city(name, units).await,
            LocationQuery::PostalCode { code, country } => {
                self.fetch_by_postal_code(code, country, units).await
            }
        }
    }
}

/// First `max` characters of `body`, with no marker when cut.
pub(crate) fn truncate_body(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}
