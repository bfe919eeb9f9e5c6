use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{
    config::Config,
    model::{RawResponse, Units},
    provider::{FetchError, ProbeOutcome, WeatherProvider, truncate_body},
};

/// Body excerpt length kept in errors and probe messages.
const BODY_EXCERPT: usize = 100;

/// Current-weather client for the OpenWeatherMap `/data/2.5/weather` endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    probe_city: String,
    probe_timeout: Duration,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder().build().context("Failed to build HTTP client")?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            probe_city: "London".to_string(),
            probe_timeout: Duration::from_secs(10),
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.api_key(), config.base_url.as_str())?
            .with_probe(config.probe.city.clone(), Duration::from_secs(config.probe.timeout_secs)))
    }

    pub fn with_probe(mut self, city: impl Into<String>, timeout: Duration) -> Self {
        self.probe_city = city.into();
        self.probe_timeout = timeout;
        self
    }

    /// Same request the probe sends, for pasting into a browser.
    pub fn probe_url(&self) -> String {
        format!("{}?q={}&appid={}", self.base_url, self.probe_city, self.api_key)
    }

    async fn get_weather(
        &self,
        location: (&str, &str),
        units: Units,
    ) -> Result<RawResponse, FetchError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                location,
                ("appid", self.api_key.as_str()),
                ("units", units.as_str()),
                ("lang", "en"),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenWeather request failed");
                FetchError::Network(e.to_string())
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| FetchError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "OpenWeather returned an error status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body, BODY_EXCERPT),
            });
        }

        let parsed: RawResponse = serde_json::from_str(&body)?;
        debug!(cod = ?parsed.cod, city = ?parsed.name, "OpenWeather response parsed");

        Ok(parsed)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self, units), fields(units = units.as_str()))]
    async fn fetch_by_city(&self, name: &str, units: Units) -> Result<RawResponse, FetchError> {
        self.get_weather(("q", name), units).await
    }

    #[instrument(skip(self, units), fields(units = units.as_str()))]
    async fn fetch_by_postal_code(
        &self,
        code: &str,
        country: &str,
        units: Units,
    ) -> Result<RawResponse, FetchError> {
        let zip = format!("{code},{country}");
        self.get_weather(("zip", zip.as_str()), units).await
    }

    #[instrument(skip_all)]
    async fn probe(&self) -> ProbeOutcome {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[("q", self.probe_city.as_str()), ("appid", self.api_key.as_str())])
            .timeout(self.probe_timeout)
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(e) if e.is_connect() => {
                warn!(error = %e, "API key probe could not reach OpenWeather");
                return ProbeOutcome::Unreachable(e.to_string());
            }
            Err(e) => {
                warn!(error = %e, "API key check failed");
                return ProbeOutcome::Failed(e.to_string());
            }
        };

        let status = res.status();
        debug!(city = %self.probe_city, status = status.as_u16(), "API key probe answered");

        match status {
            StatusCode::OK => ProbeOutcome::Valid,
            StatusCode::UNAUTHORIZED => ProbeOutcome::Unauthorized { test_url: self.probe_url() },
            other => {
                let body = res.text().await.unwrap_or_default();
                ProbeOutcome::Status {
                    status: other.as_u16(),
                    body: truncate_body(&body, BODY_EXCERPT),
                }
            }
        }
    }
}
