use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;

use crate::{
    config::{Config, DEFAULT_BASE_URL},
    error::{FORECAST_FALLBACK_MESSAGE, WeatherError},
    model::{ApiStatus, CurrentConditions, ForecastSeries},
};

const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";

/// The two remote lookups the dashboard needs. `city` is passed through as
/// given; callers trim it.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn current(&self, city: &str) -> Result<CurrentConditions, WeatherError>;

    async fn forecast(&self, city: &str) -> Result<ForecastSeries, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        if !config.is_api_key_configured() {
            tracing::warn!("no OpenWeather API key configured; requests will be rejected upstream");
        }
        Self::with_base_url(config.api_key(), config.base_url())
    }

    /// GET an endpoint with the shared query parameters. The body is returned
    /// whatever the HTTP status, since the API reports errors in-band.
    async fn get(&self, path: &str, city: &str) -> Result<(reqwest::StatusCode, String), WeatherError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, city, "sending request");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("units", "metric"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        tracing::debug!(%status, bytes = body.len(), "response received");

        Ok((status, body))
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<CurrentConditions, WeatherError> {
        let (status, body) = self.get(CURRENT_PATH, city).await?;

        let envelope: ApiStatus = parse(&body)?;

        if envelope.is("404") {
            return Err(WeatherError::CityNotFound);
        }

        if !status.is_success() {
            let message = envelope.message_text().unwrap_or_default();
            tracing::debug!(%status, reason = %message, "current weather request rejected");
            return Err(WeatherError::Api { code: envelope.cod, message });
        }

        parse(&body)
    }

    async fn forecast(&self, city: &str) -> Result<ForecastSeries, WeatherError> {
        let (status, body) = self.get(FORECAST_PATH, city).await?;

        let envelope: ApiStatus = parse(&body)?;

        if !envelope.is("200") {
            tracing::debug!(
                %status,
                cod = ?envelope.cod,
                message = ?envelope.message_text(),
                "forecast request rejected"
            );
            return Err(WeatherError::Api {
                code: envelope.cod,
                message: FORECAST_FALLBACK_MESSAGE.to_string(),
            });
        }

        parse(&body)
    }
}

fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, WeatherError> {
    serde_json::from_str(body).map_err(|err| {
        tracing::debug!(body = %truncate_body(body), "failed to parse response body");
        WeatherError::Parse(err)
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let client = OpenWeatherClient::with_base_url("KEY", "http://localhost:1234/");
        assert_eq!(client.base_url, "http://localhost:1234");
    }

    #[test]
    fn from_config_uses_configured_host() {
        let cfg = Config {
            api_key: Some("KEY".into()),
            base_url: Some("http://mock".into()),
            ..Config::default()
        };

        let client = OpenWeatherClient::from_config(&cfg);
        assert_eq!(client.api_key, "KEY");
        assert_eq!(client.base_url, "http://mock");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);

        assert_eq!(truncate_body("short"), "short");
    }
}
