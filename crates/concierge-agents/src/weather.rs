//! OpenWeatherMap-backed weather provider.
//!
//! Never fails a session: with no key it serves a fixed snapshot without
//! calling out, and any lookup failure degrades to a fixed fallback snapshot.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use coordination::{Condition, WeatherSnapshot};

use crate::config::WeatherConfig;

/// Source of the session's weather snapshot.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, city: &str) -> WeatherSnapshot;
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected weather payload: {0}")]
    Decode(String),
    #[error("weather payload has no condition entry")]
    NoCondition,
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    weather: Vec<OwmCondition>,
    main: OwmMain,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

/// Parse an OpenWeatherMap current-weather body into a snapshot.
pub fn snapshot_from_response(body: &str) -> Result<WeatherSnapshot, WeatherError> {
    let parsed: OwmResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::Decode(e.to_string()))?;
    let first = parsed.weather.first().ok_or(WeatherError::NoCondition)?;
    let humidity = parsed.main.humidity.round().clamp(0.0, 100.0) as u8;
    let description = if first.description.is_empty() {
        first.main.clone()
    } else {
        first.description.clone()
    };
    Ok(WeatherSnapshot::new(
        Condition::from_provider_label(&first.main),
        parsed.main.temp,
        description,
        humidity,
    ))
}

pub struct WeatherProvider {
    http: reqwest::Client,
    api_key: Option<String>,
    url: String,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "weather http client fell back to defaults");
                reqwest::Client::new()
            });
        Self {
            http,
            api_key: config.api_key.clone(),
            url: config.url.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Raw lookup; errors are surfaced.
    pub async fn fetch(&self, city: &str, api_key: &str) -> Result<WeatherSnapshot, WeatherError> {
        let body = self
            .http
            .get(&self.url)
            .query(&[
                ("q", city),
                ("appid", api_key),
                ("units", "metric"),
                ("lang", "ja"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        snapshot_from_response(&body)
    }

    pub async fn get_current_weather(&self, city: &str) -> WeatherSnapshot {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("no weather key configured, serving fixed snapshot");
            return WeatherSnapshot::unconfigured();
        };
        match self.fetch(city, api_key).await {
            Ok(snapshot) => {
                debug!(city, weather = %snapshot.summary(), "weather fetched");
                snapshot
            }
            Err(e) => {
                warn!(city, error = %e, "weather lookup failed, using fallback snapshot");
                WeatherSnapshot::fallback()
            }
        }
    }
}

#[async_trait]
impl WeatherSource for WeatherProvider {
    async fn current(&self, city: &str) -> WeatherSnapshot {
        self.get_current_weather(city).await
    }
}

/// Always returns the same snapshot.
pub struct FixedWeather(pub WeatherSnapshot);

#[async_trait]
impl WeatherSource for FixedWeather {
    async fn current(&self, _city: &str) -> WeatherSnapshot {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>, url: &str) -> WeatherConfig {
        WeatherConfig {
            api_key: api_key.map(str::to_string),
            url: url.to_string(),
            city: "Tokyo".into(),
            timeout_secs: 2,
        }
    }

    #[test]
    fn parses_provider_payload() {
        let body = r#"{
            "weather": [{"main": "Drizzle", "description": "霧雨"}],
            "main": {"temp": 17.4, "humidity": 93}
        }"#;
        let snap = snapshot_from_response(body).unwrap();
        assert_eq!(snap.condition, Condition::Rainy);
        assert_eq!(snap.temperature, 17.4);
        assert_eq!(snap.description, "霧雨");
        assert_eq!(snap.humidity, 93);
    }

    #[test]
    fn rejects_payload_without_condition() {
        let body = r#"{"weather": [], "main": {"temp": 10.0, "humidity": 50}}"#;
        assert!(matches!(
            snapshot_from_response(body),
            Err(WeatherError::NoCondition)
        ));
        assert!(matches!(
            snapshot_from_response("<html>"),
            Err(WeatherError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn no_key_serves_fixed_snapshot() {
        let provider = WeatherProvider::new(&config(None, "http://127.0.0.1:9/unused"));
        assert!(!provider.is_configured());
        let first = provider.get_current_weather("Tokyo").await;
        let second = provider.get_current_weather("Osaka").await;
        assert_eq!(first, WeatherSnapshot::unconfigured());
        assert_eq!(first, second);
        assert_eq!(first.condition, Condition::Sunny);
        assert_eq!(first.temperature, 22.0);
        assert_eq!(first.humidity, 60);
    }

    #[tokio::test]
    async fn unreachable_provider_falls_back() {
        let provider = WeatherProvider::new(&config(Some("key"), "http://127.0.0.1:9/weather"));
        let snap = provider.current("Tokyo").await;
        assert_eq!(snap, WeatherSnapshot::fallback());
    }
}
