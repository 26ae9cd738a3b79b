use anyhow::{Context, Result};
use coordination::SchedulerConfig;
use rig::providers::openai;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_WEATHER_URL: &str = "http://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_CITY: &str = "Tokyo";

/// Weather provider settings.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// OpenWeatherMap key. `None` serves a fixed snapshot without calling out.
    pub api_key: Option<String>,
    pub url: String,
    pub city: String,
    pub timeout_secs: u64,
}

/// Top-level concierge configuration.
#[derive(Debug, Clone)]
pub struct ConciergeConfig {
    /// Required for live inference.
    pub api_key: Option<String>,
    /// OpenAI-compatible endpoint.
    pub base_url: String,
    pub model: String,
    /// Temperature for panel roles.
    pub role_temperature: f64,
    /// Temperature for the classifier and speaker selection; kept low for
    /// consistent choices.
    pub classifier_temperature: f64,
    /// Per-invocation timeout.
    pub request_timeout_secs: u64,
    pub weather: WeatherConfig,
    pub scheduler: SchedulerConfig,
}

impl ConciergeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let parsed_f64 = |key: &str, default: f64| {
            get(key)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(default)
        };
        let parsed_u64 = |key: &str, default: u64| {
            get(key)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };

        Self {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("CONCIERGE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            model: get("CONCIERGE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            role_temperature: parsed_f64("CONCIERGE_ROLE_TEMPERATURE", 0.7),
            classifier_temperature: parsed_f64("CONCIERGE_CLASSIFIER_TEMPERATURE", 0.3),
            request_timeout_secs: parsed_u64("CONCIERGE_TIMEOUT_SECS", 120),
            weather: WeatherConfig {
                api_key: get("WEATHER_API_KEY"),
                url: get("CONCIERGE_WEATHER_URL").unwrap_or_else(|| DEFAULT_WEATHER_URL.into()),
                city: get("CONCIERGE_CITY").unwrap_or_else(|| DEFAULT_CITY.into()),
                timeout_secs: parsed_u64("CONCIERGE_WEATHER_TIMEOUT_SECS", 10),
            },
            scheduler: SchedulerConfig::default(),
        }
    }

    /// Build the rig completions client for the configured endpoint.
    pub fn client(&self) -> Result<openai::CompletionsClient> {
        let api_key = self
            .api_key
            .as_deref()
            .context("OPENAI_API_KEY is not set; live discussions need an inference key")?;
        openai::CompletionsClient::builder()
            .api_key(api_key)
            .base_url(&self.base_url)
            .build()
            .with_context(|| format!("Failed to build completions client for {}", self.base_url))
    }
}
