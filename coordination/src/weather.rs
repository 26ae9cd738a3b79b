//! Weather snapshot types shared by the preamble, the classifier, and the
//! tenant directory's weather-affinity tags.
//!
//! A snapshot is fetched once per session and never mutated afterwards, so it
//! is safe to share read-only across concurrent sessions.

use serde::{Deserialize, Serialize};

/// Coarse weather condition used for venue affinity and request analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Sunny,
    Cloudy,
    Rainy,
    Cold,
    Clear,
}

impl Condition {
    /// Map a provider's primary condition label (OpenWeatherMap `weather[0].main`)
    /// onto a coarse condition. Unknown labels collapse to `Cloudy`.
    pub fn from_provider_label(label: &str) -> Self {
        match label.trim() {
            "Clear" => Self::Sunny,
            "Clouds" | "Mist" | "Fog" | "Haze" => Self::Cloudy,
            "Rain" | "Drizzle" | "Thunderstorm" => Self::Rainy,
            "Snow" => Self::Cold,
            _ => Self::Cloudy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Cold => "cold",
            Self::Clear => "clear",
        }
    }

    /// Conditions that push visitors indoors.
    pub fn is_adverse(self) -> bool {
        matches!(self, Self::Rainy | Self::Cold)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunny" => Ok(Self::Sunny),
            "cloudy" => Ok(Self::Cloudy),
            "rainy" => Ok(Self::Rainy),
            "cold" => Ok(Self::Cold),
            "clear" => Ok(Self::Clear),
            other => Err(format!("unknown weather condition: {other}")),
        }
    }
}

/// Current weather as seen by every role in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub condition: Condition,
    /// Degrees Celsius.
    pub temperature: f64,
    pub description: String,
    /// Relative humidity, 0–100.
    pub humidity: u8,
}

impl WeatherSnapshot {
    pub fn new(
        condition: Condition,
        temperature: f64,
        description: impl Into<String>,
        humidity: u8,
    ) -> Self {
        Self {
            condition,
            temperature,
            description: description.into(),
            humidity: humidity.min(100),
        }
    }

    /// Snapshot served when no provider credential is configured.
    pub fn unconfigured() -> Self {
        Self::new(Condition::Sunny, 22.0, "clear", 60)
    }

    /// Snapshot served when the provider call fails for any reason.
    pub fn fallback() -> Self {
        Self::new(Condition::Cloudy, 20.0, "cloudy", 70)
    }

    /// Compact one-line form for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) {:.1}°C {}%",
            self.condition, self.description, self.temperature, self.humidity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_labels_map_to_conditions() {
        assert_eq!(Condition::from_provider_label("Clear"), Condition::Sunny);
        assert_eq!(Condition::from_provider_label("Clouds"), Condition::Cloudy);
        assert_eq!(Condition::from_provider_label("Drizzle"), Condition::Rainy);
        assert_eq!(
            Condition::from_provider_label("Thunderstorm"),
            Condition::Rainy
        );
        assert_eq!(Condition::from_provider_label("Snow"), Condition::Cold);
        assert_eq!(Condition::from_provider_label("Fog"), Condition::Cloudy);
        assert_eq!(Condition::from_provider_label("Tornado"), Condition::Cloudy);
    }

    #[test]
    fn fixed_snapshots_match_documented_values() {
        let stub = WeatherSnapshot::unconfigured();
        assert_eq!(stub.condition, Condition::Sunny);
        assert_eq!(stub.temperature, 22.0);
        assert_eq!(stub.humidity, 60);

        let fallback = WeatherSnapshot::fallback();
        assert_eq!(fallback.condition, Condition::Cloudy);
        assert_eq!(fallback.temperature, 20.0);
        assert_eq!(fallback.description, "cloudy");
        assert_eq!(fallback.humidity, 70);
    }

    #[test]
    fn humidity_is_clamped() {
        let w = WeatherSnapshot::new(Condition::Rainy, 18.0, "rain", 140);
        assert_eq!(w.humidity, 100);
    }

    #[test]
    fn condition_round_trips_through_str() {
        for c in [
            Condition::Sunny,
            Condition::Cloudy,
            Condition::Rainy,
            Condition::Cold,
            Condition::Clear,
        ] {
            assert_eq!(c.as_str().parse::<Condition>().unwrap(), c);
        }
        assert!("hail".parse::<Condition>().is_err());
    }

    #[test]
    fn adverse_conditions() {
        assert!(Condition::Rainy.is_adverse());
        assert!(Condition::Cold.is_adverse());
        assert!(!Condition::Sunny.is_adverse());
    }
}
