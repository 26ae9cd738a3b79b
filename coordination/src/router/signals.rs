//! Deterministic pre-analysis of a visitor request.
//!
//! Counts specificity, breadth, and novelty markers (Japanese and English)
//! and notes whether the request is tied to the weather. The result is shown
//! to the classifier as a hint; it never replaces the classifier call.

use serde::{Deserialize, Serialize};

use crate::scheduler::SchedulingPolicy;
use crate::weather::WeatherSnapshot;

const SPECIFIC_TERMS: &[&str] = &[
    "ランチ", "ディナー", "カフェ", "ショッピング", "買い物", "映画", "ゲーム", "ラーメン",
    "lunch", "dinner", "cafe", "coffee", "shopping", "movie", "cinema", "arcade", "ramen",
];

const BREADTH_TERMS: &[&str] = &[
    "全体", "包括", "詳しく", "家族", "初めて", "一日", "いろいろ", "色々", "comprehensive",
    "overall", "family", "first time", "whole day", "everything", "full day",
];

const NOVELTY_TERMS: &[&str] = &[
    "新しい", "面白い", "ユニーク", "特別", "記念日", "斬新", "サプライズ", "new", "unique",
    "special", "anniversary", "creative", "surprise", "unusual",
];

const WEATHER_TERMS: &[&str] = &[
    "雨", "晴", "寒", "暑", "天気", "rain", "sunny", "cold", "hot", "weather",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSignals {
    pub specificity: u8,
    pub breadth: u8,
    pub novelty: u8,
    /// The request itself mentions weather.
    pub weather_linked: bool,
    /// Current weather pushes visitors indoors.
    pub adverse_weather: bool,
    pub matched_terms: Vec<String>,
}

impl RequestSignals {
    pub fn analyze(request: &str, weather: &WeatherSnapshot) -> Self {
        let lowered = request.to_lowercase();
        let mut matched = Vec::new();
        let mut count = |terms: &[&str]| -> u8 {
            let mut n = 0u8;
            for term in terms {
                if lowered.contains(term) {
                    matched.push((*term).to_string());
                    n = n.saturating_add(1);
                }
            }
            n
        };

        let specificity = count(SPECIFIC_TERMS);
        let breadth = count(BREADTH_TERMS);
        let novelty = count(NOVELTY_TERMS);
        let weather_linked = count(WEATHER_TERMS) > 0;

        Self {
            specificity,
            breadth,
            novelty,
            weather_linked,
            adverse_weather: weather.condition.is_adverse(),
            matched_terms: matched,
        }
    }

    /// Policy these signals point at on their own.
    ///
    /// Novelty wins only when it dominates and the request is not about the
    /// weather; a narrow request goes to context-driven; a broad one to
    /// fixed-order; anything else defaults to context-driven.
    pub fn suggested_policy(&self) -> SchedulingPolicy {
        if self.novelty > self.specificity
            && self.novelty > self.breadth
            && !self.weather_linked
        {
            SchedulingPolicy::IndependentSynthesize
        } else if self.breadth > self.specificity {
            SchedulingPolicy::FixedOrder
        } else {
            SchedulingPolicy::ContextDriven
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "specificity={} breadth={} novelty={} weather_linked={} adverse_weather={} suggested={}",
            self.specificity,
            self.breadth,
            self.novelty,
            self.weather_linked,
            self.adverse_weather,
            self.suggested_policy()
        )
    }
}
