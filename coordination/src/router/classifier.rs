//! Intent classifier: picks a scheduling policy for a visitor request.
//!
//! One text-generation call per request, never retried. The raw response
//! goes through an explicit three-step case analysis:
//!
//! 1. structured parse of the first JSON object in the response
//! 2. keyword scan of the raw text (confidence 0.7)
//! 3. hard default when the call itself failed (context-driven, 0.5)
//!
//! [`IntentClassifier::classify`] therefore always returns a decision.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::signals::RequestSignals;
use crate::roles::{Role, SpeakingHint};
use crate::scheduler::{SchedulingPolicy, TextGenerator};
use crate::weather::WeatherSnapshot;

pub const KEYWORD_CONFIDENCE: f64 = 0.7;
pub const DEFAULT_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_REASONING: &str = "analysis failed, generic policy selected";

/// Where a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Structured,
    KeywordFallback,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationDecision {
    pub selected_policy: SchedulingPolicy,
    /// Clamped to 0.0–1.0.
    pub confidence: f64,
    pub reasoning: String,
    pub request_analysis: String,
    pub source: DecisionSource,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassificationParseError {
    #[error("response contains no JSON object")]
    NoObject,
    #[error("malformed decision object: {0}")]
    Malformed(String),
    #[error("unknown policy `{0}`")]
    UnknownPolicy(String),
    #[error("confidence is not a finite number")]
    InvalidConfidence,
}

/// Wire shape. Accepts the legacy `selected_method` / `user_request_analysis`
/// field names as well.
#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(alias = "selected_method")]
    selected_policy: String,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default, alias = "user_request_analysis")]
    request_analysis: String,
}

/// Decode the first JSON object in `raw` into a decision.
///
/// Each `{` is tried as a start position in turn and only the leading value
/// is decoded, so prose braces before or after the object are ignored.
pub fn parse_decision(raw: &str) -> Result<ClassificationDecision, ClassificationParseError> {
    let mut first_error = None;
    for (start, _) in raw.match_indices('{') {
        let mut values =
            serde_json::Deserializer::from_str(&raw[start..]).into_iter::<RawDecision>();
        match values.next() {
            Some(Ok(decoded)) => return decision_from_raw(decoded),
            Some(Err(e)) => {
                first_error.get_or_insert(ClassificationParseError::Malformed(e.to_string()));
            }
            None => {}
        }
    }
    Err(first_error.unwrap_or(ClassificationParseError::NoObject))
}

fn decision_from_raw(
    decoded: RawDecision,
) -> Result<ClassificationDecision, ClassificationParseError> {
    let policy = SchedulingPolicy::from_label(&decoded.selected_policy)
        .ok_or_else(|| ClassificationParseError::UnknownPolicy(decoded.selected_policy.clone()))?;
    if !decoded.confidence.is_finite() {
        return Err(ClassificationParseError::InvalidConfidence);
    }

    Ok(ClassificationDecision {
        selected_policy: policy,
        confidence: decoded.confidence.clamp(0.0, 1.0),
        reasoning: decoded.reasoning,
        request_analysis: decoded.request_analysis,
        source: DecisionSource::Structured,
    })
}

static FIXED_ORDER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)fixed[\s_-]?order|round[\s_-]?robin")
        .expect("FIXED_ORDER_MARKER regex should compile")
});

static INDEPENDENT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)independent|swarm").expect("INDEPENDENT_MARKER regex should compile")
});

/// Keyword scan over an unparseable response. Fixed-order markers are
/// checked first, then independent markers; anything else is context-driven.
pub fn keyword_decision(raw: &str) -> ClassificationDecision {
    let policy = if FIXED_ORDER_MARKER.is_match(raw) {
        SchedulingPolicy::FixedOrder
    } else if INDEPENDENT_MARKER.is_match(raw) {
        SchedulingPolicy::IndependentSynthesize
    } else {
        SchedulingPolicy::ContextDriven
    };
    ClassificationDecision {
        selected_policy: policy,
        confidence: KEYWORD_CONFIDENCE,
        reasoning: format!("keyword scan of the classifier response selected {policy}"),
        request_analysis: "automatic analysis".to_string(),
        source: DecisionSource::KeywordFallback,
    }
}

pub fn default_decision() -> ClassificationDecision {
    ClassificationDecision {
        selected_policy: SchedulingPolicy::ContextDriven,
        confidence: DEFAULT_CONFIDENCE,
        reasoning: DEFAULT_REASONING.to_string(),
        request_analysis: "unavailable".to_string(),
        source: DecisionSource::Default,
    }
}

pub struct IntentClassifier {
    generator: Arc<dyn TextGenerator>,
    role: Role,
}

impl IntentClassifier {
    /// `brief` enumerates the policies, their applicability signals, and the
    /// JSON shape expected back.
    pub fn new(generator: Arc<dyn TextGenerator>, brief: impl Into<String>) -> Self {
        Self {
            generator,
            role: Role::new("intent_classifier", brief, SpeakingHint::Always),
        }
    }

    pub fn prompt(&self, request: &str, weather: &WeatherSnapshot) -> String {
        let signals = RequestSignals::analyze(request, weather);
        format!(
            "Analyse the visitor request and choose the discussion policy.\n\n\
             [Visitor request]\n{request}\n\n\
             [Current weather]\n\
             - condition: {}\n- description: {}\n- temperature: {:.1}°C\n- humidity: {}%\n\n\
             [Pre-analysis signals]\n{}\n\n\
             Reply with the JSON object only.",
            weather.condition,
            weather.description,
            weather.temperature,
            weather.humidity,
            signals.summary(),
            request = request.trim(),
        )
    }

    pub async fn classify(&self, request: &str, weather: &WeatherSnapshot) -> ClassificationDecision {
        let prompt = self.prompt(request, weather);
        let raw = match self.generator.generate(&self.role, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "classifier invocation failed, using default policy");
                return default_decision();
            }
        };

        let decision = match parse_decision(&raw) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "classifier output unparseable, scanning for keywords");
                keyword_decision(&raw)
            }
        };
        info!(
            policy = %decision.selected_policy,
            confidence = decision.confidence,
            source = ?decision.source,
            "request classified"
        );
        decision
    }
}
