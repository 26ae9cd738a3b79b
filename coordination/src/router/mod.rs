//! Policy routing: request pre-analysis and the intent classifier.

pub mod classifier;
pub mod signals;

pub use classifier::{
    default_decision, keyword_decision, parse_decision, ClassificationDecision,
    ClassificationParseError, DecisionSource, IntentClassifier,
};
pub use signals::RequestSignals;
