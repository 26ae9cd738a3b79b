//! Concierge discussion core.
//!
//! Deterministic building blocks for a panel of advisory roles that answer a
//! visitor's request in the Takeshiba Port City complex:
//!
//! - tenant directory and weather snapshot (read-only session inputs)
//! - preamble construction and the append-only transcript
//! - three scheduling policies: fixed-order, context-driven,
//!   independent-then-synthesize
//! - the intent classifier that picks a policy for a request
//!
//! Nothing here talks to the network. Text generation and speaker selection
//! come in through the [`TextGenerator`] and [`SpeakerSelector`] traits.

#![allow(clippy::uninlined_format_args)]

pub mod context;
pub mod directory;
pub mod roles;
pub mod router;
pub mod scheduler;
pub mod transcript;
pub mod weather;

pub use context::{DiscussionContext, Preamble};
pub use directory::{DirectorySection, TenantDirectory, Venue};
pub use roles::{Role, SpeakingHint};
pub use transcript::{Transcript, TranscriptError, Utterance};
pub use weather::{Condition, WeatherSnapshot};

// Re-export scheduler types
pub use scheduler::{
    ContextDrivenScheduler, FixedOrderScheduler, GenerationError, GeneratorSelector,
    IndependentScheduler, MissingContribution, SchedulerConfig, SchedulerError, SchedulerRun,
    SchedulingPolicy, SpeakerSelector, TerminationReason, TextGenerator,
};

// Re-export classifier types
pub use router::{ClassificationDecision, DecisionSource, IntentClassifier, RequestSignals};
