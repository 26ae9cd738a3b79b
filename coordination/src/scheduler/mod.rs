//! Discussion scheduling: who speaks, in what order, and when to stop.
//!
//! # Policies
//!
//! ```text
//! FixedOrder            r1:A  r2:B  r3:C  r4:A ...   stop on token | max_rounds
//! ContextDriven         selector picks each round   stop when integrator emits token | max_rounds
//! IndependentSynthesize A,B,C see preamble only ─┐
//!                                                 └─> synthesizer sees all → stop
//! ```
//!
//! All three record into a [`SchedulerRun`], whose transcript is append-only
//! and frozen once the run terminates. Text generation and speaker selection
//! are injected through the [`TextGenerator`] and [`SpeakerSelector`] seams so
//! the loops can be driven by deterministic stubs in tests.

pub mod context_driven;
pub mod fixed_order;
pub mod independent;

pub use context_driven::{resolve_speaker, ContextDrivenScheduler, GeneratorSelector};
pub use fixed_order::FixedOrderScheduler;
pub use independent::IndependentScheduler;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::roles::Role;
use crate::transcript::{Transcript, TranscriptError, Utterance};

/// Default marker a role emits to end the discussion.
pub const DEFAULT_TERMINAL_TOKEN: &str = "TERMINATE";

// ── Policy ──────────────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingPolicy {
    /// Statically ordered round-robin over the roster.
    #[serde(alias = "round_robin")]
    #[value(alias = "round-robin")]
    FixedOrder,
    /// A selector picks the most relevant next speaker each round.
    #[serde(alias = "selector")]
    #[value(alias = "selector")]
    ContextDriven,
    /// Context-blind independent contributions merged by a synthesizer.
    #[serde(alias = "swarm")]
    #[value(alias = "swarm")]
    IndependentSynthesize,
}

impl SchedulingPolicy {
    pub const ALL: [SchedulingPolicy; 3] = [
        Self::FixedOrder,
        Self::ContextDriven,
        Self::IndependentSynthesize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FixedOrder => "fixed_order",
            Self::ContextDriven => "context_driven",
            Self::IndependentSynthesize => "independent_synthesize",
        }
    }

    /// Accepts canonical names, hyphenated forms, and the legacy
    /// `round_robin` / `selector` / `swarm` labels.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "fixed_order" | "round_robin" => Some(Self::FixedOrder),
            "context_driven" | "selector" => Some(Self::ContextDriven),
            "independent_synthesize" | "independent" | "swarm" => {
                Some(Self::IndependentSynthesize)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SchedulingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown scheduling policy: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    ExplicitSignal,
    RoundBudgetExhausted,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExplicitSignal => write!(f, "explicit_signal"),
            Self::RoundBudgetExhausted => write!(f, "round_budget_exhausted"),
        }
    }
}

// ── Seams ───────────────────────────────────────────────────────────────────

/// Failure of the external text-generation capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("inference failure: {0}")]
    Inference(String),
    #[error("inference timed out after {0}s")]
    Timeout(u64),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GenerationError {
    /// Whether the same call might succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Inference(_) | Self::Timeout(_))
    }
}

/// Produces one role's utterance from its brief and the accumulated context.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, role: &Role, context: &str) -> Result<String, GenerationError>;
}

/// Picks the next speaker for a context-driven discussion.
///
/// Receives the preamble, the transcript so far, and every candidate's brief;
/// returns the raw selection. The scheduler resolves the raw output against
/// the roster, so implementations may return free text.
#[async_trait]
pub trait SpeakerSelector: Send + Sync {
    async fn select(
        &self,
        preamble: &str,
        transcript: &Transcript,
        candidates: &[Role],
    ) -> Result<String, GenerationError>;
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("role `{role}` failed in round {round}: {source}")]
    Invocation {
        role: String,
        round: u32,
        #[source]
        source: GenerationError,
    },
    #[error("role roster is empty")]
    EmptyRoster,
    #[error("duplicate role identity `{0}`")]
    DuplicateRole(String),
    #[error("integration role `{0}` is not in the roster")]
    MissingIntegrationRole(String),
    #[error("invalid scheduler configuration: {0}")]
    Configuration(String),
    #[error("every independent contributor failed; nothing to synthesize")]
    NoContributions,
    #[error("run {0} is already terminated")]
    AlreadyTerminated(String),
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

impl SchedulerError {
    /// Failures caused by the text-generation capability rather than by a
    /// malformed roster or configuration. These are the ones worth retrying
    /// under a different policy.
    pub fn is_capability_failure(&self) -> bool {
        matches!(self, Self::Invocation { .. } | Self::NoContributions)
    }

    pub fn failed_role(&self) -> Option<&str> {
        match self {
            Self::Invocation { role, .. } => Some(role),
            _ => None,
        }
    }
}

// ── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Marker that ends a discussion when found in an utterance.
    pub terminal_token: String,
    /// Round ceiling for fixed-order runs. Raised to roster size + 1 when
    /// lower, so the closing role always gets its turn.
    pub fixed_order_max_rounds: u32,
    pub context_driven_max_rounds: u32,
    /// Concurrent phase-1 invocations for independent runs. 1 = sequential.
    pub independent_parallelism: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            terminal_token: DEFAULT_TERMINAL_TOKEN.to_string(),
            fixed_order_max_rounds: 6,
            context_driven_max_rounds: 8,
            independent_parallelism: 1,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.terminal_token.trim().is_empty() {
            return Err(SchedulerError::Configuration(
                "terminal token must not be blank".into(),
            ));
        }
        if self.fixed_order_max_rounds == 0 || self.context_driven_max_rounds == 0 {
            return Err(SchedulerError::Configuration(
                "round ceilings must be at least 1".into(),
            ));
        }
        if self.independent_parallelism == 0 {
            return Err(SchedulerError::Configuration(
                "independent parallelism must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Effective round ceiling for `policy` over a roster of `roster_len`
    /// roles, closing role included.
    ///
    /// Fixed-order never goes below `roster_len + 1`, so every role speaks
    /// at least once. Independent runs are exactly one round per role.
    pub fn max_rounds_for(&self, policy: SchedulingPolicy, roster_len: usize) -> u32 {
        let roster_len = roster_len as u32;
        match policy {
            SchedulingPolicy::FixedOrder => self.fixed_order_max_rounds.max(roster_len + 1),
            SchedulingPolicy::ContextDriven => self.context_driven_max_rounds,
            SchedulingPolicy::IndependentSynthesize => roster_len,
        }
    }
}

pub(crate) fn contains_token(text: &str, token: &str) -> bool {
    text.contains(token)
}

// ── Run record ──────────────────────────────────────────────────────────────

/// A contribution that was expected but never produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingContribution {
    pub speaker: String,
    pub round: u32,
    pub reason: String,
}

/// One discussion, from first invocation to termination.
///
/// Mutated utterance-by-utterance by a scheduling loop; once
/// [`is_terminated`](Self::is_terminated) is true every further mutation is
/// rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerRun {
    id: String,
    policy: SchedulingPolicy,
    roles: Vec<String>,
    max_rounds: u32,
    transcript: Transcript,
    missing: Vec<MissingContribution>,
    terminated: bool,
    termination_reason: Option<TerminationReason>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl SchedulerRun {
    pub(crate) fn start(policy: SchedulingPolicy, roles: &[Role], max_rounds: u32) -> Self {
        let identities: Vec<String> = roles.iter().map(|r| r.identity.clone()).collect();
        Self {
            id: Uuid::new_v4().to_string(),
            policy,
            transcript: Transcript::new(identities.clone()),
            roles: identities,
            max_rounds,
            missing: Vec::new(),
            terminated: false,
            termination_reason: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub(crate) fn record(
        &mut self,
        speaker: &str,
        text: impl Into<String>,
        round: u32,
    ) -> Result<&Utterance, SchedulerError> {
        if self.terminated {
            return Err(SchedulerError::AlreadyTerminated(self.id.clone()));
        }
        Ok(self.transcript.append(speaker, text, round)?)
    }

    pub(crate) fn record_missing(
        &mut self,
        speaker: &str,
        round: u32,
        reason: impl Into<String>,
    ) -> Result<(), SchedulerError> {
        if self.terminated {
            return Err(SchedulerError::AlreadyTerminated(self.id.clone()));
        }
        self.missing.push(MissingContribution {
            speaker: speaker.to_string(),
            round,
            reason: reason.into(),
        });
        Ok(())
    }

    pub(crate) fn terminate(&mut self, reason: TerminationReason) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.termination_reason = Some(reason);
        self.finished_at = Some(Utc::now());
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn policy(&self) -> SchedulingPolicy {
        self.policy
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn missing(&self) -> &[MissingContribution] {
        &self.missing
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.termination_reason
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// The last thing said, normally the recommendation.
    pub fn final_utterance(&self) -> Option<&Utterance> {
        self.transcript.last()
    }

    pub fn elapsed_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let reason = self
            .termination_reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "running".to_string());
        format!(
            "[{}] {}: {} utterance(s) / {} max, {} missing, {}",
            &self.id[..8.min(self.id.len())],
            self.policy,
            self.transcript.len(),
            self.max_rounds,
            self.missing.len(),
            reason
        )
    }
}
