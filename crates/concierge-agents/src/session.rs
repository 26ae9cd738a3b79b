//! Session orchestration: one visitor request, end to end.
//!
//! ```text
//! weather → request → [classifier] → roster + preamble → scheduler → report
//! ```
//!
//! All collaborators are injected through [`SessionDeps`]; nothing here reads
//! globals or environment variables.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use coordination::{
    ClassificationDecision, ContextDrivenScheduler, FixedOrderScheduler, IndependentScheduler,
    IntentClassifier, Preamble, SchedulerConfig, SchedulerError, SchedulerRun, SchedulingPolicy,
    SpeakerSelector, TenantDirectory, TextGenerator, WeatherSnapshot,
};

use crate::prompts;
use crate::rosters::Roster;
use crate::weather::WeatherSource;

/// Where the visitor's request comes from when no override is given.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestSource: Send + Sync {
    async fn read_request(&self) -> anyhow::Result<String>;
}

/// Request source for non-interactive runs that must supply an override.
pub struct NoRequestSource;

#[async_trait]
impl RequestSource for NoRequestSource {
    async fn read_request(&self) -> anyhow::Result<String> {
        anyhow::bail!("no request source configured; pass the request explicitly")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyChoice {
    /// Run this policy directly.
    Fixed(SchedulingPolicy),
    /// Let the intent classifier pick.
    Auto,
}

impl fmt::Display for PolicyChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(p) => write!(f, "{p}"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Classification used by callers to decide whether to offer a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCategory {
    /// A role or the classifier failed; another policy may succeed.
    AlternatePolicy,
    /// Reading the request failed; asking again may succeed.
    Transient,
    /// The request itself is unusable.
    InvalidInput,
    /// Roster or scheduler configuration is broken; retrying will not help.
    Configuration,
}

impl RetryCategory {
    pub fn is_retriable(self) -> bool {
        matches!(self, Self::AlternatePolicy | Self::Transient)
    }
}

impl fmt::Display for RetryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlternatePolicy => write!(f, "alternate_policy"),
            Self::Transient => write!(f, "transient"),
            Self::InvalidInput => write!(f, "invalid_input"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{policy} discussion failed: {source}")]
    Scheduler {
        policy: SchedulingPolicy,
        #[source]
        source: SchedulerError,
    },
    #[error("could not read the visitor request: {0}")]
    Request(String),
    #[error("visitor request is empty")]
    EmptyRequest,
    #[error("invalid session configuration: {0}")]
    Configuration(#[source] SchedulerError),
}

impl SessionError {
    pub fn retry_category(&self) -> RetryCategory {
        match self {
            Self::Scheduler { source, .. } if source.is_capability_failure() => {
                RetryCategory::AlternatePolicy
            }
            Self::Scheduler { .. } | Self::Configuration(_) => RetryCategory::Configuration,
            Self::Request(_) => RetryCategory::Transient,
            Self::EmptyRequest => RetryCategory::InvalidInput,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.retry_category().is_retriable()
    }

    pub fn policy(&self) -> Option<SchedulingPolicy> {
        match self {
            Self::Scheduler { policy, .. } => Some(*policy),
            _ => None,
        }
    }
}

/// Injected collaborators.
pub struct SessionDeps {
    pub generator: Arc<dyn TextGenerator>,
    pub selector: Arc<dyn SpeakerSelector>,
    pub classifier: Arc<dyn TextGenerator>,
    pub weather: Arc<dyn WeatherSource>,
    pub requests: Arc<dyn RequestSource>,
}

/// Outcome of one successful session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_id: String,
    pub request: String,
    pub weather: WeatherSnapshot,
    /// Present in automatic mode.
    pub decision: Option<ClassificationDecision>,
    /// Policy that produced `run`.
    pub policy: SchedulingPolicy,
    /// Set when the first policy failed and the session fell back.
    pub fallback_from: Option<SchedulingPolicy>,
    pub run: SchedulerRun,
}

impl SessionReport {
    pub fn recommendation(&self) -> Option<&str> {
        self.run.final_utterance().map(|u| u.text.as_str())
    }
}

/// One policy's result in a comparison.
#[derive(Debug)]
pub struct ComparisonEntry {
    pub policy: SchedulingPolicy,
    pub outcome: Result<SchedulerRun, SchedulerError>,
}

#[derive(Debug)]
pub struct ComparisonReport {
    pub session_id: String,
    pub request: String,
    pub weather: WeatherSnapshot,
    pub entries: Vec<ComparisonEntry>,
}

impl ComparisonReport {
    pub fn successes(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_ok()).count()
    }
}

pub struct SessionOrchestrator {
    generator: Arc<dyn TextGenerator>,
    selector: Arc<dyn SpeakerSelector>,
    classifier: IntentClassifier,
    weather: Arc<dyn WeatherSource>,
    requests: Arc<dyn RequestSource>,
    directory: Arc<TenantDirectory>,
    scheduler: SchedulerConfig,
    city: String,
}

impl SessionOrchestrator {
    pub fn new(
        deps: SessionDeps,
        directory: Arc<TenantDirectory>,
        scheduler: SchedulerConfig,
        city: impl Into<String>,
    ) -> Result<Self, SessionError> {
        scheduler.validate().map_err(SessionError::Configuration)?;
        Ok(Self {
            generator: deps.generator,
            selector: deps.selector,
            classifier: IntentClassifier::new(deps.classifier, prompts::CLASSIFIER_BRIEF),
            weather: deps.weather,
            requests: deps.requests,
            directory,
            scheduler,
            city: city.into(),
        })
    }

    pub fn scheduler_config(&self) -> &SchedulerConfig {
        &self.scheduler
    }

    async fn resolve_request(&self, request: Option<&str>) -> Result<String, SessionError> {
        let raw = match request {
            Some(r) => r.to_string(),
            None => self
                .requests
                .read_request()
                .await
                .map_err(|e| SessionError::Request(format!("{e:#}")))?,
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyRequest);
        }
        Ok(trimmed.to_string())
    }

    /// Run one session. `request` overrides the request source when given.
    ///
    /// In automatic mode a capability failure under the classified policy is
    /// retried once with context-driven, using the same request.
    pub async fn run(
        &self,
        choice: PolicyChoice,
        request: Option<&str>,
    ) -> Result<SessionReport, SessionError> {
        let session_id = Uuid::new_v4().to_string();
        let weather = self.weather.current(&self.city).await;
        let request = self.resolve_request(request).await?;
        info!(
            session_id = %session_id,
            choice = %choice,
            weather = %weather.summary(),
            "session started"
        );

        let (policy, decision) = match choice {
            PolicyChoice::Fixed(policy) => (policy, None),
            PolicyChoice::Auto => {
                let decision = self.classifier.classify(&request, &weather).await;
                (decision.selected_policy, Some(decision))
            }
        };

        let (policy, fallback_from, run) = match self.run_policy(policy, &request, &weather).await
        {
            Ok(run) => (policy, None, run),
            Err(e)
                if choice == PolicyChoice::Auto
                    && e.is_capability_failure()
                    && policy != SchedulingPolicy::ContextDriven =>
            {
                warn!(
                    session_id = %session_id,
                    failed = %policy,
                    error = %e,
                    "classified policy failed, retrying with context_driven"
                );
                let fallback = SchedulingPolicy::ContextDriven;
                let run = self
                    .run_policy(fallback, &request, &weather)
                    .await
                    .map_err(|source| SessionError::Scheduler {
                        policy: fallback,
                        source,
                    })?;
                (fallback, Some(policy), run)
            }
            Err(source) => {
                error!(session_id = %session_id, policy = %policy, error = %source, "session failed");
                return Err(SessionError::Scheduler { policy, source });
            }
        };

        info!(session_id = %session_id, summary = %run.summary(), "session complete");
        Ok(SessionReport {
            session_id,
            request,
            weather,
            decision,
            policy,
            fallback_from,
            run,
        })
    }

    /// Run every policy against the same request and weather snapshot. A
    /// failing policy is recorded and does not stop the others.
    pub async fn compare(&self, request: Option<&str>) -> Result<ComparisonReport, SessionError> {
        let session_id = Uuid::new_v4().to_string();
        let weather = self.weather.current(&self.city).await;
        let request = self.resolve_request(request).await?;
        info!(session_id = %session_id, "comparison started");

        let mut entries = Vec::with_capacity(SchedulingPolicy::ALL.len());
        for policy in SchedulingPolicy::ALL {
            let outcome = self.run_policy(policy, &request, &weather).await;
            if let Err(e) = &outcome {
                warn!(session_id = %session_id, policy = %policy, error = %e, "policy failed during comparison");
            }
            entries.push(ComparisonEntry { policy, outcome });
        }

        Ok(ComparisonReport {
            session_id,
            request,
            weather,
            entries,
        })
    }

    /// Build the roster and preamble for `policy` and run its scheduler.
    pub async fn run_policy(
        &self,
        policy: SchedulingPolicy,
        request: &str,
        weather: &WeatherSnapshot,
    ) -> Result<SchedulerRun, SchedulerError> {
        let roster = Roster::for_policy(policy);
        let preamble = Preamble::new(weather, request, &self.directory)
            .with_instructions(roster.kickoff)
            .render();
        let max_rounds = self.scheduler.max_rounds_for(policy, roster.roles.len());
        if policy == SchedulingPolicy::FixedOrder && max_rounds > self.scheduler.fixed_order_max_rounds
        {
            warn!(
                configured = self.scheduler.fixed_order_max_rounds,
                effective = max_rounds,
                roster = roster.roles.len(),
                "fixed-order ceiling raised so every role speaks"
            );
        }
        info!(policy = %policy, roster = roster.roles.len(), max_rounds, "running panel");

        match policy {
            SchedulingPolicy::FixedOrder => {
                FixedOrderScheduler::new(self.generator.clone(), &self.scheduler)
                    .run(&roster.roles, &preamble, max_rounds)
                    .await
            }
            SchedulingPolicy::ContextDriven => {
                ContextDrivenScheduler::new(
                    self.generator.clone(),
                    self.selector.clone(),
                    roster.closing,
                    &self.scheduler,
                )
                .run(&roster.roles, &preamble, max_rounds)
                .await
            }
            SchedulingPolicy::IndependentSynthesize => {
                let synthesizer = roster
                    .closing_role()
                    .cloned()
                    .ok_or_else(|| SchedulerError::MissingIntegrationRole(roster.closing.into()))?;
                IndependentScheduler::new(self.generator.clone(), &self.scheduler)
                    .run(&roster.contributors(), &synthesizer, &preamble)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::FixedWeather;
    use coordination::{GenerationError, Role, Transcript};

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, role: &Role, _context: &str) -> Result<String, GenerationError> {
            Ok(format!("{} TERMINATE", role.identity))
        }
    }

    struct FirstCandidate;

    #[async_trait]
    impl SpeakerSelector for FirstCandidate {
        async fn select(
            &self,
            _preamble: &str,
            _transcript: &Transcript,
            candidates: &[Role],
        ) -> Result<String, GenerationError> {
            Ok(candidates[0].identity.clone())
        }
    }

    fn orchestrator(requests: Arc<dyn RequestSource>) -> SessionOrchestrator {
        SessionOrchestrator::new(
            SessionDeps {
                generator: Arc::new(EchoGenerator),
                selector: Arc::new(FirstCandidate),
                classifier: Arc::new(EchoGenerator),
                weather: Arc::new(FixedWeather(WeatherSnapshot::unconfigured())),
                requests,
            },
            Arc::new(TenantDirectory::takeshiba()),
            SchedulerConfig::default(),
            "Tokyo",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn reads_request_from_source_when_no_override() {
        let mut source = MockRequestSource::new();
        source
            .expect_read_request()
            .times(1)
            .returning(|| Ok("  lunch near the water  ".into()));

        let report = orchestrator(Arc::new(source))
            .run(PolicyChoice::Fixed(SchedulingPolicy::FixedOrder), None)
            .await
            .unwrap();
        assert_eq!(report.request, "lunch near the water");
    }

    #[tokio::test]
    async fn override_skips_request_source() {
        let mut source = MockRequestSource::new();
        source.expect_read_request().times(0);

        let report = orchestrator(Arc::new(source))
            .run(
                PolicyChoice::Fixed(SchedulingPolicy::FixedOrder),
                Some("shopping"),
            )
            .await
            .unwrap();
        assert_eq!(report.request, "shopping");
        // Coordinator's token is never reached: the first speaker already says it.
        assert_eq!(report.run.transcript().len(), 1);
    }

    #[tokio::test]
    async fn empty_and_failed_requests_are_rejected() {
        let orch = orchestrator(Arc::new(NoRequestSource));
        let empty = orch
            .run(PolicyChoice::Auto, Some("   "))
            .await
            .unwrap_err();
        assert!(matches!(empty, SessionError::EmptyRequest));
        assert_eq!(empty.retry_category(), RetryCategory::InvalidInput);

        let missing = orch.run(PolicyChoice::Auto, None).await.unwrap_err();
        assert!(matches!(missing, SessionError::Request(_)));
        assert!(missing.is_retriable());
    }

    #[test]
    fn invalid_scheduler_config_is_rejected() {
        let result = SessionOrchestrator::new(
            SessionDeps {
                generator: Arc::new(EchoGenerator),
                selector: Arc::new(FirstCandidate),
                classifier: Arc::new(EchoGenerator),
                weather: Arc::new(FixedWeather(WeatherSnapshot::unconfigured())),
                requests: Arc::new(NoRequestSource),
            },
            Arc::new(TenantDirectory::takeshiba()),
            SchedulerConfig {
                terminal_token: String::new(),
                ..Default::default()
            },
            "Tokyo",
        );
        assert!(matches!(result, Err(SessionError::Configuration(_))));
    }

    #[test]
    fn scheduler_errors_map_to_retry_categories() {
        let capability = SessionError::Scheduler {
            policy: SchedulingPolicy::FixedOrder,
            source: SchedulerError::NoContributions,
        };
        assert_eq!(capability.retry_category(), RetryCategory::AlternatePolicy);
        assert_eq!(capability.policy(), Some(SchedulingPolicy::FixedOrder));

        let broken = SessionError::Scheduler {
            policy: SchedulingPolicy::ContextDriven,
            source: SchedulerError::EmptyRoster,
        };
        assert_eq!(broken.retry_category(), RetryCategory::Configuration);
        assert!(!broken.is_retriable());
    }
}
