//! Context-driven scheduling: a selector picks each next speaker.
//!
//! The selector's raw output is resolved against the roster. Anything that
//! does not name exactly one member (unknown name, ambiguous text, selector
//! failure) falls back to the integration role for that round. The run ends
//! when the integration role emits the terminal token or the round ceiling is
//! reached.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{
    contains_token, GenerationError, SchedulerConfig, SchedulerError, SchedulerRun,
    SchedulingPolicy, SpeakerSelector, TerminationReason, TextGenerator,
};
use crate::context::DiscussionContext;
use crate::roles::{validate_roster, Role, SpeakingHint};
use crate::transcript::Transcript;

pub struct ContextDrivenScheduler {
    generator: Arc<dyn TextGenerator>,
    selector: Arc<dyn SpeakerSelector>,
    integration_role: String,
    terminal_token: String,
}

impl ContextDrivenScheduler {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        selector: Arc<dyn SpeakerSelector>,
        integration_role: impl Into<String>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            generator,
            selector,
            integration_role: integration_role.into(),
            terminal_token: config.terminal_token.clone(),
        }
    }

    pub fn integration_role(&self) -> &str {
        &self.integration_role
    }

    pub async fn run(
        &self,
        roles: &[Role],
        preamble: &str,
        max_rounds: u32,
    ) -> Result<SchedulerRun, SchedulerError> {
        validate_roster(roles)?;
        let integrator = roles
            .iter()
            .find(|r| r.identity == self.integration_role)
            .ok_or_else(|| SchedulerError::MissingIntegrationRole(self.integration_role.clone()))?;
        if max_rounds == 0 {
            return Err(SchedulerError::Configuration(
                "context-driven max_rounds must be at least 1".into(),
            ));
        }

        let mut run = SchedulerRun::start(SchedulingPolicy::ContextDriven, roles, max_rounds);
        info!(
            run_id = %run.id(),
            roster = roles.len(),
            integrator = %integrator.identity,
            max_rounds,
            "context-driven discussion started"
        );

        for round in 1..=max_rounds {
            let role = match self.selector.select(preamble, run.transcript(), roles).await {
                Ok(raw) => match resolve_speaker(&raw, roles) {
                    Some(role) => role,
                    None => {
                        warn!(
                            round,
                            raw = %raw.trim(),
                            fallback = %integrator.identity,
                            "selection did not name a roster member"
                        );
                        integrator
                    }
                },
                Err(e) => {
                    warn!(
                        round,
                        error = %e,
                        fallback = %integrator.identity,
                        "speaker selection failed"
                    );
                    integrator
                }
            };

            let context = DiscussionContext::new(preamble, run.transcript()).render();
            let text = self
                .generator
                .generate(role, &context)
                .await
                .map_err(|source| SchedulerError::Invocation {
                    role: role.identity.clone(),
                    round,
                    source,
                })?;

            let done = role.identity == integrator.identity
                && contains_token(&text, &self.terminal_token);
            run.record(&role.identity, text, round)?;
            debug!(round, speaker = %role.identity, terminal = done, "utterance recorded");

            if done {
                run.terminate(TerminationReason::ExplicitSignal);
                info!(summary = %run.summary(), "context-driven discussion closed by integrator");
                return Ok(run);
            }
        }

        run.terminate(TerminationReason::RoundBudgetExhausted);
        info!(summary = %run.summary(), "context-driven discussion hit round ceiling");
        Ok(run)
    }
}

/// Resolve a raw selection to a single roster member.
///
/// An exact identity match (ignoring case, surrounding quotes, brackets and
/// markdown emphasis) wins. Otherwise the text must mention exactly one
/// identity; zero or several mentions resolve to `None`.
pub fn resolve_speaker<'a>(raw: &str, roles: &'a [Role]) -> Option<&'a Role> {
    let cleaned = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*' | '[' | ']' | '.' | ':'))
        .trim();
    if cleaned.is_empty() {
        return None;
    }
    if let Some(role) = roles
        .iter()
        .find(|r| r.identity.eq_ignore_ascii_case(cleaned))
    {
        return Some(role);
    }

    let lowered = cleaned.to_lowercase();
    let mut mentioned = roles
        .iter()
        .filter(|r| lowered.contains(&r.identity.to_lowercase()));
    match (mentioned.next(), mentioned.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// [`SpeakerSelector`] backed by a text generator acting as moderator.
pub struct GeneratorSelector {
    generator: Arc<dyn TextGenerator>,
    moderator: Role,
}

impl GeneratorSelector {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            moderator: Role::new(
                "moderator",
                "You moderate a panel of concierge specialists. Read the discussion and \
                 decide who should speak next. Reply with the speaker's name only.",
                SpeakingHint::Conditional,
            ),
        }
    }
}

#[async_trait]
impl SpeakerSelector for GeneratorSelector {
    async fn select(
        &self,
        preamble: &str,
        transcript: &Transcript,
        candidates: &[Role],
    ) -> Result<String, GenerationError> {
        let roster = candidates
            .iter()
            .map(|r| format!("- {} ({}): {}", r.identity, r.hint, r.summary()))
            .collect::<Vec<_>>()
            .join("\n");
        let names = candidates
            .iter()
            .map(|r| r.identity.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let context = format!(
            "{}\n\n[Panel]\n{roster}\n\nWho should speak next? Answer with exactly one of: {names}",
            DiscussionContext::new(preamble, transcript).render()
        );
        self.generator.generate(&self.moderator, &context).await
    }
}
