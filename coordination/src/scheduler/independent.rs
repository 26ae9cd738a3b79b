//! Independent-then-synthesize scheduling.
//!
//! Phase 1 invokes every contributor with the preamble alone, so no
//! contributor sees another's output. Phase 2 hands the preamble plus every
//! successful contribution (in roster order) to the synthesizer. A failed
//! contributor is recorded as missing and does not abort the run.
//!
//! Phase 1 may run concurrently (bounded by `independent_parallelism`);
//! results are reassembled in roster order before anything is recorded, so
//! the transcript is identical to a sequential run.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::{
    contains_token, GenerationError, SchedulerConfig, SchedulerError, SchedulerRun,
    SchedulingPolicy, TerminationReason, TextGenerator,
};
use crate::context::DiscussionContext;
use crate::roles::{validate_roster, Role};

type Contribution = Result<String, GenerationError>;

pub struct IndependentScheduler {
    generator: Arc<dyn TextGenerator>,
    parallelism: usize,
    terminal_token: String,
}

impl IndependentScheduler {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &SchedulerConfig) -> Self {
        Self {
            generator,
            parallelism: config.independent_parallelism.max(1),
            terminal_token: config.terminal_token.clone(),
        }
    }

    /// Run both phases. The round budget is always `contributors.len() + 1`.
    pub async fn run(
        &self,
        contributors: &[Role],
        synthesizer: &Role,
        preamble: &str,
    ) -> Result<SchedulerRun, SchedulerError> {
        let mut roster = contributors.to_vec();
        roster.push(synthesizer.clone());
        validate_roster(contributors)?;
        validate_roster(&roster)?;

        let synth_round = contributors.len() as u32 + 1;
        let mut run = SchedulerRun::start(
            SchedulingPolicy::IndependentSynthesize,
            &roster,
            synth_round,
        );
        info!(
            run_id = %run.id(),
            contributors = contributors.len(),
            parallelism = self.parallelism,
            "independent phase started"
        );

        let contributions = if self.parallelism > 1 && contributors.len() > 1 {
            self.gather_concurrent(contributors, preamble).await
        } else {
            self.gather_sequential(contributors, preamble).await
        };

        for (idx, (role, outcome)) in contributors.iter().zip(contributions).enumerate() {
            let round = idx as u32 + 1;
            match outcome {
                Ok(text) => {
                    run.record(&role.identity, text, round)?;
                    debug!(round, speaker = %role.identity, "contribution recorded");
                }
                Err(e) => {
                    warn!(round, speaker = %role.identity, error = %e, "contribution missing");
                    run.record_missing(&role.identity, round, e.to_string())?;
                }
            }
        }

        if run.transcript().is_empty() {
            return Err(SchedulerError::NoContributions);
        }

        let context = DiscussionContext::new(preamble, run.transcript()).render();
        let text = self
            .generator
            .generate(synthesizer, &context)
            .await
            .map_err(|source| SchedulerError::Invocation {
                role: synthesizer.identity.clone(),
                round: synth_round,
                source,
            })?;

        let reason = if contains_token(&text, &self.terminal_token) {
            TerminationReason::ExplicitSignal
        } else {
            TerminationReason::RoundBudgetExhausted
        };
        run.record(&synthesizer.identity, text, synth_round)?;
        run.terminate(reason);
        info!(summary = %run.summary(), "synthesis complete");
        Ok(run)
    }

    async fn gather_sequential(&self, contributors: &[Role], preamble: &str) -> Vec<Contribution> {
        let mut out = Vec::with_capacity(contributors.len());
        for role in contributors {
            out.push(self.generator.generate(role, preamble).await);
        }
        out
    }

    async fn gather_concurrent(&self, contributors: &[Role], preamble: &str) -> Vec<Contribution> {
        let sem = Arc::new(Semaphore::new(self.parallelism));
        let preamble: Arc<str> = Arc::from(preamble);
        let mut join_set: JoinSet<(usize, Contribution)> = JoinSet::new();

        for (idx, role) in contributors.iter().cloned().enumerate() {
            let sem = sem.clone();
            let generator = self.generator.clone();
            let preamble = preamble.clone();
            join_set.spawn(async move {
                let _permit = match sem.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            idx,
                            Err(GenerationError::Inference("worker pool closed".into())),
                        )
                    }
                };
                (idx, generator.generate(&role, &preamble).await)
            });
        }

        let mut slots: Vec<Option<Contribution>> = vec![None; contributors.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, outcome)) => slots[idx] = Some(outcome),
                Err(e) => warn!(error = %e, "contributor task panicked"),
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(GenerationError::Inference("contributor task aborted".into()))
                })
            })
            .collect()
    }
}
