//! Fixed-order (round-robin) scheduling.

use std::sync::Arc;

use tracing::{debug, info};

use super::{
    contains_token, SchedulerConfig, SchedulerError, SchedulerRun, SchedulingPolicy,
    TerminationReason, TextGenerator,
};
use crate::context::DiscussionContext;
use crate::roles::{validate_roster, Role};

/// Visits the roster in order, wrapping around, until a speaker emits the
/// terminal token or `max_rounds` utterances have been produced.
///
/// Round `r` invokes `roles[(r - 1) % N]` with the preamble plus the whole
/// transcript. Any invocation failure aborts the run.
pub struct FixedOrderScheduler {
    generator: Arc<dyn TextGenerator>,
    terminal_token: String,
}

impl FixedOrderScheduler {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &SchedulerConfig) -> Self {
        Self {
            generator,
            terminal_token: config.terminal_token.clone(),
        }
    }

    pub async fn run(
        &self,
        roles: &[Role],
        preamble: &str,
        max_rounds: u32,
    ) -> Result<SchedulerRun, SchedulerError> {
        validate_roster(roles)?;
        if max_rounds == 0 {
            return Err(SchedulerError::Configuration(
                "fixed-order max_rounds must be at least 1".into(),
            ));
        }

        let mut run = SchedulerRun::start(SchedulingPolicy::FixedOrder, roles, max_rounds);
        info!(
            run_id = %run.id(),
            roster = roles.len(),
            max_rounds,
            "fixed-order discussion started"
        );

        for round in 1..=max_rounds {
            let role = &roles[(round as usize - 1) % roles.len()];
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

            let done = contains_token(&text, &self.terminal_token);
            run.record(&role.identity, text, round)?;
            debug!(round, speaker = %role.identity, terminal = done, "utterance recorded");

            if done {
                run.terminate(TerminationReason::ExplicitSignal);
                info!(summary = %run.summary(), "fixed-order discussion ended by terminal token");
                return Ok(run);
            }
        }

        run.terminate(TerminationReason::RoundBudgetExhausted);
        info!(summary = %run.summary(), "fixed-order discussion hit round ceiling");
        Ok(run)
    }
}
