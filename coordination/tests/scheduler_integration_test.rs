//! Scheduler integration tests: all three policies driven by deterministic
//! stub generators and selectors (no inference endpoint).

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use coordination::{
    ContextDrivenScheduler, FixedOrderScheduler, GenerationError, IndependentScheduler, Role,
    SchedulerConfig, SpeakerSelector, SpeakingHint, TerminationReason, TextGenerator, Transcript,
};

/// Records every (speaker, context) pair and answers from a per-role script.
#[derive(Default)]
struct RecordingGenerator {
    calls: Mutex<Vec<(String, String)>>,
    fail: HashSet<String>,
    terminal_from: HashSet<String>,
    delay_ms: Vec<(String, u64)>,
}

impl RecordingGenerator {
    fn failing(mut self, role: &str) -> Self {
        self.fail.insert(role.to_string());
        self
    }

    fn terminating(mut self, role: &str) -> Self {
        self.terminal_from.insert(role.to_string());
        self
    }

    fn delayed(mut self, role: &str, ms: u64) -> Self {
        self.delay_ms.push((role.to_string(), ms));
        self
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn context_for(&self, role: &str) -> String {
        self.calls()
            .into_iter()
            .find(|(r, _)| r == role)
            .map(|(_, c)| c)
            .unwrap()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, role: &Role, context: &str) -> Result<String, GenerationError> {
        if let Some((_, ms)) = self.delay_ms.iter().find(|(r, _)| *r == role.identity) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        self.calls
            .lock()
            .unwrap()
            .push((role.identity.clone(), context.to_string()));
        if self.fail.contains(&role.identity) {
            return Err(GenerationError::Inference(format!("{} unavailable", role.identity)));
        }
        if self.terminal_from.contains(&role.identity) {
            return Ok(format!("<<{}>> final answer TERMINATE", role.identity));
        }
        Ok(format!("<<{}>> contribution", role.identity))
    }
}

/// Always answers with the same raw selection.
struct ConstantSelector(&'static str);

#[async_trait]
impl SpeakerSelector for ConstantSelector {
    async fn select(
        &self,
        _preamble: &str,
        _transcript: &Transcript,
        _candidates: &[Role],
    ) -> Result<String, GenerationError> {
        Ok(self.0.to_string())
    }
}

/// Cycles through arbitrary raw outputs, most of them garbage.
struct NoisySelector {
    outputs: Vec<&'static str>,
    cursor: Mutex<usize>,
}

#[async_trait]
impl SpeakerSelector for NoisySelector {
    async fn select(
        &self,
        _preamble: &str,
        transcript: &Transcript,
        candidates: &[Role],
    ) -> Result<String, GenerationError> {
        assert_eq!(candidates.len(), 4);
        assert!(transcript.len() < 20);
        let mut cursor = self.cursor.lock().unwrap();
        let out = self.outputs[*cursor % self.outputs.len()];
        *cursor += 1;
        Ok(out.to_string())
    }
}

fn roster(names: &[&str]) -> Vec<Role> {
    names
        .iter()
        .map(|n| Role::new(*n, format!("You are the {n}."), SpeakingHint::Always))
        .collect()
}

// ── Fixed-order ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_fixed_order_exhausts_budget_in_roster_cycle() {
    for n in 1..=5usize {
        let names: Vec<String> = (0..n).map(|i| format!("role{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let roles = roster(&refs);
        let max_rounds = n as u32 + 3;

        let generator = Arc::new(RecordingGenerator::default());
        let scheduler = FixedOrderScheduler::new(generator.clone(), &SchedulerConfig::default());
        let run = scheduler.run(&roles, "PREAMBLE", max_rounds).await.unwrap();

        assert_eq!(run.transcript().len(), max_rounds as usize);
        assert_eq!(
            run.termination_reason(),
            Some(TerminationReason::RoundBudgetExhausted)
        );
        for (i, u) in run.transcript().utterances().iter().enumerate() {
            assert_eq!(u.speaker, roles[i % n].identity);
            assert_eq!(u.round, i as u32 + 1);
        }
    }
}

#[tokio::test]
async fn test_fixed_order_stops_after_closing_token() {
    let roles = roster(&["weather", "guide", "shopping", "fun", "planner"]);
    let generator = Arc::new(RecordingGenerator::default().terminating("planner"));
    let scheduler = FixedOrderScheduler::new(generator.clone(), &SchedulerConfig::default());
    let run = scheduler.run(&roles, "PREAMBLE", 6).await.unwrap();

    assert_eq!(run.transcript().len(), 5);
    assert_eq!(
        run.termination_reason(),
        Some(TerminationReason::ExplicitSignal)
    );
    assert_eq!(run.final_utterance().unwrap().speaker, "planner");

    // Each speaker saw every earlier utterance.
    let planner_ctx = generator.context_for("planner");
    for earlier in ["weather", "guide", "shopping", "fun"] {
        assert!(planner_ctx.contains(&format!("<<{earlier}>> contribution")));
    }
    assert_eq!(generator.context_for("weather"), "PREAMBLE");
}

#[tokio::test]
async fn test_fixed_order_custom_terminal_token() {
    let roles = roster(&["a", "b"]);
    let config = SchedulerConfig {
        terminal_token: "<<b>>".into(),
        ..Default::default()
    };
    let scheduler = FixedOrderScheduler::new(Arc::new(RecordingGenerator::default()), &config);
    let run = scheduler.run(&roles, "P", 10).await.unwrap();
    assert_eq!(run.transcript().speakers(), ["a", "b"]);
}

// ── Context-driven ──────────────────────────────────────────────────

#[tokio::test]
async fn test_context_driven_speakers_always_in_roster() {
    let roles = roster(&["weather", "gourmet", "shopping", "concierge"]);
    let selector = NoisySelector {
        outputs: vec![
            "gourmet",
            "}{",
            "the barista",
            "",
            "SHOPPING",
            "weather and gourmet together",
            "I think weather should go next",
        ],
        cursor: Mutex::new(0),
    };
    let scheduler = ContextDrivenScheduler::new(
        Arc::new(RecordingGenerator::default()),
        Arc::new(selector),
        "concierge",
        &SchedulerConfig::default(),
    );
    let run = scheduler.run(&roles, "P", 7).await.unwrap();

    let members: HashSet<&str> = roles.iter().map(|r| r.identity.as_str()).collect();
    for speaker in run.transcript().speakers() {
        assert!(members.contains(speaker), "out-of-roster speaker {speaker}");
    }
    assert_eq!(
        run.transcript().speakers(),
        [
            "gourmet",
            "concierge",
            "concierge",
            "concierge",
            "shopping",
            "concierge",
            "weather"
        ]
    );
}

#[tokio::test]
async fn test_context_driven_repeats_speaker_until_budget() {
    let roles = roster(&["weather", "gourmet", "concierge"]);
    let scheduler = ContextDrivenScheduler::new(
        Arc::new(RecordingGenerator::default().terminating("gourmet")),
        Arc::new(ConstantSelector("gourmet")),
        "concierge",
        &SchedulerConfig::default(),
    );
    let run = scheduler.run(&roles, "P", 8).await.unwrap();

    // A non-integrator token does not end the run.
    assert_eq!(run.transcript().len(), 8);
    assert!(run.transcript().speakers().iter().all(|s| *s == "gourmet"));
    assert_eq!(
        run.termination_reason(),
        Some(TerminationReason::RoundBudgetExhausted)
    );
}

#[tokio::test]
async fn test_context_driven_failure_aborts() {
    let roles = roster(&["weather", "concierge"]);
    let scheduler = ContextDrivenScheduler::new(
        Arc::new(RecordingGenerator::default().failing("weather")),
        Arc::new(ConstantSelector("weather")),
        "concierge",
        &SchedulerConfig::default(),
    );
    let err = scheduler.run(&roles, "P", 8).await.unwrap_err();
    assert!(err.is_capability_failure());
    assert_eq!(err.failed_role(), Some("weather"));
}

// ── Independent-then-synthesize ─────────────────────────────────────

#[tokio::test]
async fn test_independent_contributions_are_context_blind() {
    let contributors = roster(&["active", "relax", "trend", "efficiency", "culture"]);
    let synth = Role::new("master", "Merge.", SpeakingHint::Closing);
    let generator = Arc::new(RecordingGenerator::default().terminating("master"));
    let scheduler = IndependentScheduler::new(generator.clone(), &SchedulerConfig::default());

    let run = scheduler
        .run(&contributors, &synth, "PREAMBLE")
        .await
        .unwrap();

    for c in &contributors {
        assert_eq!(generator.context_for(&c.identity), "PREAMBLE");
    }
    let synth_ctx = generator.context_for("master");
    for c in &contributors {
        assert!(synth_ctx.contains(&format!("<<{}>> contribution", c.identity)));
    }
    assert_eq!(run.transcript().len(), 6);
    assert_eq!(run.max_rounds(), 6);
    assert!(run.missing().is_empty());
}

#[tokio::test]
async fn test_independent_tolerates_single_failure() {
    let contributors = roster(&["active", "relax", "trend"]);
    let synth = Role::new("master", "Merge.", SpeakingHint::Closing);
    let generator = Arc::new(
        RecordingGenerator::default()
            .failing("relax")
            .terminating("master"),
    );
    let scheduler = IndependentScheduler::new(generator.clone(), &SchedulerConfig::default());

    let run = scheduler.run(&contributors, &synth, "P").await.unwrap();

    assert_eq!(run.transcript().speakers(), ["active", "trend", "master"]);
    assert_eq!(run.missing().len(), 1);
    assert_eq!(run.missing()[0].speaker, "relax");
    assert_eq!(run.missing()[0].round, 2);
    assert_eq!(
        run.termination_reason(),
        Some(TerminationReason::ExplicitSignal)
    );
    assert!(!generator.context_for("master").contains("<<relax>>"));
}

#[tokio::test]
async fn test_parallel_phase_reassembles_in_roster_order() {
    let contributors = roster(&["slow", "medium", "fast"]);
    let synth = Role::new("master", "Merge.", SpeakingHint::Closing);
    let generator = Arc::new(
        RecordingGenerator::default()
            .delayed("slow", 60)
            .delayed("medium", 30)
            .terminating("master"),
    );
    let config = SchedulerConfig {
        independent_parallelism: 3,
        ..Default::default()
    };
    let scheduler = IndependentScheduler::new(generator.clone(), &config);

    let run = scheduler.run(&contributors, &synth, "P").await.unwrap();

    // Completion order differs from roster order...
    let completion: Vec<String> = generator.calls().into_iter().map(|(r, _)| r).collect();
    assert_eq!(completion[0], "fast");
    // ...but the transcript does not.
    assert_eq!(
        run.transcript().speakers(),
        ["slow", "medium", "fast", "master"]
    );
    let rounds: Vec<u32> = run.transcript().utterances().iter().map(|u| u.round).collect();
    assert_eq!(rounds, [1, 2, 3, 4]);

    let synth_ctx = generator.context_for("master");
    let slow = synth_ctx.find("<<slow>>").unwrap();
    let fast = synth_ctx.find("<<fast>>").unwrap();
    assert!(slow < fast);
}
