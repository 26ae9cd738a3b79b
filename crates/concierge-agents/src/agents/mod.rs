//! Agent wiring for the concierge panels.
//!
//! The `AgentFactory` owns the completions client and hands out the
//! capabilities the session orchestrator needs: a role generator, a
//! low-temperature classifier generator, and an LLM speaker selector.

pub mod generator;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rig::providers::openai;

use coordination::{GeneratorSelector, SpeakerSelector, TextGenerator};

use crate::config::ConciergeConfig;
pub use generator::{build_role_agent, OaiAgent, RigTextGenerator};

pub struct AgentFactory {
    pub client: Arc<openai::CompletionsClient>,
    pub config: ConciergeConfig,
}

impl AgentFactory {
    pub fn new(config: &ConciergeConfig) -> Result<Self> {
        let client = Arc::new(config.client()?);
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    /// Generator used by every panel role.
    pub fn role_generator(&self) -> Arc<dyn TextGenerator> {
        Arc::new(RigTextGenerator::new(
            self.client.clone(),
            &self.config.model,
            self.config.role_temperature,
            self.timeout(),
        ))
    }

    /// Generator used by the intent classifier.
    pub fn classifier_generator(&self) -> Arc<dyn TextGenerator> {
        Arc::new(RigTextGenerator::new(
            self.client.clone(),
            &self.config.model,
            self.config.classifier_temperature,
            self.timeout(),
        ))
    }

    /// Speaker selection for context-driven panels, run at classifier
    /// temperature.
    pub fn speaker_selector(&self) -> Arc<dyn SpeakerSelector> {
        Arc::new(GeneratorSelector::new(self.classifier_generator()))
    }
}
