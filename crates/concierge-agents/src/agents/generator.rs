//! Rig-backed text generation for panel roles.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rig::agent::Agent;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;
use tracing::debug;

use coordination::{GenerationError, Role, TextGenerator};

/// Type alias for agents built from OpenAI-compatible endpoints.
pub type OaiAgent = Agent<openai::completion::CompletionModel>;

/// Build an agent for one role: its identity as the agent name and its brief
/// as the preamble.
pub fn build_role_agent(
    client: &openai::CompletionsClient,
    model: &str,
    role: &Role,
    temperature: f64,
) -> OaiAgent {
    client
        .agent(model)
        .name(&role.identity)
        .preamble(&role.brief)
        .temperature(temperature)
        .build()
}

/// [`TextGenerator`] that prompts a freshly built rig agent per invocation.
///
/// Agents are cheap to build and carry no history, so every invocation sees
/// exactly the context string it is given.
pub struct RigTextGenerator {
    client: Arc<openai::CompletionsClient>,
    model: String,
    temperature: f64,
    timeout: Duration,
}

impl RigTextGenerator {
    pub fn new(
        client: Arc<openai::CompletionsClient>,
        model: impl Into<String>,
        temperature: f64,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            timeout,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

#[async_trait]
impl TextGenerator for RigTextGenerator {
    async fn generate(&self, role: &Role, context: &str) -> Result<String, GenerationError> {
        let agent = build_role_agent(&self.client, &self.model, role, self.temperature);
        let start = Instant::now();

        let response = tokio::time::timeout(self.timeout, async { agent.prompt(context).await })
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| GenerationError::Inference(e.to_string()))?;

        debug!(
            role = %role.identity,
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = response.len(),
            "role responded"
        );
        Ok(response)
    }
}
