//! Static policy → roster bindings.
//!
//! Each scheduling policy gets its own panel. The fixed-order panel follows a
//! narrative sequence, the context-driven panel covers topical specialties
//! plus an integrator, and the independent panel spans deliberately distinct
//! viewpoints plus a synthesizer.

use coordination::{Role, SchedulingPolicy, SpeakingHint};

use crate::prompts::{self, with_house_rules};

pub const DAY_PLAN_COORDINATOR: &str = "day_plan_coordinator";
pub const LIFESTYLE_CONCIERGE: &str = "lifestyle_concierge";
pub const MASTER_SYNTHESIZER: &str = "master_synthesizer";

#[derive(Debug, Clone)]
pub struct Roster {
    pub policy: SchedulingPolicy,
    /// Speaking order for fixed-order; candidate set for context-driven;
    /// contributors followed by the synthesizer for independent.
    pub roles: Vec<Role>,
    /// Integrator (context-driven) or synthesizer (independent) or the last
    /// speaker (fixed-order).
    pub closing: &'static str,
    pub kickoff: &'static str,
}

impl Roster {
    pub fn for_policy(policy: SchedulingPolicy) -> Self {
        match policy {
            SchedulingPolicy::FixedOrder => Self::fixed_order(),
            SchedulingPolicy::ContextDriven => Self::context_driven(),
            SchedulingPolicy::IndependentSynthesize => Self::independent_synthesize(),
        }
    }

    pub fn fixed_order() -> Self {
        Self {
            policy: SchedulingPolicy::FixedOrder,
            roles: vec![
                role("weather_analyst", prompts::WEATHER_ANALYST, SpeakingHint::Always),
                role("facility_guide", prompts::FACILITY_GUIDE, SpeakingHint::Always),
                role(
                    "shopping_specialist",
                    prompts::SHOPPING_SPECIALIST,
                    SpeakingHint::Always,
                ),
                role(
                    "entertainment_specialist",
                    prompts::ENTERTAINMENT_SPECIALIST,
                    SpeakingHint::Always,
                ),
                role(
                    DAY_PLAN_COORDINATOR,
                    prompts::DAY_PLAN_COORDINATOR,
                    SpeakingHint::Closing,
                ),
            ],
            closing: DAY_PLAN_COORDINATOR,
            kickoff: prompts::FIXED_ORDER_KICKOFF,
        }
    }

    pub fn context_driven() -> Self {
        Self {
            policy: SchedulingPolicy::ContextDriven,
            roles: vec![
                role(
                    "weather_consultant",
                    prompts::WEATHER_CONSULTANT,
                    SpeakingHint::Conditional,
                ),
                role(
                    "gourmet_specialist",
                    prompts::GOURMET_SPECIALIST,
                    SpeakingHint::Conditional,
                ),
                role(
                    "shopping_advisor",
                    prompts::SHOPPING_ADVISOR,
                    SpeakingHint::Conditional,
                ),
                role(
                    "entertainment_producer",
                    prompts::ENTERTAINMENT_PRODUCER,
                    SpeakingHint::Conditional,
                ),
                role(
                    "relaxation_expert",
                    prompts::RELAXATION_EXPERT,
                    SpeakingHint::Conditional,
                ),
                role(
                    LIFESTYLE_CONCIERGE,
                    prompts::LIFESTYLE_CONCIERGE,
                    SpeakingHint::Closing,
                ),
            ],
            closing: LIFESTYLE_CONCIERGE,
            kickoff: prompts::CONTEXT_DRIVEN_KICKOFF,
        }
    }

    pub fn independent_synthesize() -> Self {
        Self {
            policy: SchedulingPolicy::IndependentSynthesize,
            roles: vec![
                role(
                    "active_experience_researcher",
                    prompts::ACTIVE_EXPERIENCE_RESEARCHER,
                    SpeakingHint::Always,
                ),
                role(
                    "relaxation_curator",
                    prompts::RELAXATION_CURATOR,
                    SpeakingHint::Always,
                ),
                role("trend_innovator", prompts::TREND_INNOVATOR, SpeakingHint::Always),
                role(
                    "efficiency_expert",
                    prompts::EFFICIENCY_EXPERT,
                    SpeakingHint::Always,
                ),
                role(
                    "culture_gourmet_explorer",
                    prompts::CULTURE_GOURMET_EXPLORER,
                    SpeakingHint::Always,
                ),
                role(
                    MASTER_SYNTHESIZER,
                    prompts::MASTER_SYNTHESIZER,
                    SpeakingHint::Closing,
                ),
            ],
            closing: MASTER_SYNTHESIZER,
            kickoff: prompts::INDEPENDENT_KICKOFF,
        }
    }

    pub fn closing_role(&self) -> Option<&Role> {
        self.roles.iter().find(|r| r.identity == self.closing)
    }

    /// Every role except the closing one, in roster order.
    pub fn contributors(&self) -> Vec<Role> {
        self.roles
            .iter()
            .filter(|r| r.identity != self.closing)
            .cloned()
            .collect()
    }
}

fn role(identity: &str, brief: &str, hint: SpeakingHint) -> Role {
    Role::new(identity, with_house_rules(brief), hint)
}
