//! Advisory roles: named identities with a static behavioural brief.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::scheduler::SchedulerError;

/// When a role is expected to take the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakingHint {
    /// Speaks every round it is scheduled.
    Always,
    /// Speaks only when the discussion touches its area.
    Conditional,
    /// Speaks last and merges what came before.
    Closing,
}

impl std::fmt::Display for SpeakingHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::Conditional => write!(f, "conditional"),
            Self::Closing => write!(f, "closing"),
        }
    }
}

/// An addressable advisory identity.
///
/// Roles are passive: they produce text only when a scheduler invokes them,
/// and carry no state between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique within a session.
    pub identity: String,
    /// Instructions defining the role's expertise and when it should speak.
    pub brief: String,
    pub hint: SpeakingHint,
}

impl Role {
    pub fn new(identity: impl Into<String>, brief: impl Into<String>, hint: SpeakingHint) -> Self {
        Self {
            identity: identity.into(),
            brief: brief.into(),
            hint,
        }
    }

    /// First line of the brief, used when listing candidates for selection.
    pub fn summary(&self) -> &str {
        self.brief
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or(self.identity.as_str())
    }
}

/// Reject empty rosters and duplicate identities.
pub fn validate_roster(roles: &[Role]) -> Result<(), SchedulerError> {
    if roles.is_empty() {
        return Err(SchedulerError::EmptyRoster);
    }
    let mut seen = HashSet::with_capacity(roles.len());
    for role in roles {
        if !seen.insert(role.identity.as_str()) {
            return Err(SchedulerError::DuplicateRole(role.identity.clone()));
        }
    }
    Ok(())
}
