//! Append-only transcript of a single discussion.
//!
//! Owned by exactly one scheduler run. Two invariants are enforced on every
//! append: the speaker belongs to the run's role set, and round indices never
//! decrease.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("speaker `{0}` is not a member of the active role set")]
    UnknownSpeaker(String),
    #[error("round index went backwards: last {last}, attempted {attempted}")]
    RoundRegression { last: u32, attempted: u32 },
}

/// One contribution to the discussion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: String,
    pub text: String,
    /// 1-indexed.
    pub round: u32,
    pub spoken_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    members: Vec<String>,
    utterances: Vec<Utterance>,
}

impl Transcript {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
            utterances: Vec::new(),
        }
    }

    pub fn is_member(&self, speaker: &str) -> bool {
        self.members.iter().any(|m| m == speaker)
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn append(
        &mut self,
        speaker: &str,
        text: impl Into<String>,
        round: u32,
    ) -> Result<&Utterance, TranscriptError> {
        if !self.is_member(speaker) {
            return Err(TranscriptError::UnknownSpeaker(speaker.to_string()));
        }
        let last = self.last_round();
        if round < last {
            return Err(TranscriptError::RoundRegression {
                last,
                attempted: round,
            });
        }
        self.utterances.push(Utterance {
            speaker: speaker.to_string(),
            text: text.into(),
            round,
            spoken_at: Utc::now(),
        });
        Ok(&self.utterances[self.utterances.len() - 1])
    }

    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    pub fn last(&self) -> Option<&Utterance> {
        self.utterances.last()
    }

    /// Round of the latest utterance, 0 when empty.
    pub fn last_round(&self) -> u32 {
        self.utterances.last().map_or(0, |u| u.round)
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    pub fn speakers(&self) -> Vec<&str> {
        self.utterances.iter().map(|u| u.speaker.as_str()).collect()
    }

    /// Plain-text rendering used as conversational context.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for u in &self.utterances {
            out.push_str(&format_utterance(u));
        }
        out
    }
}

pub(crate) fn format_utterance(u: &Utterance) -> String {
    format!("[{}] (round {})\n{}\n\n", u.speaker, u.round, u.text.trim())
}
