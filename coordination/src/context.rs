//! Discussion context: the shared preamble plus the transcript so far.

use crate::directory::TenantDirectory;
use crate::transcript::{format_utterance, Transcript, Utterance};
use crate::weather::WeatherSnapshot;

const DISCUSSION_HEADER: &str = "===== Discussion so far =====";

/// Builder for the preamble every role reads before speaking.
///
/// The preamble is fixed for the whole session: weather, the visitor's
/// request, the formatted tenant directory, and policy-specific kickoff
/// instructions.
pub struct Preamble<'a> {
    weather: &'a WeatherSnapshot,
    request: &'a str,
    directory: &'a TenantDirectory,
    instructions: Option<&'a str>,
}

impl<'a> Preamble<'a> {
    pub fn new(
        weather: &'a WeatherSnapshot,
        request: &'a str,
        directory: &'a TenantDirectory,
    ) -> Self {
        Self {
            weather,
            request,
            directory,
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: &'a str) -> Self {
        self.instructions = Some(instructions);
        self
    }

    pub fn render(&self) -> String {
        let w = self.weather;
        let mut out = String::new();
        out.push_str("[Current weather]\n");
        out.push_str(&format!(
            "- condition: {}\n- description: {}\n- temperature: {:.1}°C\n- humidity: {}%\n\n",
            w.condition, w.description, w.temperature, w.humidity
        ));

        out.push_str("[Visitor request]\n");
        out.push_str(self.request.trim());
        out.push_str("\n\n");

        out.push_str(&self.directory.format());

        let matched = self.directory.suited_to(w.condition);
        if !matched.is_empty() {
            out.push_str(&format!("\n[Good picks for {} weather]\n", w.condition));
            for v in matched {
                out.push_str(&format!("- {} ({})\n", v.name, v.floor));
            }
        }

        if let Some(instructions) = self.instructions {
            out.push('\n');
            out.push_str(instructions.trim());
            out.push('\n');
        }
        out
    }
}

/// Borrowed view handed to a role invocation.
#[derive(Debug, Clone, Copy)]
pub struct DiscussionContext<'a> {
    preamble: &'a str,
    transcript: &'a Transcript,
}

impl<'a> DiscussionContext<'a> {
    pub fn new(preamble: &'a str, transcript: &'a Transcript) -> Self {
        Self {
            preamble,
            transcript,
        }
    }

    pub fn preamble(&self) -> &'a str {
        self.preamble
    }

    pub fn transcript(&self) -> &'a Transcript {
        self.transcript
    }

    /// Preamble followed by the full transcript. With an empty transcript this
    /// is exactly the preamble.
    pub fn render(&self) -> String {
        render_with(self.preamble, self.transcript.utterances())
    }
}

/// Preamble followed by an explicit utterance list.
pub fn render_with(preamble: &str, utterances: &[Utterance]) -> String {
    if utterances.is_empty() {
        return preamble.to_string();
    }
    let mut out = String::with_capacity(preamble.len() + 256 * utterances.len());
    out.push_str(preamble);
    if !preamble.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(DISCUSSION_HEADER);
    out.push_str("\n\n");
    for u in utterances {
        out.push_str(&format_utterance(u));
    }
    out
}
