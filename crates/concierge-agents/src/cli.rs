//! Command-line surface: flags, the interactive menu, and report rendering.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use tracing::{info, warn};

use coordination::{SchedulingPolicy, TenantDirectory};

use crate::agents::AgentFactory;
use crate::config::ConciergeConfig;
use crate::session::{
    ComparisonReport, PolicyChoice, RequestSource, SessionDeps, SessionError,
    SessionOrchestrator, SessionReport,
};
use crate::telemetry::{append_telemetry, SessionMetrics};
use crate::weather::WeatherProvider;

pub const FAREWELL: &str = "ご利用ありがとうございました。またお越しください！";

/// Weather-aware activity recommendations for the Takeshiba complex
#[derive(Parser, Debug, Default)]
#[command(name = "concierge", author, version, about, long_about = None)]
pub struct Cli {
    /// Run one discussion with this scheduling policy and exit
    #[arg(long, value_enum, conflicts_with_all = ["auto", "compare"])]
    pub policy: Option<SchedulingPolicy>,

    /// Let the intent classifier pick the policy, then exit
    #[arg(long, default_value_t = false, conflicts_with = "compare")]
    pub auto: bool,

    /// Run every policy against the same request and exit
    #[arg(long, default_value_t = false)]
    pub compare: bool,

    /// Visitor request; read from stdin when omitted
    #[arg(long)]
    pub request: Option<String>,

    /// City for the weather lookup (overrides CONCIERGE_CITY)
    #[arg(long)]
    pub city: Option<String>,

    /// Round ceiling for fixed-order and context-driven discussions
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Concurrent contributor invocations for independent discussions
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Append one JSON line of session telemetry to this file
    #[arg(long)]
    pub metrics_path: Option<PathBuf>,

    /// Tenant directory TOML replacing the built-in table
    #[arg(long)]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Once(PolicyChoice),
    Compare,
    Interactive,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.compare {
            Mode::Compare
        } else if self.auto {
            Mode::Once(PolicyChoice::Auto)
        } else if let Some(policy) = self.policy {
            Mode::Once(PolicyChoice::Fixed(policy))
        } else {
            Mode::Interactive
        }
    }

    /// Apply flag overrides on top of the environment configuration.
    pub fn apply(&self, config: &mut ConciergeConfig) {
        if let Some(city) = &self.city {
            config.weather.city = city.clone();
        }
        if let Some(rounds) = self.max_rounds {
            config.scheduler.fixed_order_max_rounds = rounds;
            config.scheduler.context_driven_max_rounds = rounds;
        }
        if let Some(parallelism) = self.parallelism {
            config.scheduler.independent_parallelism = parallelism;
        }
    }

    pub fn load_directory(&self) -> Result<TenantDirectory> {
        match &self.directory {
            Some(path) => TenantDirectory::load(path),
            None => Ok(TenantDirectory::takeshiba()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Run(PolicyChoice),
    Compare,
    Quit,
}

pub const MENU: &str = "\
==============================
 0. おまかせ (auto)
 1. fixed_order
 2. context_driven
 3. independent_synthesize
 4. compare all policies
 5. quit
==============================";

pub fn parse_menu_choice(input: &str) -> Option<MenuAction> {
    match input.trim() {
        "0" => Some(MenuAction::Run(PolicyChoice::Auto)),
        "1" => Some(MenuAction::Run(PolicyChoice::Fixed(SchedulingPolicy::FixedOrder))),
        "2" => Some(MenuAction::Run(PolicyChoice::Fixed(
            SchedulingPolicy::ContextDriven,
        ))),
        "3" => Some(MenuAction::Run(PolicyChoice::Fixed(
            SchedulingPolicy::IndependentSynthesize,
        ))),
        "4" => Some(MenuAction::Compare),
        "5" | "q" | "quit" => Some(MenuAction::Quit),
        _ => None,
    }
}

/// Print `prompt` and read one trimmed line from stdin on a blocking thread.
pub async fn prompt_line(prompt: &str) -> Result<String> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || -> Result<String> {
        use std::io::Write;
        let mut out = std::io::stdout();
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            anyhow::bail!("stdin closed");
        }
        Ok(line.trim().to_string())
    })
    .await
    .context("stdin reader task failed")?
}

pub struct StdinRequestSource;

#[async_trait]
impl RequestSource for StdinRequestSource {
    async fn read_request(&self) -> Result<String> {
        prompt_line("ご要望をどうぞ > ").await
    }
}

pub fn render_report(report: &SessionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Weather: {}", report.weather.summary());
    let _ = writeln!(out, "Request: {}", report.request);
    if let Some(decision) = &report.decision {
        let _ = writeln!(
            out,
            "Classifier: {} (confidence {:.2}, {:?}) {}",
            decision.selected_policy, decision.confidence, decision.source, decision.reasoning
        );
    }
    if let Some(failed) = report.fallback_from {
        let _ = writeln!(out, "Fell back from {failed} to {}", report.policy);
    }
    let _ = writeln!(out, "{}\n", report.run.summary());
    out.push_str(&report.run.transcript().render());
    for missing in report.run.missing() {
        let _ = writeln!(
            out,
            "(no contribution from {} in round {}: {})",
            missing.speaker, missing.round, missing.reason
        );
    }
    out
}

pub fn render_comparison(report: &ComparisonReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Weather: {}", report.weather.summary());
    let _ = writeln!(out, "Request: {}\n", report.request);
    for entry in &report.entries {
        let _ = writeln!(out, "===== {} =====", entry.policy);
        match &entry.outcome {
            Ok(run) => {
                let _ = writeln!(out, "{}", run.summary());
                match run.final_utterance() {
                    Some(u) => {
                        let _ = writeln!(out, "[{}]\n{}\n", u.speaker, u.text);
                    }
                    None => out.push_str("(no utterances)\n\n"),
                }
            }
            Err(e) => {
                let _ = writeln!(out, "failed: {e}\n");
            }
        }
    }
    let _ = writeln!(
        out,
        "{}/{} policies completed",
        report.successes(),
        report.entries.len()
    );
    out
}

/// Wire the live collaborators and run the selected mode.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = ConciergeConfig::from_env();
    cli.apply(&mut config);
    let directory = Arc::new(cli.load_directory()?);
    info!(
        version = %directory.version,
        venues = directory.len(),
        city = %config.weather.city,
        model = %config.model,
        "concierge starting"
    );

    let factory = AgentFactory::new(&config)?;
    let deps = SessionDeps {
        generator: factory.role_generator(),
        selector: factory.speaker_selector(),
        classifier: factory.classifier_generator(),
        weather: Arc::new(WeatherProvider::new(&config.weather)),
        requests: Arc::new(StdinRequestSource),
    };
    let orchestrator = SessionOrchestrator::new(
        deps,
        directory,
        config.scheduler.clone(),
        config.weather.city.clone(),
    )
    .context("invalid scheduler configuration")?;

    let console = Console {
        orchestrator,
        metrics_path: cli.metrics_path.clone(),
    };
    match cli.mode() {
        Mode::Once(choice) => console.once(choice, cli.request.as_deref()).await,
        Mode::Compare => console.compare(cli.request.as_deref()).await,
        Mode::Interactive => console.interactive(cli.request.as_deref()).await,
    }
}

struct Console {
    orchestrator: SessionOrchestrator,
    metrics_path: Option<PathBuf>,
}

impl Console {
    fn record(&self, outcome: &Result<SessionReport, SessionError>) {
        let Some(path) = &self.metrics_path else {
            return;
        };
        let metrics = match outcome {
            Ok(report) => SessionMetrics::from_report(report),
            Err(e) => SessionMetrics::failed(e),
        };
        append_telemetry(&metrics, path);
    }

    async fn execute(
        &self,
        choice: PolicyChoice,
        request: Option<&str>,
    ) -> Result<SessionReport, SessionError> {
        let outcome = self.orchestrator.run(choice, request).await;
        self.record(&outcome);
        if let Ok(report) = &outcome {
            println!("{}", render_report(report));
        }
        outcome
    }

    async fn once(&self, choice: PolicyChoice, request: Option<&str>) -> Result<()> {
        self.execute(choice, request).await?;
        Ok(())
    }

    async fn compare(&self, request: Option<&str>) -> Result<()> {
        let report = self.orchestrator.compare(request).await?;
        println!("{}", render_comparison(&report));
        Ok(())
    }

    async fn interactive(&self, preset: Option<&str>) -> Result<()> {
        loop {
            println!("{MENU}");
            let input = prompt_line("番号を選んでください > ").await?;
            let Some(action) = parse_menu_choice(&input) else {
                println!("0〜5 の番号を入力してください。");
                continue;
            };
            let choice = match action {
                MenuAction::Quit => {
                    println!("{FAREWELL}");
                    return Ok(());
                }
                MenuAction::Compare => {
                    if let Err(e) = self.compare(preset).await {
                        eprintln!("Comparison failed: {e:#}");
                    }
                    continue;
                }
                MenuAction::Run(choice) => choice,
            };

            // Read once so a retry with another policy reuses the same request.
            let request = match preset {
                Some(r) => r.to_string(),
                None => match prompt_line("ご要望をどうぞ > ").await {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(error = %e, "could not read request");
                        continue;
                    }
                },
            };
            self.run_with_retry(choice, &request).await;
        }
    }

    async fn run_with_retry(&self, mut choice: PolicyChoice, request: &str) {
        loop {
            let err = match self.execute(choice, Some(request)).await {
                Ok(_) => return,
                Err(e) => e,
            };
            eprintln!("Discussion failed: {err}");
            if !err.is_retriable() {
                return;
            }
            let answer = prompt_line("別の方式で再試行しますか？ (1-3, Enter でスキップ) > ")
                .await
                .unwrap_or_default();
            match parse_menu_choice(&answer) {
                Some(MenuAction::Run(next @ PolicyChoice::Fixed(_))) => choice = next,
                _ => return,
            }
        }
    }
}
