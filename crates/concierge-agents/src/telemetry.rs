//! Tracing setup and per-session metrics.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use coordination::{SchedulingPolicy, TerminationReason};

use crate::session::{SessionError, SessionReport};

/// Initialise the global subscriber from `RUST_LOG` (default `info`).
///
/// Logs go to stderr so discussion output on stdout stays readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// One line of session telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub session_id: String,
    /// Policy that produced the result, or the one that failed.
    pub policy: Option<SchedulingPolicy>,
    pub fallback_from: Option<SchedulingPolicy>,
    /// Classifier confidence in automatic mode.
    pub confidence: Option<f64>,
    pub weather: Option<String>,
    pub utterances: usize,
    pub missing_contributions: usize,
    pub termination_reason: Option<TerminationReason>,
    pub elapsed_ms: Option<i64>,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: String,
}

impl SessionMetrics {
    pub fn from_report(report: &SessionReport) -> Self {
        Self {
            session_id: report.session_id.clone(),
            policy: Some(report.policy),
            fallback_from: report.fallback_from,
            confidence: report.decision.as_ref().map(|d| d.confidence),
            weather: Some(report.weather.summary()),
            utterances: report.run.transcript().len(),
            missing_contributions: report.run.missing().len(),
            termination_reason: report.run.termination_reason(),
            elapsed_ms: report.run.elapsed_ms(),
            success: true,
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Record for a session that ended in an error before producing a report.
    pub fn failed(error: &SessionError) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            policy: error.policy(),
            fallback_from: None,
            confidence: None,
            weather: None,
            utterances: 0,
            missing_contributions: 0,
            termination_reason: None,
            elapsed_ms: None,
            success: false,
            error: Some(error.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Append the session as one JSON line to `path`. A write failure is logged
/// and never fails the session.
pub fn append_telemetry(metrics: &SessionMetrics, path: &Path) {
    match write_metrics_line(metrics, path) {
        Ok(()) => debug!(
            session_id = %metrics.session_id,
            success = metrics.success,
            path = %path.display(),
            "session metrics recorded"
        ),
        Err(e) => warn!(
            session_id = %metrics.session_id,
            path = %path.display(),
            error = %format!("{e:#}"),
            "session metrics not recorded"
        ),
    }
}

fn write_metrics_line(metrics: &SessionMetrics, path: &Path) -> Result<()> {
    use std::io::Write;

    let json = serde_json::to_string(metrics).context("Failed to serialize session metrics")?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    writeln!(file, "{json}").context("Failed to append session metrics")?;
    Ok(())
}
