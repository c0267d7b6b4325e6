//! Run report: one outcome per pipeline step
//!
//! Printed to stdout after every run and, on request, written as TOML so
//! CI jobs can pick the results up.

use crate::bootstrap::sequencer::PlanError;
use crate::bootstrap::steps::{Step, StepPolicy};
use crate::plan::Orchestration;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StepStatus,
    pub elapsed: Duration,
    /// Error message for failures, reason for skips, summary otherwise
    pub detail: String,
}

impl StepOutcome {
    pub fn succeeded(step: Step, elapsed: Duration, detail: String) -> Self {
        Self {
            step,
            status: StepStatus::Succeeded,
            elapsed,
            detail,
        }
    }

    pub fn failed(step: Step, elapsed: Duration, detail: String) -> Self {
        Self {
            step,
            status: StepStatus::Failed,
            elapsed,
            detail,
        }
    }

    pub fn skipped(step: Step, reason: &str) -> Self {
        Self {
            step,
            status: StepStatus::Skipped,
            elapsed: Duration::ZERO,
            detail: reason.to_string(),
        }
    }
}

/// Everything one run did
#[derive(Debug)]
pub struct RunReport {
    pub timestamp: String,
    pub orchestration: Orchestration,
    pub steps: Vec<StepOutcome>,
    pub elapsed: Duration,
    /// Set when a fail-fast step failed
    pub fatal: Option<PlanError>,
}

impl RunReport {
    pub fn new(timestamp: String, orchestration: Orchestration) -> Self {
        Self {
            timestamp,
            orchestration,
            steps: Vec::new(),
            elapsed: Duration::ZERO,
            fatal: None,
        }
    }

    pub fn record(&mut self, outcome: StepOutcome) {
        self.steps.push(outcome);
    }

    /// Mark every pipeline step without an outcome yet as skipped
    pub fn skip_remaining(&mut self, reason: &str) {
        for step in Step::PIPELINE {
            if !self.steps.iter().any(|outcome| outcome.step == step) {
                self.steps.push(StepOutcome::skipped(step, reason));
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.fatal.is_none()
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|o| o.status == status).count()
    }
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    meta: Meta<'a>,
    summary: Summary,
    steps: Vec<StepEntry<'a>>,
}

#[derive(Serialize)]
struct Meta<'a> {
    timestamp: &'a str,
    orchestration: Orchestration,
}

#[derive(Serialize)]
struct Summary {
    success: bool,
    elapsed_secs: f64,
    succeeded: usize,
    failed: usize,
    skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct StepEntry<'a> {
    step: Step,
    status: StepStatus,
    elapsed_secs: f64,
    #[serde(skip_serializing_if = "is_blank")]
    detail: &'a str,
}

fn is_blank(detail: &&str) -> bool {
    detail.is_empty()
}

/// Serialize the report as TOML (`[meta]`, `[summary]`, `[[steps]]`)
pub fn serialize_report(report: &RunReport) -> Result<String> {
    let document = ReportDocument {
        meta: Meta {
            timestamp: &report.timestamp,
            orchestration: report.orchestration,
        },
        summary: Summary {
            success: report.is_success(),
            elapsed_secs: report.elapsed.as_secs_f64(),
            succeeded: report.count(StepStatus::Succeeded),
            failed: report.count(StepStatus::Failed),
            skipped: report.count(StepStatus::Skipped),
            error: report.fatal.as_ref().map(ToString::to_string),
        },
        steps: report
            .steps
            .iter()
            .map(|outcome| StepEntry {
                step: outcome.step,
                status: outcome.status,
                elapsed_secs: outcome.elapsed.as_secs_f64(),
                detail: &outcome.detail,
            })
            .collect(),
    };

    toml::to_string(&document).context("Failed to serialize run report")
}

/// Write the TOML report, expanding `~` and creating parent directories
pub fn write_run_report(report: &RunReport, output_path: &Path) -> Result<()> {
    let content = serialize_report(report)?;

    let expanded_path = shellexpand::tilde(&output_path.to_string_lossy()).into_owned();
    let final_path = Path::new(&expanded_path);

    if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory: {}", parent.display()))?;
    }

    fs::write(final_path, content)
        .with_context(|| format!("Failed to write run report to {}", final_path.display()))?;

    Ok(())
}

/// Print the report to stdout in human-readable form
pub fn print_run_report(report: &RunReport) {
    println!("🚀 Bootstrap Report ({})", report.orchestration);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Started: {}", report.timestamp);
    println!();

    for outcome in &report.steps {
        let status = match outcome.status {
            StepStatus::Succeeded => "✅",
            StepStatus::Failed if outcome.step.policy() == StepPolicy::BestEffort => "⚠️",
            StepStatus::Failed => "❌",
            StepStatus::Skipped => "⏭️",
        };

        print!("  {} {:<22}", status, outcome.step.as_str());
        if outcome.status == StepStatus::Skipped {
            println!(" {}", outcome.detail);
        } else if outcome.detail.is_empty() {
            println!(" ({:.1}s)", outcome.elapsed.as_secs_f64());
        } else {
            println!(" ({:.1}s) {}", outcome.elapsed.as_secs_f64(), outcome.detail);
        }
    }

    println!();
    println!(
        "{} succeeded, {} failed, {} skipped",
        report.count(StepStatus::Succeeded),
        report.count(StepStatus::Failed),
        report.count(StepStatus::Skipped)
    );
}
