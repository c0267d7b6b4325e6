//! Bootstrap command: load a plan and run it
//!
//! Exit status: 0 when every fail-fast step succeeded, 1 for bad flags, an
//! unreadable or invalid plan, or a fatal step. Best-effort step failures
//! only show up in the log and the report.

use crate::bootstrap::{Sequencer, check_tools, print_preflight, print_run_report, write_run_report};
use crate::execute::ProcessExecutor;
use crate::plan::load_plan;
use crate::settings::BootstrapSettings;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "ofc-bootstrap",
    version,
    about = "Bootstrap a serverless platform on Kubernetes or Swarm from a YAML plan"
)]
pub struct BootstrapArgs {
    /// YAML plan for the bootstrap
    #[arg(long, env = "OFC_BOOTSTRAP_YAML")]
    pub yaml: PathBuf,

    /// Log every command and its output
    #[arg(short, long)]
    pub verbose: bool,

    /// TOML settings (scripts/templates/output dirs, shell, timeouts)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Kill any step running longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub step_timeout: Option<u64>,

    /// Also write the run report as TOML to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Validate the plan and check required tools, then exit
    #[arg(long)]
    pub check: bool,
}

/// Resolve settings: file (if any), then command-line overrides
fn load_settings(args: &BootstrapArgs) -> Result<BootstrapSettings> {
    let mut settings = match &args.config {
        Some(path) => BootstrapSettings::load(path)?,
        None => BootstrapSettings::default(),
    };

    if let Some(secs) = args.step_timeout {
        settings.step_timeout_secs = Some(secs);
    }

    Ok(settings)
}

pub fn handle_bootstrap_command(args: &BootstrapArgs) -> Result<ExitCode> {
    let plan = load_plan(&args.yaml)?;
    println!("📋 Plan loaded from: {}", args.yaml.display());

    let settings = load_settings(args)?;
    let executor = ProcessExecutor::new().with_shell(settings.shell.clone());

    let preflight = check_tools(plan.orchestration, &executor);
    if args.check {
        print_preflight(&preflight);
        return Ok(if preflight.all_found() {
            println!("✅ Plan is valid and all required tools are present");
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }
    for tool in preflight.missing() {
        tracing::warn!("{} not found on PATH, steps using it will fail", tool.name);
    }

    let report = Sequencer::new(&plan, &executor, &settings).run();

    println!();
    print_run_report(&report);

    if let Some(path) = &args.report {
        write_run_report(&report, path).context("Failed to write run report")?;
        println!("📄 Report written to: {}", path.display());
    }

    println!();
    match &report.fatal {
        None => {
            println!("✅ Plan completed in {:.3} seconds", report.elapsed.as_secs_f64());
            Ok(ExitCode::SUCCESS)
        }
        Some(err) => {
            println!("❌ Plan failed after {:.3} seconds", report.elapsed.as_secs_f64());
            println!("Error: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}
