//! Bootstrap pipeline for a plan
//!
//! - Preflight check of the backend CLIs
//! - Step definitions and their failure policy
//! - The sequencer that walks the pipeline
//! - Run reporting (stdout + TOML)

pub mod preflight;
pub mod report;
pub mod sequencer;
pub mod steps;

pub use preflight::{PreflightResult, check_tools, print_preflight};
pub use report::{RunReport, StepOutcome, StepStatus, print_run_report, write_run_report};
pub use sequencer::{PlanError, Sequencer};
pub use steps::{Step, StepError, StepPolicy};
