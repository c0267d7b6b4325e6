//! Plan-driven bootstrap of a serverless platform
//!
//! A YAML [`plan::Plan`] names the orchestration backend (Kubernetes or
//! Swarm) and the secrets to create. The [`bootstrap::Sequencer`] turns it
//! into a fixed sequence of external commands run through an
//! [`execute::Executor`].

pub mod bootstrap;
pub mod commands;
pub mod execute;
pub mod ingress;
pub mod plan;
pub mod secrets;
pub mod settings;
pub mod stack;
pub mod templates;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{PlanError, RunReport, Sequencer};
pub use execute::{ExecError, ExecResult, ExecTask, Executor, ProcessExecutor};
pub use plan::{Orchestration, Plan, SecretSpec, load_plan};
pub use settings::BootstrapSettings;
