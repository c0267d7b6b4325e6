//! Orchestration sequencer
//!
//! Walks the fixed install pipeline for one plan:
//!
//! 1. provision secrets (fatal)
//! 2. create namespaces, install cert-manager, install the platform, apply
//!    ingress (best effort, Kubernetes only)
//! 3. apply the stack (fatal, Kubernetes only)
//!
//! Swarm plans stop after the secrets. Every step is attempted once; re-running
//! the tool is the recovery path, so the install scripts must be idempotent.

use crate::bootstrap::report::{RunReport, StepOutcome};
use crate::bootstrap::steps::{Step, StepError, StepPolicy, run_script_step};
use crate::execute::Executor;
use crate::ingress::{IngressApplier, TemplateIngress};
use crate::plan::{Orchestration, Plan};
use crate::secrets::{SecretError, SecretOutcome, SecretProvisioner};
use crate::settings::BootstrapSettings;
use crate::stack::{StackApplier, TemplateStack};
use chrono::Utc;
use snafu::Snafu;
use std::time::Instant;

/// Failures that abort a run
#[derive(Debug, Snafu)]
pub enum PlanError {
    #[snafu(display("secret provisioning failed: {source}"))]
    SecretProvisioning { source: SecretError },

    #[snafu(display("stack apply failed: {source}"))]
    StackApply { source: StepError },
}

pub struct Sequencer<'a> {
    plan: &'a Plan,
    executor: &'a dyn Executor,
    settings: &'a BootstrapSettings,
    ingress: Box<dyn IngressApplier + 'a>,
    stack: Box<dyn StackApplier + 'a>,
}

impl<'a> Sequencer<'a> {
    /// Sequencer with the template-backed ingress and stack collaborators
    pub fn new(
        plan: &'a Plan,
        executor: &'a dyn Executor,
        settings: &'a BootstrapSettings,
    ) -> Self {
        Self {
            plan,
            executor,
            settings,
            ingress: Box::new(TemplateIngress::new(settings)),
            stack: Box::new(TemplateStack::new(settings)),
        }
    }

    pub fn with_ingress(mut self, ingress: impl IngressApplier + 'a) -> Self {
        self.ingress = Box::new(ingress);
        self
    }

    pub fn with_stack(mut self, stack: impl StackApplier + 'a) -> Self {
        self.stack = Box::new(stack);
        self
    }

    /// Execute the pipeline once and report every step
    pub fn run(&self) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport::new(Utc::now().to_rfc3339(), self.plan.orchestration);

        tracing::info!("Orchestration: {}", self.plan.orchestration);

        if let Err(err) = self.provision_secrets(&mut report) {
            report.skip_remaining("aborted after secret provisioning failed");
            report.fatal = Some(err);
            report.elapsed = started.elapsed();
            return report;
        }

        match self.plan.orchestration {
            Orchestration::Swarm => {
                report.skip_remaining("not used on Swarm");
            }
            Orchestration::Kubernetes => {
                for step in [
                    Step::CreateNamespaces,
                    Step::InstallCertManager,
                    Step::InstallPlatform,
                    Step::ApplyIngress,
                ] {
                    self.best_effort(step, &mut report);
                }

                if let Err(err) = self.apply_stack(&mut report) {
                    report.fatal = Some(err);
                }
            }
        }

        report.elapsed = started.elapsed();
        report
    }

    fn provision_secrets(&self, report: &mut RunReport) -> Result<(), PlanError> {
        let step = Step::ProvisionSecrets;
        let started = Instant::now();
        let provisioner = SecretProvisioner::new(self.executor, &self.settings.entropy_command)
            .with_timeout(self.settings.step_timeout());

        match provisioner.provision_all(self.plan.orchestration, &self.plan.secrets) {
            Ok(outcomes) => {
                let created = outcomes
                    .iter()
                    .filter(|outcome| matches!(outcome, SecretOutcome::Created(_)))
                    .count();
                let detail = format!(
                    "{created} created, {} already present",
                    outcomes.len() - created
                );
                report.record(StepOutcome::succeeded(step, started.elapsed(), detail));
                Ok(())
            }
            Err(source) => {
                tracing::error!("{}: {}", step, source);
                report.record(StepOutcome::failed(step, started.elapsed(), source.to_string()));
                Err(PlanError::SecretProvisioning { source })
            }
        }
    }

    /// Run a step whose failure is only logged
    fn best_effort(&self, step: Step, report: &mut RunReport) {
        debug_assert_eq!(step.policy(), StepPolicy::BestEffort);
        tracing::info!("Running {}", step);
        let started = Instant::now();

        let result = match step {
            Step::ApplyIngress => self.ingress.apply(self.plan, self.executor),
            _ => run_script_step(step, self.executor, self.settings).map(|_| ()),
        };

        match result {
            Ok(()) => report.record(StepOutcome::succeeded(step, started.elapsed(), String::new())),
            Err(err) => {
                tracing::warn!("{} failed, continuing: {}", step, err);
                report.record(StepOutcome::failed(step, started.elapsed(), err.to_string()));
            }
        }
    }

    fn apply_stack(&self, report: &mut RunReport) -> Result<(), PlanError> {
        let step = Step::ApplyStack;
        tracing::info!("Creating stack.yml");
        let started = Instant::now();

        match self.stack.apply(self.plan, self.executor) {
            Ok(()) => {
                report.record(StepOutcome::succeeded(step, started.elapsed(), String::new()));
                Ok(())
            }
            Err(source) => {
                tracing::error!("{}", source);
                report.record(StepOutcome::failed(step, started.elapsed(), source.to_string()));
                Err(PlanError::StackApply { source })
            }
        }
    }
}
