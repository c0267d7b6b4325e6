//! Pipeline steps and their failure policy

use crate::execute::{ExecError, ExecTask, Executor, shell_quote};
use crate::settings::BootstrapSettings;
use crate::templates::RenderError;
use serde::Serialize;
use snafu::{ResultExt, Snafu};
use std::fmt;

/// Install steps, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    ProvisionSecrets,
    CreateNamespaces,
    InstallCertManager,
    InstallPlatform,
    ApplyIngress,
    ApplyStack,
}

/// What a failed step does to the rest of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Abort the run
    FailFast,
    /// Log and move on
    BestEffort,
}

impl Step {
    pub const PIPELINE: [Step; 6] = [
        Step::ProvisionSecrets,
        Step::CreateNamespaces,
        Step::InstallCertManager,
        Step::InstallPlatform,
        Step::ApplyIngress,
        Step::ApplyStack,
    ];

    pub fn policy(self) -> StepPolicy {
        match self {
            Step::ProvisionSecrets | Step::ApplyStack => StepPolicy::FailFast,
            Step::CreateNamespaces
            | Step::InstallCertManager
            | Step::InstallPlatform
            | Step::ApplyIngress => StepPolicy::BestEffort,
        }
    }

    /// Install script backing this step, if it is a plain script step
    pub fn script(self) -> Option<&'static str> {
        match self {
            Step::CreateNamespaces => Some("create-namespaces.sh"),
            Step::InstallCertManager => Some("install-certmanager.sh"),
            Step::InstallPlatform => Some("install-openfaas.sh"),
            Step::ProvisionSecrets | Step::ApplyIngress | Step::ApplyStack => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Step::ProvisionSecrets => "provision-secrets",
            Step::CreateNamespaces => "create-namespaces",
            Step::InstallCertManager => "install-cert-manager",
            Step::InstallPlatform => "install-platform",
            Step::ApplyIngress => "apply-ingress",
            Step::ApplyStack => "apply-stack",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StepError {
    #[snafu(display("{step}: {source}"))]
    Exec { step: Step, source: ExecError },

    #[snafu(display("{step}: {source}"))]
    Render { step: Step, source: RenderError },
}

/// Run the install script behind `step` through the shell
///
/// A non-zero exit counts as a failure; the output is returned on success.
pub fn run_script_step(
    step: Step,
    executor: &dyn Executor,
    settings: &BootstrapSettings,
) -> Result<String, StepError> {
    let Some(script) = step.script() else {
        return Ok(String::new());
    };

    let command = shell_quote(&settings.script(script).display().to_string());
    let task = ExecTask::shell(&command).with_timeout(settings.step_timeout());

    let result = executor
        .execute(task)
        .and_then(|res| res.into_checked(&command))
        .context(ExecSnafu { step })?;

    tracing::debug!("{}", result.stdout.trim_end());
    Ok(result.stdout)
}
