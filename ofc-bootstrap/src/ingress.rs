//! Ingress collaborator

use crate::bootstrap::steps::{ExecSnafu, RenderSnafu, Step, StepError};
use crate::execute::{ExecTask, Executor, shell_quote};
use crate::plan::Plan;
use crate::settings::BootstrapSettings;
use crate::templates::render_to_file;
use snafu::ResultExt;

pub const INGRESS_TEMPLATE: &str = "ingress-wildcard.yml";

/// Applies ingress resources for the cluster backend
pub trait IngressApplier {
    fn apply(&self, plan: &Plan, executor: &dyn Executor) -> Result<(), StepError>;
}

/// Renders the wildcard ingress template and `kubectl apply`s it
pub struct TemplateIngress<'a> {
    settings: &'a BootstrapSettings,
}

impl<'a> TemplateIngress<'a> {
    pub fn new(settings: &'a BootstrapSettings) -> Self {
        Self { settings }
    }
}

impl IngressApplier for TemplateIngress<'_> {
    fn apply(&self, plan: &Plan, executor: &dyn Executor) -> Result<(), StepError> {
        let step = Step::ApplyIngress;
        let manifest = render_to_file(
            plan,
            &self.settings.templates_dir,
            &self.settings.output_dir,
            INGRESS_TEMPLATE,
        )
        .context(RenderSnafu { step })?;

        let command = format!(
            "kubectl apply -f {}",
            shell_quote(&manifest.display().to_string())
        );
        let result = executor
            .execute(ExecTask::shell(&command).with_timeout(self.settings.step_timeout()))
            .and_then(|res| res.into_checked(&command))
            .context(ExecSnafu { step })?;

        tracing::debug!("{}", result.stdout.trim_end());
        Ok(())
    }
}
