//! Stack collaborator: materializes the final stack definition

use crate::bootstrap::steps::{RenderSnafu, Step, StepError};
use crate::execute::Executor;
use crate::plan::Plan;
use crate::settings::BootstrapSettings;
use crate::templates::render_to_file;
use snafu::ResultExt;

pub const STACK_TEMPLATE: &str = "stack.yml";

/// Renders and applies the stack definition. A failure here ends the run.
pub trait StackApplier {
    fn apply(&self, plan: &Plan, executor: &dyn Executor) -> Result<(), StepError>;
}

/// Writes `<output_dir>/stack.yml` from the stack template
pub struct TemplateStack<'a> {
    settings: &'a BootstrapSettings,
}

impl<'a> TemplateStack<'a> {
    pub fn new(settings: &'a BootstrapSettings) -> Self {
        Self { settings }
    }
}

impl StackApplier for TemplateStack<'_> {
    fn apply(&self, plan: &Plan, _executor: &dyn Executor) -> Result<(), StepError> {
        let path = render_to_file(
            plan,
            &self.settings.templates_dir,
            &self.settings.output_dir,
            STACK_TEMPLATE,
        )
        .context(RenderSnafu {
            step: Step::ApplyStack,
        })?;

        tracing::info!("Stack written to {}", path.display());
        Ok(())
    }
}
