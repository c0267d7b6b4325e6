//! Secret provisioning
//!
//! A secret value is produced by an entropy pipeline run through the shell,
//! then handed to the backend's own CLI (`kubectl` or `docker`).

use crate::execute::{ExecError, ExecResult, ExecTask, Executor, shell_quote};
use crate::plan::{Orchestration, SecretSpec};
use snafu::{OptionExt, ResultExt, Snafu, ensure};
use std::time::Duration;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SecretError {
    #[snafu(display("secret spec has an empty name"))]
    InvalidSpec,

    #[snafu(display("secret '{name}' has no namespace"))]
    MissingNamespace { name: String },

    #[snafu(display("failed to generate a secret value: {source}"))]
    Generation { source: ExecError },

    #[snafu(display("entropy command produced no output"))]
    EmptyValue,

    #[snafu(display("failed to create secret '{name}': {source}"))]
    Create { name: String, source: ExecError },
}

/// What happened to one declared secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretOutcome {
    Created(String),
    AlreadyExists(String),
}

pub struct SecretProvisioner<'a> {
    executor: &'a dyn Executor,
    entropy_command: String,
    timeout: Option<Duration>,
}

impl<'a> SecretProvisioner<'a> {
    pub fn new(executor: &'a dyn Executor, entropy_command: impl Into<String>) -> Self {
        Self {
            executor,
            entropy_command: entropy_command.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the entropy pipeline and keep its first token (the hash, without
    /// `shasum`'s trailing `  -`)
    pub fn generate_secret_value(&self) -> Result<String, SecretError> {
        let task = ExecTask::shell(&self.entropy_command).with_timeout(self.timeout);
        let result = self
            .executor
            .execute(task)
            .and_then(|res| res.into_checked(&self.entropy_command))
            .context(GenerationSnafu)?;

        result
            .stdout
            .split_whitespace()
            .next()
            .map(str::to_string)
            .context(EmptyValueSnafu)
    }

    /// Generate a value for `spec` and create the secret on the backend
    ///
    /// The creation command's exit code is left for the caller to judge.
    pub fn provision_secret(
        &self,
        backend: Orchestration,
        spec: &SecretSpec,
    ) -> Result<ExecResult, SecretError> {
        ensure!(!spec.name.trim().is_empty(), InvalidSpecSnafu);

        let value = self.generate_secret_value()?;
        let command = render_secret_command(backend, spec, &value)?;
        let task = ExecTask::shell(command)
            .with_label(secret_command_label(backend, spec))
            .with_timeout(self.timeout);

        tracing::info!("Creating {} secret '{}'", backend, spec.name);
        self.executor
            .execute(task)
            .context(CreateSnafu { name: &spec.name })
    }

    /// Provision every declared secret in order, stopping at the first failure
    ///
    /// An "already exists" rejection counts as done, so re-runs are safe.
    pub fn provision_all(
        &self,
        backend: Orchestration,
        secrets: &[SecretSpec],
    ) -> Result<Vec<SecretOutcome>, SecretError> {
        if secrets.is_empty() {
            tracing::info!("No secrets declared in plan");
        }

        let mut outcomes = Vec::with_capacity(secrets.len());
        for spec in secrets {
            let result = self.provision_secret(backend, spec)?;

            if result.success() {
                tracing::debug!("{}", result.stdout.trim_end());
                outcomes.push(SecretOutcome::Created(spec.name.clone()));
            } else if result.stderr.contains("already exists") {
                tracing::warn!("Secret '{}' already exists, leaving it untouched", spec.name);
                outcomes.push(SecretOutcome::AlreadyExists(spec.name.clone()));
            } else {
                let command = format!("create secret {}", spec.name);
                result
                    .into_checked(&command)
                    .context(CreateSnafu { name: &spec.name })?;
            }
        }

        Ok(outcomes)
    }
}

/// Loggable stand-in for the creation command, without the value
fn secret_command_label(backend: Orchestration, spec: &SecretSpec) -> String {
    match backend {
        Orchestration::Kubernetes => format!(
            "kubectl create secret generic {} --namespace {}",
            spec.name,
            spec.namespace.as_deref().unwrap_or_default()
        ),
        Orchestration::Swarm => format!("docker secret create {}", spec.name),
    }
}

/// Build the backend CLI command that stores `value` under `spec`
pub fn render_secret_command(
    backend: Orchestration,
    spec: &SecretSpec,
    value: &str,
) -> Result<String, SecretError> {
    match backend {
        Orchestration::Kubernetes => {
            let namespace = spec
                .namespace
                .as_deref()
                .filter(|ns| !ns.is_empty())
                .context(MissingNamespaceSnafu { name: &spec.name })?;

            Ok(format!(
                "kubectl create secret generic {} --namespace {} --from-literal={}",
                shell_quote(&spec.name),
                shell_quote(namespace),
                shell_quote(&format!("{}={}", spec.literal_key(), value)),
            ))
        }
        Orchestration::Swarm => Ok(format!(
            "printf '%s' {} | docker secret create {} -",
            shell_quote(value),
            shell_quote(&spec.name),
        )),
    }
}
