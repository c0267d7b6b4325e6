//! Preflight check: are the backend's CLIs on PATH?
//!
//! Missing tools don't stop a run (the install scripts may bring their own),
//! but `--check` fails on them.

use crate::execute::{ExecTask, Executor};
use crate::plan::Orchestration;
use std::path::PathBuf;

/// Result of looking up one tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCheck {
    pub name: String,
    pub path: Option<PathBuf>,
}

impl ToolCheck {
    pub fn found(&self) -> bool {
        self.path.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightResult {
    pub tools: Vec<ToolCheck>,
}

impl PreflightResult {
    pub fn missing(&self) -> Vec<&ToolCheck> {
        self.tools.iter().filter(|tool| !tool.found()).collect()
    }

    pub fn all_found(&self) -> bool {
        self.tools.iter().all(ToolCheck::found)
    }
}

/// CLIs the secret commands and install steps rely on
pub fn required_tools(orchestration: Orchestration) -> &'static [&'static str] {
    match orchestration {
        Orchestration::Kubernetes => &["kubectl"],
        Orchestration::Swarm => &["docker"],
    }
}

/// Resolve a tool through the shell's `command -v`
fn find_tool(executor: &dyn Executor, name: &str) -> Option<PathBuf> {
    let task = ExecTask::shell(format!("command -v {name}"));
    match executor.execute(task) {
        Ok(result) if result.success() => {
            let path = result.stdout.trim();
            (!path.is_empty()).then(|| PathBuf::from(path))
        }
        Ok(_) => None,
        Err(err) => {
            tracing::debug!("lookup of {} failed: {}", name, err);
            None
        }
    }
}

pub fn check_tools(orchestration: Orchestration, executor: &dyn Executor) -> PreflightResult {
    let tools = required_tools(orchestration)
        .iter()
        .map(|name| ToolCheck {
            name: (*name).to_string(),
            path: find_tool(executor, name),
        })
        .collect();

    PreflightResult { tools }
}

/// Print the check to stdout
pub fn print_preflight(result: &PreflightResult) {
    println!("📦 Required tools:");
    for tool in &result.tools {
        match &tool.path {
            Some(path) => println!("  ✅ {} ({})", tool.name, path.display()),
            None => println!("  ❌ {} (not found on PATH)", tool.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedExecutor};

    #[test]
    fn test_kubernetes_needs_kubectl() {
        let executor = ScriptedExecutor::new()
            .on("command -v kubectl", Reply::stdout("/usr/local/bin/kubectl\n"));

        let result = check_tools(Orchestration::Kubernetes, &executor);

        assert!(result.all_found());
        assert_eq!(
            result.tools[0].path,
            Some(PathBuf::from("/usr/local/bin/kubectl"))
        );
        assert_eq!(executor.commands(), vec!["command -v kubectl".to_string()]);
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let executor = ScriptedExecutor::new().on("command -v docker", Reply::exit(1, ""));

        let result = check_tools(Orchestration::Swarm, &executor);

        assert!(!result.all_found());
        let missing = result.missing();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "docker");
    }

    #[test]
    fn test_lookup_error_counts_as_missing() {
        let executor = ScriptedExecutor::new().on("command -v", Reply::SpawnFailure);
        assert!(!check_tools(Orchestration::Kubernetes, &executor).all_found());
    }

    #[test]
    fn test_empty_output_counts_as_missing() {
        let executor = ScriptedExecutor::new();
        assert!(!check_tools(Orchestration::Kubernetes, &executor).all_found());
    }
}
