//! Scripted executor for unit tests: records every task, answers by substring

use crate::execute::{ExecError, ExecResult, ExecTask, Executor};
use std::cell::RefCell;
use std::io;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Output(ExecResult),
    SpawnFailure,
    Timeout,
}

impl Reply {
    pub(crate) fn stdout(stdout: &str) -> Self {
        Reply::Output(ExecResult {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: 0,
        })
    }

    pub(crate) fn exit(exit_code: i32, stderr: &str) -> Self {
        Reply::Output(ExecResult {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code,
        })
    }
}

/// First rule whose needle occurs in the raw command line wins; unmatched
/// commands succeed with empty output. Errors carry the task's display form,
/// as [`crate::execute::ProcessExecutor`] does.
#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    rules: Vec<(String, Reply)>,
    calls: RefCell<Vec<ExecTask>>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, needle: &str, reply: Reply) -> Self {
        self.rules.push((needle.to_string(), reply));
        self
    }

    pub(crate) fn calls(&self) -> Vec<ExecTask> {
        self.calls.borrow().clone()
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(ExecTask::command_line)
            .collect()
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&self, task: ExecTask) -> Result<ExecResult, ExecError> {
        let command_line = task.command_line();
        let command = task.display_command();
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| command_line.contains(needle.as_str()))
            .map_or_else(|| Reply::stdout(""), |(_, reply)| reply.clone());
        self.calls.borrow_mut().push(task.clone());

        match reply {
            Reply::Output(result) => Ok(result),
            Reply::SpawnFailure => Err(ExecError::Spawn {
                command,
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            }),
            Reply::Timeout => Err(ExecError::Timeout {
                command,
                timeout: task.timeout.unwrap_or_default(),
            }),
        }
    }
}
