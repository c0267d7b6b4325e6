//! Command execution for install steps
//!
//! An [`ExecTask`] describes one external command; an [`Executor`] runs it and
//! hands back an [`ExecResult`]. Executors never treat a non-zero exit code as
//! an error: "could not run" and "ran but failed" stay distinct, and each call
//! site decides which exit codes it can live with.

pub mod process;

pub use process::ProcessExecutor;

use snafu::Snafu;
use std::time::Duration;

/// One external command invocation.
///
/// With `shell` set, `command` is a full command line handed verbatim to the
/// shell's `-c`, and `args` become the positional parameters `$1`, `$2`, ...
/// Otherwise `command` names the program and `args` are passed as argv
/// without any expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecTask {
    pub command: String,
    pub args: Vec<String>,
    pub shell: bool,
    pub timeout: Option<Duration>,
    /// Shown in logs and errors instead of the command line
    pub label: Option<String>,
}

impl ExecTask {
    /// Command line interpreted by the shell
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            shell: true,
            timeout: None,
            label: None,
        }
    }

    /// Program executed directly, no shell involved
    pub fn direct(program: impl Into<String>) -> Self {
        Self {
            command: program.into(),
            args: Vec::new(),
            shell: false,
            timeout: None,
            label: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Kill the child and fail with [`ExecError::Timeout`] past this limit
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Redacted description for command lines that carry secrets
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Form used in logs and error messages: the label when set, else the
    /// full command line
    pub fn display_command(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.command_line())
    }

    /// Command and arguments joined with spaces, never redacted
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// Outcome of one [`ExecTask`]
///
/// Output streams are decoded as UTF-8; invalid sequences are replaced with
/// U+FFFD. Valid UTF-8 output is kept byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    /// Real exit status; `128 + signal` when the child was killed by a signal
    pub exit_code: i32,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into [`ExecError::NonZeroExit`]
    pub fn into_checked(self, command: &str) -> Result<Self, ExecError> {
        if self.success() {
            Ok(self)
        } else {
            NonZeroExitSnafu {
                command,
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            }
            .fail()
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ExecError {
    #[snafu(display("refusing to execute an empty command"))]
    EmptyCommand,

    #[snafu(display("failed to start `{command}`: {source}"))]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("failed to collect output of `{command}`: {source}"))]
    Io {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("`{command}` did not finish within {}s and was killed", timeout.as_secs_f64()))]
    Timeout { command: String, timeout: Duration },

    #[snafu(display("`{command}` exited with code {exit_code}: {stderr}"))]
    NonZeroExit {
        command: String,
        exit_code: i32,
        stderr: String,
    },
}

/// Capability to run an [`ExecTask`]
///
/// Tasks are taken by value: each one is executed at most once.
pub trait Executor {
    fn execute(&self, task: ExecTask) -> Result<ExecResult, ExecError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, task: ExecTask) -> Result<ExecResult, ExecError> {
        (**self).execute(task)
    }
}

/// Single-quote `word` for a POSIX shell unless it is plainly safe
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '=' | ':' | '@'));

    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
