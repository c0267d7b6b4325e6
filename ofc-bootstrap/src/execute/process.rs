//! Executor that spawns real OS processes

use super::{EmptyCommandSnafu, ExecError, ExecResult, ExecTask, Executor, IoSnafu, SpawnSnafu, TimeoutSnafu};
use snafu::{ResultExt, ensure};
use std::process::{ExitStatus, Output};
use std::thread;
use std::time::{Duration, Instant};

const DEFAULT_SHELL: &str = "/bin/sh";
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs tasks as child processes, inheriting cwd and environment
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    shell: String,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
        }
    }
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shell used for `shell: true` tasks, invoked as `<shell> -c <command>`
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    fn expression(&self, task: &ExecTask) -> duct::Expression {
        let expression = if task.shell {
            // 🤓 The command line goes to -c as ONE argument; re-splitting it
            // on spaces mangles quoted words.
            let mut argv = vec!["-c".to_string(), task.command.clone()];
            if !task.args.is_empty() {
                // $0 is the shell name, so args start at $1
                argv.push(self.shell.clone());
                argv.extend(task.args.iter().cloned());
            }
            duct::cmd(self.shell.as_str(), argv)
        } else {
            duct::cmd(task.command.as_str(), &task.args)
        };

        let expression = expression.stdout_capture().stderr_capture().unchecked();

        // Only timed tasks leave the terminal's process group, so Ctrl-C
        // still reaches untimed ones.
        if task.timeout.is_some() {
            own_process_group(&expression)
        } else {
            expression
        }
    }
}

impl Executor for ProcessExecutor {
    fn execute(&self, task: ExecTask) -> Result<ExecResult, ExecError> {
        ensure!(!task.command.trim().is_empty(), EmptyCommandSnafu);

        let command = task.display_command();
        tracing::debug!("exec{}: {}", if task.shell { " (shell)" } else { "" }, command);

        let handle = self
            .expression(&task)
            .start()
            .context(SpawnSnafu { command: &command })?;

        let result = match task.timeout {
            None => handle.wait().map(to_result).context(IoSnafu { command: &command })?,
            Some(limit) => {
                let deadline = Instant::now() + limit;
                loop {
                    if let Some(output) = handle.try_wait().context(IoSnafu { command: &command })? {
                        break to_result(output);
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        terminate(&handle);
                        return TimeoutSnafu {
                            command,
                            timeout: limit,
                        }
                        .fail();
                    }
                    thread::sleep(POLL_INTERVAL.min(deadline - now));
                }
            }
        };

        tracing::debug!("exit {} from: {}", result.exit_code, command);
        Ok(result)
    }
}

#[cfg(unix)]
fn own_process_group(expression: &duct::Expression) -> duct::Expression {
    use std::os::unix::process::CommandExt;

    expression.before_spawn(|command| {
        command.process_group(0);
        Ok(())
    })
}

#[cfg(not(unix))]
fn own_process_group(expression: &duct::Expression) -> duct::Expression {
    expression.clone()
}

/// Kill the child together with everything it forked, then reap it
fn terminate(handle: &duct::Handle) {
    #[cfg(unix)]
    for pid in handle.pids() {
        let Ok(pgid) = libc::pid_t::try_from(pid) else {
            continue;
        };
        // SAFETY: killpg only takes plain integers
        if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
            tracing::debug!("killpg({}): {}", pgid, std::io::Error::last_os_error());
        }
    }

    if let Err(err) = handle.kill() {
        tracing::debug!("kill after timeout: {}", err);
    }
    if let Err(err) = handle.wait() {
        tracing::debug!("reap after timeout: {}", err);
    }
}

fn to_result(output: &Output) -> ExecResult {
    ExecResult {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: exit_code(output.status),
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
