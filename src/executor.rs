//! Spawning and supervising the program named by a [`SimpleCommand`].

use crate::command::{ExitCode, SimpleCommand};
use crate::env::Environment;
use crate::error::ExecError;
use crate::external::find_command_path;
use crate::io_adapters::Notices;
use crate::jobs::JobTable;
use crate::signals;
use nix::unistd::Pid;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// What happened to a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The line had no program; nothing was spawned.
    Nothing,
    /// A foreground child ran to completion.
    Foreground { pid: Pid, status: ExitCode },
    /// A background child was started and registered.
    Background { pid: Pid },
}

/// Runs parsed commands as child processes.
///
/// Background children are recorded in the shared [`JobTable`]; collecting
/// them is the reaper's job.
pub struct Executor {
    env: Environment,
    jobs: JobTable,
    notices: Notices,
}

impl Executor {
    pub fn new(env: Environment, jobs: JobTable, notices: Notices) -> Self {
        Self { env, jobs, notices }
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Run `command`.
    ///
    /// Foreground commands block until their child exits. Background commands
    /// return as soon as the child exists.
    ///
    /// Redirections are set up before the program is looked up, input first:
    /// a missing input file stops everything, and an output file is created
    /// or truncated even when the program then turns out not to exist.
    pub fn dispatch(&self, command: &SimpleCommand) -> Result<Dispatch, ExecError> {
        let Some(program) = command.program() else {
            return Ok(Dispatch::Nothing);
        };

        let stdin = self.stdin_for(command)?;
        let stdout = self.stdout_for(command)?;

        let executable = find_command_path(&self.env, program).ok_or_else(|| {
            ExecError::ExecResolution {
                program: program.to_string_lossy().into_owned(),
            }
        })?;
        let foreground = !command.background;

        let mut cmd = Command::new(&executable);
        cmd.arg0(program)
            .args(command.args())
            .stdin(stdin)
            .stdout(stdout)
            .envs(self.env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&self.env.current_dir);
        // SAFETY: prepare_child only calls async-signal-safe functions.
        unsafe {
            cmd.pre_exec(move || signals::prepare_child(foreground));
        }

        debug!(?program, executable = %executable.display(), foreground, "spawning");
        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.to_string_lossy().into_owned(),
            source,
        })?;
        let pid = Pid::from_raw(child.id() as i32);

        if foreground {
            let exit_status = child.wait().map_err(|source| ExecError::Wait {
                pid: pid.as_raw(),
                source,
            })?;
            let status = exit_code(exit_status);
            debug!(pid = pid.as_raw(), status, "foreground job finished");
            Ok(Dispatch::Foreground { pid, status })
        } else {
            self.jobs.insert(pid);
            self.notices.emit(format_args!(
                "\r>>> child {} is running in background\n",
                pid
            ));
            Ok(Dispatch::Background { pid })
        }
    }

    fn stdin_for(&self, command: &SimpleCommand) -> Result<Stdio, ExecError> {
        match &command.input {
            Some(path) => {
                let file = File::open(self.env.resolve(path)).map_err(|source| {
                    ExecError::RedirectionOpen {
                        path: path.to_string_lossy().into_owned(),
                        source,
                    }
                })?;
                Ok(file.into())
            }
            // Background jobs must not compete with the prompt for the terminal.
            None if command.background => Ok(Stdio::null()),
            None => Ok(Stdio::inherit()),
        }
    }

    fn stdout_for(&self, command: &SimpleCommand) -> Result<Stdio, ExecError> {
        match &command.output {
            Some(path) => {
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(0o666)
                    .open(self.env.resolve(path))
                    .map_err(|source| ExecError::RedirectionOpen {
                        path: path.to_string_lossy().into_owned(),
                        source,
                    })?;
                Ok(file.into())
            }
            None => Ok(Stdio::inherit()),
        }
    }
}

fn exit_code(exit_status: ExitStatus) -> ExitCode {
    match exit_status.code() {
        Some(x) => x,
        None => terminated_by_signal(exit_status),
    }
}

fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    if let Some(signal) = exit_status.signal() {
        128 + signal
    } else if exit_status.core_dumped() {
        255
    } else {
        -1
    }
}
