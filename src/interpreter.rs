use crate::command::SimpleCommand;
use crate::config::Config;
use crate::env::Environment;
use crate::error::{ExecError, Result, ShellError};
use crate::executor::{Dispatch, Executor};
use crate::io_adapters::Notices;
use crate::jobs::JobTable;
use crate::parser;
use crate::reader::{LineSource, ReadOutcome};
use crate::reaper::Reaper;
use nix::errno::Errno;
use nix::sys::wait::waitpid;
use nix::unistd::{Pid, geteuid};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread;
use tracing::{debug, error, info};

/// Answer from the executing thread once a line has been dealt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// The exit directive was given.
    Exit,
}

/// The interactive shell.
///
/// Reading and executing run on two threads that hand each line over through
/// a zero-capacity channel and then wait for a [`Flow`] back, so the prompt
/// for the next line only appears once the previous one has been dispatched
/// (and, for foreground jobs, has finished). Background jobs are tracked in a
/// [`JobTable`] that a [`Reaper`] thread keeps tidy.
///
/// Example
/// ```no_run
/// use shell_jobs::{Config, Environment, Interpreter};
/// use shell_jobs::reader::BufSource;
///
/// let env = Environment::new();
/// let sh = Interpreter::new(Config::from_env(&env), env);
/// let mut source = BufSource::new(std::io::stdin().lock(), std::io::stdout(), 513);
/// sh.repl(&mut source).unwrap();
/// ```
pub struct Interpreter {
    config: Config,
    env: Environment,
    jobs: JobTable,
    notices: Notices,
    is_root: bool,
}

impl Interpreter {
    pub fn new(config: Config, env: Environment) -> Self {
        Self {
            config,
            env,
            jobs: JobTable::new(),
            notices: Notices::stderr(),
            is_root: geteuid().is_root(),
        }
    }

    /// Send diagnostics and job notices somewhere other than standard error.
    pub fn with_notices(mut self, notices: Notices) -> Self {
        self.notices = notices;
        self
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    pub fn prompt(&self) -> &str {
        self.config.prompt(self.is_root)
    }

    /// Read and run lines from `source` until the exit directive or end of
    /// input, then terminate leftover background jobs.
    pub fn repl(&self, source: &mut dyn LineSource) -> Result<()> {
        let reaper = Reaper::spawn(
            self.jobs.clone(),
            self.notices.clone(),
            self.config.reaper_interval,
        )
        .map_err(|_| ShellError::Thread("reaper"))?;

        let (line_tx, line_rx) = sync_channel::<Vec<u8>>(0);
        let (flow_tx, flow_rx) = sync_channel::<Flow>(0);

        let executor = Executor::new(self.env.clone(), self.jobs.clone(), self.notices.clone());
        let exit_command = self.config.exit_command.clone();
        let notices = self.notices.clone();
        let worker = thread::Builder::new()
            .name("executor".into())
            .spawn(move || execute_lines(&executor, &exit_command, &notices, line_rx, flow_tx));

        let outcome = match worker {
            Ok(worker) => {
                let read = self.read_lines(source, line_tx, flow_rx);
                let joined = worker.join().map_err(|_| ShellError::Thread("executor"));
                read.and(joined)
            }
            Err(_) => Err(ShellError::Thread("executor")),
        };

        reaper.stop();
        self.shutdown();
        outcome
    }

    /// The reading side of the hand-off. Dropping `line_tx` on return tells
    /// the executing side there is nothing more to come.
    fn read_lines(
        &self,
        source: &mut dyn LineSource,
        line_tx: SyncSender<Vec<u8>>,
        flow_rx: Receiver<Flow>,
    ) -> Result<()> {
        loop {
            match source.read_line(self.prompt())? {
                ReadOutcome::Line(line) => {
                    if line_tx.send(line).is_err() {
                        return Err(ShellError::Thread("executor"));
                    }
                    match flow_rx.recv() {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Exit) => return Ok(()),
                        Err(_) => return Err(ShellError::Thread("executor")),
                    }
                }
                ReadOutcome::Empty => {}
                ReadOutcome::Oversized { eof } => {
                    self.notices.emit(format_args!("ERROR: Input too long!\n"));
                    if eof {
                        source.echo(&format!("{}\n", self.config.exit_command))?;
                        return Ok(());
                    }
                }
                ReadOutcome::Eof => {
                    source.echo(&format!("{}\n", self.config.exit_command))?;
                    return Ok(());
                }
            }
        }
    }

    /// Terminate and collect whatever background jobs are still tracked.
    fn shutdown(&self) {
        if self.jobs.is_empty() {
            return;
        }
        self.notices.emit(format_args!(
            "\r<<< some child procs exist, sending SIGTERM\n"
        ));
        let pids = self.jobs.drain_and_terminate();
        self.notices
            .emit(format_args!("\r<<< waiting for children to be terminated\n"));
        for pid in pids {
            collect(pid);
        }
        info!("all background jobs collected");
    }
}

fn collect(pid: Pid) {
    loop {
        match waitpid(pid, None) {
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return,
            Err(err) => {
                error!(pid = pid.as_raw(), %err, "could not collect job");
                return;
            }
            Ok(status) => {
                debug!(?status, "job collected");
                return;
            }
        }
    }
}

/// The executing side of the hand-off.
fn execute_lines(
    executor: &Executor,
    exit_command: &str,
    notices: &Notices,
    line_rx: Receiver<Vec<u8>>,
    flow_tx: SyncSender<Flow>,
) {
    for line in line_rx {
        let flow = execute_line(executor, exit_command, notices, &line);
        if flow_tx.send(flow).is_err() || flow == Flow::Exit {
            break;
        }
    }
    debug!("executor stopped");
}

/// Parse and run one line, reporting any failure through `notices`.
pub(crate) fn execute_line(
    executor: &Executor,
    exit_command: &str,
    notices: &Notices,
    line: &[u8],
) -> Flow {
    let command: SimpleCommand = match parser::construct_command(line) {
        Ok(command) => command,
        Err(err) => {
            notices.emit(format_args!("PARSE: {err}\n"));
            notices.emit(format_args!("ERROR: Unable to parse command!\n"));
            return Flow::Continue;
        }
    };

    if command.is_exit_directive(exit_command) {
        return Flow::Exit;
    }

    match executor.dispatch(&command) {
        Ok(Dispatch::Foreground { pid, status }) => {
            debug!(pid = pid.as_raw(), status, "command finished")
        }
        Ok(Dispatch::Background { .. } | Dispatch::Nothing) => {}
        Err(err @ (ExecError::RedirectionOpen { .. } | ExecError::ExecResolution { .. })) => {
            notices.emit(format_args!("{err}\n"));
        }
        Err(err) => notices.emit(format_args!("ERROR: {err}\n")),
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemWriter;
    use crate::reader::BufSource;
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;
    use std::time::{Duration, Instant};

    struct Session {
        prompts: String,
        notices: String,
        jobs_left: usize,
    }

    fn test_config(capacity: usize) -> Config {
        Config {
            line_capacity: capacity,
            user_prompt: "> ".into(),
            root_prompt: "> ".into(),
            reaper_interval: Duration::from_millis(5),
            ..Config::default()
        }
    }

    fn run_session(dir: &Path, input: &str, capacity: usize) -> Session {
        let mut env = Environment::new();
        env.current_dir = dir.to_path_buf();
        let notices = MemWriter::new();
        let prompts = MemWriter::new();
        let sh = Interpreter::new(test_config(capacity), env)
            .with_notices(Notices::new(notices.clone()));
        let mut source = BufSource::new(Cursor::new(input.as_bytes().to_vec()), prompts.clone(), capacity);

        sh.repl(&mut source).expect("repl");
        Session {
            prompts: prompts.contents(),
            notices: notices.contents(),
            jobs_left: sh.jobs().len(),
        }
    }

    #[test]
    fn test_exit_directive_stops_reading() {
        let tmp = tempfile::tempdir().unwrap();
        let session = run_session(tmp.path(), "exit\necho never > never.txt\n", 513);
        assert_eq!(session.prompts, "> ");
        assert!(!tmp.path().join("never.txt").exists());
    }

    #[test]
    fn test_exit_directive_ignores_redirect_and_background() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = Environment::new();
        env.current_dir = tmp.path().to_path_buf();
        let notices = Notices::new(MemWriter::new());
        let executor = Executor::new(env, JobTable::new(), notices.clone());

        assert_eq!(execute_line(&executor, "exit", &notices, b"exit &"), Flow::Exit);
        assert_eq!(execute_line(&executor, "exit", &notices, b"exit > f"), Flow::Exit);
        assert_eq!(execute_line(&executor, "exit", &notices, b"exit < in"), Flow::Exit);
        assert!(!tmp.path().join("f").exists());
        assert!(executor.jobs().is_empty());
    }

    #[test]
    fn test_exit_with_background_marker_ends_session() {
        let tmp = tempfile::tempdir().unwrap();
        let session = run_session(tmp.path(), "exit &\necho never > never.txt\n", 513);
        assert_eq!(session.prompts, "> ");
        assert!(!tmp.path().join("never.txt").exists());
        assert_eq!(session.jobs_left, 0);
    }

    #[test]
    fn test_end_of_input_echoes_exit() {
        let tmp = tempfile::tempdir().unwrap();
        let session = run_session(tmp.path(), "", 513);
        assert_eq!(session.prompts, "> exit\n");
    }

    #[test]
    fn test_commands_run_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let input = "echo one > a.txt\ncat < a.txt > b.txt\n\nexit\n";
        let session = run_session(tmp.path(), input, 513);

        assert_eq!(fs::read_to_string(tmp.path().join("b.txt")).unwrap(), "one\n");
        assert_eq!(session.prompts, "> > > > ");
        assert_eq!(session.notices, "");
    }

    #[test]
    fn test_parse_error_is_reported_and_loop_continues() {
        let tmp = tempfile::tempdir().unwrap();
        let session = run_session(tmp.path(), "echo a > out1 > out2\necho ok > ok.txt\n", 513);

        assert!(session.notices.contains("PARSE: Syntax error using '>'"));
        assert!(session.notices.contains("ERROR: Unable to parse command!"));
        assert!(!tmp.path().join("out1").exists());
        assert!(!tmp.path().join("out2").exists());
        assert!(tmp.path().join("ok.txt").exists());
    }

    #[test]
    fn test_exec_errors_do_not_stop_the_shell() {
        let tmp = tempfile::tempdir().unwrap();
        let input = "cat < missing.txt\nno-such-program-4242\nexit now\necho ok > ok.txt\n";
        let session = run_session(tmp.path(), input, 513);

        assert!(session.notices.contains("missing.txt: "));
        assert!(session.notices.contains("no-such-program-4242: command not found"));
        assert!(session.notices.contains("exit: command not found"));
        assert!(tmp.path().join("ok.txt").exists());
    }

    #[test]
    fn test_oversized_line_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let input = format!("echo {} > long.txt\necho ok > ok.txt\n", "x".repeat(40));
        let session = run_session(tmp.path(), &input, 32);

        assert!(session.notices.contains("ERROR: Input too long!"));
        assert!(!tmp.path().join("long.txt").exists());
        assert!(tmp.path().join("ok.txt").exists());
    }

    #[test]
    fn test_background_job_does_not_block_and_is_terminated_at_exit() {
        let tmp = tempfile::tempdir().unwrap();
        let started = Instant::now();
        let session = run_session(tmp.path(), "sleep 30 &\nexit\n", 513);

        assert!(started.elapsed() < Duration::from_secs(20));
        assert!(session.notices.contains("is running in background"));
        assert!(session.notices.contains("<<< some child procs exist, sending SIGTERM"));
        assert!(session.notices.contains("<<< waiting for children to be terminated"));
        assert_eq!(session.jobs_left, 0);
    }

    #[test]
    fn test_finished_background_job_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        // The foreground sleep gives the reaper time to notice the first job.
        let session = run_session(tmp.path(), "true &\nsleep 1\nexit\n", 513);

        assert!(session.notices.contains("is running in background"));
        assert!(session.notices.contains("exited"));
        assert!(!session.notices.contains("sending SIGTERM"));
    }
}
