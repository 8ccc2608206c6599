use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use shell_jobs::error::ShellError;
use shell_jobs::reader::{BufSource, EditorSource, LineSource};
use shell_jobs::{Config, Environment, Interpreter, signals};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::{debug, error};

#[derive(FromArgs)]
/// Simple interactive shell. Reads one command per line: a program and its
/// arguments, then optionally `< input`, `> output` and `&` to run it in the
/// background. Type `exit` or press Ctrl-D to leave. Takes no arguments.
struct Args {}

/// The `--help` text argh generates for [`Args`].
fn usage(name: &str) -> String {
    match Args::from_args(&[name], &["--help"]) {
        Err(EarlyExit { output, .. }) => output,
        Ok(_) => String::new(),
    }
}

fn init_logging() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();
}

fn run() -> Result<ExitCode> {
    let argv: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let name = argv.first().map(String::as_str).unwrap_or("shell_jobs");
    let rest: Vec<&str> = argv.iter().skip(1).map(String::as_str).collect();
    if !rest.is_empty() {
        // argh's own complaint, unless the argument was a help request.
        if let Err(EarlyExit { output, status: Err(()) }) = Args::from_args(&[name], &rest) {
            eprintln!("{}", output.trim_end());
        }
        eprintln!("{}", usage(name).trim_end());
        return Ok(ExitCode::FAILURE);
    }

    init_logging();

    // Before any thread exists, so all of them inherit the mask.
    signals::suppress_interrupt()
        .map_err(ShellError::SignalSetup)
        .context("cannot block SIGINT")?;

    let env = Environment::new();
    let config = Config::from_env(&env);
    debug!(?config, "starting");

    let capacity = config.line_capacity;
    let mut source: Box<dyn LineSource> = if std::io::stdin().is_terminal() {
        Box::new(EditorSource::new(capacity).context("cannot start line editor")?)
    } else {
        Box::new(BufSource::new(std::io::stdin().lock(), std::io::stdout(), capacity))
    };

    Interpreter::new(config, env)
        .repl(source.as_mut())
        .context("shell loop failed")?;

    eprint!("\nDone. See you next time, bye!\n");
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}
