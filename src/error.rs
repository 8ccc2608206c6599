//! Error kinds surfaced by the shell.
//!
//! Parse errors live next to the grammar in [`crate::parser::ParsingError`].

use std::io;
use thiserror::Error;

/// Failure to run one command. None of these end the shell.
#[derive(Debug, Error)]
pub enum ExecError {
    /// A `<` or `>` target could not be opened.
    #[error("{path}: {source}")]
    RedirectionOpen {
        path: String,
        #[source]
        source: io::Error,
    },
    /// The program could not be found or is not executable.
    #[error("{program}: command not found")]
    ExecResolution { program: String },
    /// Process creation itself failed.
    #[error("{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// Waiting for a foreground child failed.
    #[error("wait for child {pid} failed: {source}")]
    Wait {
        pid: i32,
        #[source]
        source: io::Error,
    },
}

/// Errors that stop the shell as a whole.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Installing or restoring a signal disposition failed.
    #[error("signal setup failed: {0}")]
    SignalSetup(#[from] nix::Error),
    /// The line source broke down (not end-of-input, which is normal).
    #[error("reading input failed: {0}")]
    Reader(#[from] io::Error),
    /// Line editor failure.
    #[error("line editor failed: {0}")]
    Editor(#[from] rustyline::error::ReadlineError),
    /// A worker thread could not be started or panicked.
    #[error("{0} thread failed")]
    Thread(&'static str),
}

pub type Result<T, E = ShellError> = std::result::Result<T, E>;
