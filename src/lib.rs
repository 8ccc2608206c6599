//! A minimal interactive shell with background jobs.
//!
//! Each input line holds one simple command: a program with its arguments,
//! optionally followed by `< file`, `> file` and `&`. There are no pipes,
//! quotes, variables or globs.
//!
//! The pieces, leaf first:
//! - [`lexer`] and [`parser`] turn a line into a [`SimpleCommand`].
//! - [`executor`] spawns it, wiring up redirections, and waits for foreground
//!   jobs.
//! - [`jobs`] tracks background PIDs; [`reaper`] collects them when they exit.
//! - [`Interpreter`] runs the reading and executing sides on separate threads
//!   with a strict hand-off between them.

pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod executor;
mod external;
mod interpreter;
pub mod io_adapters;
pub mod jobs;
pub mod lexer;
pub mod parser;
pub mod reader;
pub mod reaper;
pub mod signals;

pub use command::{ExitCode, SimpleCommand};
pub use config::Config;
pub use env::Environment;
pub use external::find_command_path;
/// Just a convenient re-export of the interactive shell.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::{Flow, Interpreter};
