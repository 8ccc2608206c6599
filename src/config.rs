//! Tunable settings of the shell.

use crate::env::Environment;
use std::time::Duration;
use tracing::warn;

/// Largest accepted input line in bytes, newline included. A read that fills
/// the whole buffer is treated as oversized.
pub const DEFAULT_LINE_CAPACITY: usize = 513;

/// How often the reaper checks tracked background jobs.
pub const DEFAULT_REAPER_INTERVAL: Duration = Duration::from_millis(50);

/// Overrides [`Config::line_capacity`].
pub const LINE_CAPACITY_VAR: &str = "SHELL_JOBS_BUF_SIZE";
/// Overrides [`Config::reaper_interval`], in milliseconds.
pub const REAPER_INTERVAL_VAR: &str = "SHELL_JOBS_REAP_INTERVAL_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub line_capacity: usize,
    pub user_prompt: String,
    pub root_prompt: String,
    pub exit_command: String,
    pub reaper_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            line_capacity: DEFAULT_LINE_CAPACITY,
            user_prompt: "$ ".to_string(),
            root_prompt: "# ".to_string(),
            exit_command: "exit".to_string(),
            reaper_interval: DEFAULT_REAPER_INTERVAL,
        }
    }
}

impl Config {
    /// Defaults, with overrides taken from the environment snapshot.
    ///
    /// Values that do not parse, or are zero, are ignored.
    pub fn from_env(env: &Environment) -> Self {
        let mut config = Self::default();

        if let Some(capacity) = positive_var(env, LINE_CAPACITY_VAR) {
            // One byte for the newline, at least one for content.
            config.line_capacity = capacity.max(2);
        }
        if let Some(millis) = positive_var(env, REAPER_INTERVAL_VAR) {
            config.reaper_interval = Duration::from_millis(millis as u64);
        }

        config
    }

    /// Prompt for the given privilege level.
    pub fn prompt(&self, is_root: bool) -> &str {
        if is_root {
            &self.root_prompt
        } else {
            &self.user_prompt
        }
    }
}

fn positive_var(env: &Environment, key: &str) -> Option<usize> {
    let raw = env.get_var(key)?;
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            warn!(key, value = %raw, "ignoring invalid setting");
            None
        }
    }
}
