use std::ffi::{OsStr, OsString};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Children killed by a signal are reported as `128 + signo`, as POSIX shells do.
pub type ExitCode = i32;

/// Structured form of one input line.
///
/// Produced by [`crate::parser::construct_command`]. An empty `argv` means the
/// line held nothing to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleCommand {
    /// Program name followed by its arguments, in the order typed.
    pub argv: Vec<OsString>,
    /// Path named after `<`, if any.
    pub input: Option<OsString>,
    /// Path named after `>`, if any.
    pub output: Option<OsString>,
    /// Set when the line carried `&`.
    pub background: bool,
}

impl SimpleCommand {
    /// `true` when there is no program to run.
    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    /// The program name (`argv[0]`).
    pub fn program(&self) -> Option<&OsStr> {
        self.argv.first().map(OsString::as_os_str)
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[OsString] {
        self.argv.get(1..).unwrap_or(&[])
    }

    /// Whether this command is the shell's exit directive.
    ///
    /// The argument list must be exactly the exit word. Redirections and `&`
    /// do not matter (`exit &` still exits), while `exit now` is an ordinary
    /// command.
    pub fn is_exit_directive(&self, exit_command: &str) -> bool {
        matches!(self.argv.as_slice(), [word] if *word == *exit_command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> SimpleCommand {
        SimpleCommand {
            argv: words.iter().map(OsString::from).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_program_and_args() {
        let cmd = argv(&["ls", "-l", "/tmp"]);
        assert_eq!(cmd.program(), Some(OsStr::new("ls")));
        assert_eq!(cmd.args(), &[OsString::from("-l"), OsString::from("/tmp")]);
        assert!(!cmd.is_empty());
    }

    #[test]
    fn test_empty_command() {
        let cmd = SimpleCommand::default();
        assert!(cmd.is_empty());
        assert_eq!(cmd.program(), None);
        assert!(cmd.args().is_empty());
    }

    #[test]
    fn test_exit_directive_matches_argument_list() {
        assert!(argv(&["exit"]).is_exit_directive("exit"));
        assert!(!argv(&["exit", "now"]).is_exit_directive("exit"));
        assert!(!argv(&["Exit"]).is_exit_directive("exit"));
        assert!(!argv(&[]).is_exit_directive("exit"));
    }

    #[test]
    fn test_exit_directive_ignores_redirects_and_background() {
        let mut bg = argv(&["exit"]);
        bg.background = true;
        assert!(bg.is_exit_directive("exit"));

        let mut redirected = argv(&["exit"]);
        redirected.output = Some("f".into());
        redirected.input = Some("g".into());
        assert!(redirected.is_exit_directive("exit"));
    }
}
