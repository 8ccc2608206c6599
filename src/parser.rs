//! Grammar for a single simple command.
//!
//! ```text
//! line     := word* tail*
//! tail     := '<' word | '>' word | '&'
//! ```
//!
//! Plain words must come before any redirection or background marker, each of
//! `<`, `>` and `&` may appear at most once, and a redirection must be followed
//! directly by a word. Any violation rejects the whole line.

use crate::command::SimpleCommand;
use crate::lexer::{Lexer, Token};
use std::ffi::OsString;
use thiserror::Error;

/// Errors that can occur while building a [`SimpleCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsingError {
    /// A second `&` on the same line.
    #[error("Syntax error using '&'")]
    Background,
    /// `<` with no word after it, a second `<`, or `<` followed by `<`, `>` or `&`.
    #[error("Syntax error using '<'")]
    InputRedirect,
    /// Same as [`ParsingError::InputRedirect`] for `>`.
    #[error("Syntax error using '>'")]
    OutputRedirect,
    /// A plain word after a redirection or background marker.
    #[error("Syntax error in input!")]
    UnexpectedToken(OsString),
}

struct CommandBuilder<'a> {
    lexer: Lexer<'a>,
    command: SimpleCommand,
}

impl<'a> CommandBuilder<'a> {
    fn from(line: &'a [u8]) -> Self {
        CommandBuilder {
            lexer: Lexer::new(line),
            command: SimpleCommand::default(),
        }
    }

    fn build(mut self) -> Result<SimpleCommand, ParsingError> {
        while let Some(token) = self.lexer.next_token() {
            match token {
                Token::Background => {
                    if self.command.background {
                        return Err(ParsingError::Background);
                    }
                    self.command.background = true;
                }
                Token::RedirectLeft => {
                    let already_set = self.command.input.is_some();
                    let target = self
                        .redirect_target(already_set)
                        .ok_or(ParsingError::InputRedirect)?;
                    self.command.input = Some(target);
                }
                Token::RedirectRight => {
                    let already_set = self.command.output.is_some();
                    let target = self
                        .redirect_target(already_set)
                        .ok_or(ParsingError::OutputRedirect)?;
                    self.command.output = Some(target);
                }
                Token::Word(word) => {
                    if self.seen_tail() {
                        return Err(ParsingError::UnexpectedToken(word));
                    }
                    self.command.argv.push(word);
                }
            }
        }

        Ok(self.command)
    }

    /// Word right after a redirection operator; `None` when the operator is
    /// misused.
    fn redirect_target(&mut self, already_set: bool) -> Option<OsString> {
        match self.lexer.next_token() {
            Some(Token::Word(path)) if !already_set => Some(path),
            _ => None,
        }
    }

    fn seen_tail(&self) -> bool {
        self.command.input.is_some() || self.command.output.is_some() || self.command.background
    }
}

/// Parse one raw line into a [`SimpleCommand`].
///
/// Nothing of a rejected line survives: on error the partially built command is
/// dropped and the caller gets only the [`ParsingError`].
pub fn construct_command<L: AsRef<[u8]> + ?Sized>(line: &L) -> Result<SimpleCommand, ParsingError> {
    CommandBuilder::from(line.as_ref()).build()
}
