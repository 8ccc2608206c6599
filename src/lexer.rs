//! Lexical analysis of a single command line.
//!
//! The shell recognizes exactly three control characters: `<`, `>` and `&`.
//! Everything else between blanks is a plain word. There is no quoting or
//! escaping, so a control character always ends the word in front of it
//! (`ls>out` is `ls`, `>`, `out`).
//!
//! Lines are scanned as raw bytes and words come out as [`OsString`], so
//! names that are not valid UTF-8 reach `open` and `exec` unchanged.

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An ordinary word: program name, argument or redirection target.
    Word(OsString),
    /// Input redirection symbol, `<`.
    RedirectLeft,
    /// Output redirection symbol, `>`.
    RedirectRight,
    /// Background marker, `&`.
    Background,
}

fn is_blank(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

fn is_word_end(byte: u8) -> bool {
    is_blank(byte) || matches!(byte, b'<' | b'>' | b'&' | b'\n')
}

/// Cursor over a raw line that hands out one token at a time.
///
/// The cursor only moves forward; [`Lexer::next_token`] returns `None` once the
/// rest of the line is blank.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Lexer { input, pos: 0 }
    }

    /// Byte offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let byte = self.peek_byte()?;
        self.pos += 1;
        Some(byte)
    }

    fn skip_blanks(&mut self) {
        while self.peek_byte().is_some_and(is_blank) {
            self.pos += 1;
        }
    }

    /// Skip leading blanks and return the next token, or `None` at end of line.
    ///
    /// A newline counts as end of line. Every other byte, `\r` included, is
    /// either a control character or part of a word.
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_blanks();

        let start = self.pos;
        match self.read_byte()? {
            b'<' => Some(Token::RedirectLeft),
            b'>' => Some(Token::RedirectRight),
            b'&' => Some(Token::Background),
            b'\n' => {
                self.pos = self.input.len();
                None
            }
            _ => {
                while self.peek_byte().is_some_and(|b| !is_word_end(b)) {
                    self.pos += 1;
                }
                let word = OsStr::from_bytes(&self.input[start..self.pos]);
                Some(Token::Word(word.to_os_string()))
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Tokenize a whole line at once.
pub fn split_into_tokens<L: AsRef<[u8]> + ?Sized>(line: &L) -> Vec<Token> {
    Lexer::new(line.as_ref()).collect()
}
