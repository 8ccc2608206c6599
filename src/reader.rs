//! Acquiring command lines from the user.

use crate::error::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};

/// Result of one attempt to read a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line, without its trailing newline, exactly as the bytes arrived.
    Line(Vec<u8>),
    /// Just a newline (or an interrupted prompt); prompt again.
    Empty,
    /// The line reached the capacity and was thrown away up to the next
    /// newline. `eof` is set when the input ended while discarding.
    Oversized { eof: bool },
    /// No more input.
    Eof,
}

/// Where the shell gets its lines from.
pub trait LineSource {
    /// Show `prompt` and read the next line.
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;

    /// Write `text` where the prompt goes, e.g. to echo `exit` on end of input.
    fn echo(&mut self, text: &str) -> Result<()>;
}

/// Reads from any buffered byte stream, enforcing the line capacity exactly.
///
/// `capacity` counts the newline: with a capacity of 513 the longest accepted
/// line has 511 characters plus `\n`.
pub struct BufSource<R, W> {
    input: R,
    prompt_out: W,
    capacity: usize,
}

impl<R: BufRead, W: Write> BufSource<R, W> {
    pub fn new(input: R, prompt_out: W, capacity: usize) -> Self {
        Self {
            input,
            prompt_out,
            capacity,
        }
    }

    /// Read at most `capacity` bytes, stopping after a newline.
    fn read_bounded(&mut self) -> std::io::Result<Vec<u8>> {
        let mut line = Vec::new();
        while line.len() < self.capacity {
            let available = self.input.fill_buf()?;
            if available.is_empty() {
                break;
            }
            let room = self.capacity - line.len();
            let window = &available[..available.len().min(room)];
            match window.iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    line.extend_from_slice(&window[..=newline]);
                    self.input.consume(newline + 1);
                    break;
                }
                None => {
                    let taken = window.len();
                    line.extend_from_slice(window);
                    self.input.consume(taken);
                }
            }
        }
        Ok(line)
    }

    /// Drop input up to and including the next newline. Returns `true` if the
    /// input ended first.
    fn discard_rest_of_line(&mut self) -> std::io::Result<bool> {
        loop {
            let available = self.input.fill_buf()?;
            if available.is_empty() {
                return Ok(true);
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    self.input.consume(newline + 1);
                    return Ok(false);
                }
                None => {
                    let len = available.len();
                    self.input.consume(len);
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> LineSource for BufSource<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        self.prompt_out.write_all(prompt.as_bytes())?;
        self.prompt_out.flush()?;

        let mut line = self.read_bounded()?;

        if line.len() >= self.capacity {
            let eof = if line.last() == Some(&b'\n') {
                false
            } else {
                self.discard_rest_of_line()?
            };
            return Ok(ReadOutcome::Oversized { eof });
        }
        if line.is_empty() {
            return Ok(ReadOutcome::Eof);
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if line.is_empty() {
            return Ok(ReadOutcome::Empty);
        }
        Ok(ReadOutcome::Line(line))
    }

    fn echo(&mut self, text: &str) -> Result<()> {
        self.prompt_out.write_all(text.as_bytes())?;
        self.prompt_out.flush()?;
        Ok(())
    }
}

/// Interactive source backed by `rustyline`, with in-memory history.
///
/// `Ctrl-C` at the prompt just gives a fresh prompt; `Ctrl-D` ends input.
pub struct EditorSource {
    editor: DefaultEditor,
    capacity: usize,
}

impl EditorSource {
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            capacity,
        })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            // The editor strips the newline; count it against the capacity.
            Ok(line) if line.len() + 1 >= self.capacity => Ok(ReadOutcome::Oversized { eof: false }),
            Ok(line) if line.is_empty() => Ok(ReadOutcome::Empty),
            Ok(line) => {
                self.editor.add_history_entry(line.as_str())?;
                Ok(ReadOutcome::Line(line.into_bytes()))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Empty),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(err) => Err(err.into()),
        }
    }

    fn echo(&mut self, text: &str) -> Result<()> {
        let mut stdout = std::io::stdout();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}
