use std::io::{Result as IoResult, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Memory-backed writer for capturing diagnostics in tests.
///
/// Clones share the same buffer, so one clone can be handed to [`Notices`]
/// while another reads what was written.
#[derive(Clone, Default)]
pub struct MemWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemWriter {
    /// Public constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

/// Shared sink for the shell's informational messages (job start and exit,
/// shutdown progress).
///
/// The executor and the reaper write from different threads; each message is
/// written under one lock so lines never interleave.
#[derive(Clone)]
pub struct Notices {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Notices {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
        }
    }

    /// Notices going to the process's standard error.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }

    /// Write one message. Failures are dropped: a notice that cannot be shown
    /// must not affect job control.
    pub fn emit(&self, message: std::fmt::Arguments<'_>) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = sink.write_fmt(message);
        let _ = sink.flush();
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::stderr()
    }
}
