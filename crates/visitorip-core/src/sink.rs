//! Output sinks that handler modules can write raw bytes to
//!
//! A sink is shared by every in-flight request of the module that holds it,
//! so writing goes through `&self`. Sinks add no framing of their own.

use std::fmt::Debug;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A destination for raw byte writes
pub trait OutputSink: Send + Sync + Debug {
    /// Identifier used in logs, e.g. `"stdout"`
    fn id(&self) -> &str;

    /// Write all of `buf` to the sink
    fn write_raw(&self, buf: &[u8]) -> io::Result<()>;
}

/// The process's standard output stream
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessStdout;

impl OutputSink for ProcessStdout {
    fn id(&self) -> &str {
        "stdout"
    }

    fn write_raw(&self, buf: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(buf)?;
        out.flush()
    }
}

/// The process's standard error stream
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessStderr;

impl OutputSink for ProcessStderr {
    fn id(&self) -> &str {
        "stderr"
    }

    fn write_raw(&self, buf: &[u8]) -> io::Result<()> {
        io::stderr().lock().write_all(buf)
    }
}

/// In-memory sink, for tests and for embedding hosts that capture output
#[derive(Debug, Clone)]
pub struct MemorySink {
    id: String,
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// Create a new empty in-memory sink
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            buf: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the contents of the sink as bytes
    pub fn contents(&self) -> Vec<u8> {
        self.buf.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Get the contents of the sink as a string
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    /// Clear the sink contents
    pub fn clear(&self) {
        if let Ok(mut buf) = self.buf.lock() {
            buf.clear();
        }
    }
}

impl OutputSink for MemorySink {
    fn id(&self) -> &str {
        &self.id
    }

    fn write_raw(&self, buf: &[u8]) -> io::Result<()> {
        let mut inner = self
            .buf
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory sink poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(())
    }
}

/// A sink that rejects every write
///
/// Useful for checking that a module never lets a failed write reach the
/// request path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

impl OutputSink for FailingSink {
    fn id(&self) -> &str {
        "failing"
    }

    fn write_raw(&self, _buf: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }
}

/// Shared handle to a sink
pub type SharedSink = Arc<dyn OutputSink>;
