//! Human-facing status output
//!
//! Status lines are written to an explicit writer owned by the reporter;
//! colour and trace switches travel with it instead of living in globals.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use colored::Colorize;
use tracing::warn;

/// Output switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Colour status words
    pub color: bool,

    /// Print controller payload details (crash records, instance states)
    pub trace: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            trace: false,
        }
    }
}

/// Writes status lines for the operator
pub struct Reporter {
    config: OutputConfig,
    out: Mutex<Box<dyn Write + Send>>,
}

impl Reporter {
    pub fn new(config: OutputConfig, out: Box<dyn Write + Send>) -> Self {
        Self {
            config,
            out: Mutex::new(out),
        }
    }

    pub fn stdout(config: OutputConfig) -> Self {
        Self::new(config, Box::new(io::stdout()))
    }

    /// Reporter writing into a shared buffer, for capturing output
    pub fn buffered(config: OutputConfig) -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::new(config, Box::new(buffer.clone())), buffer)
    }

    pub fn config(&self) -> OutputConfig {
        self.config
    }

    fn write(&self, text: &str) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            warn!("Failed to write status output: {}", e);
        }
    }

    /// Text without a trailing newline, e.g. `Uploading: `
    pub fn progress(&self, text: &str) {
        self.write(text);
    }

    pub fn line(&self, text: &str) {
        self.write(&format!("{}\n", text));
    }

    pub fn ok(&self, text: &str) {
        let text = if self.config.color {
            text.green().to_string()
        } else {
            text.to_string()
        };
        self.line(&text);
    }

    pub fn warning(&self, text: &str) {
        let text = if self.config.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        };
        self.line(&text);
    }

    pub fn error(&self, text: &str) {
        let text = if self.config.color {
            text.red().to_string()
        } else {
            text.to_string()
        };
        self.line(&text);
    }

    /// Only shown with trace output enabled
    pub fn trace(&self, text: &str) {
        if self.config.trace {
            self.line(text);
        }
    }
}

/// Cloneable in-memory writer
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        String::from_utf8_lossy(&inner).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
