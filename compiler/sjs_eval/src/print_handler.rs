//! Output sinks for the `print` primitive.
//!
//! `print` is the only place a program produces output, so the sink is
//! chosen by the embedder:
//! - `Stdout`: the default
//! - `Buffer`: captured for tests and for comparing execution strategies
//! - `Writer`: any `io::Write` (a file, stderr, a socket)
//! - `Silent`: discards everything

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Print handler that captures output to a buffer.
pub struct BufferPrintHandler {
    buffer: Mutex<String>,
}

impl BufferPrintHandler {
    pub fn new() -> Self {
        BufferPrintHandler {
            buffer: Mutex::new(String::new()),
        }
    }

    /// Print a line (with newline).
    pub fn println(&self, msg: &str) {
        let mut buf = self.buffer.lock();
        buf.push_str(msg);
        buf.push('\n');
    }

    /// Print without newline.
    pub fn print(&self, msg: &str) {
        self.buffer.lock().push_str(msg);
    }

    /// Get all captured output.
    pub fn get_output(&self) -> String {
        self.buffer.lock().clone()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl Default for BufferPrintHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Print handler over an arbitrary writer.
pub struct WriterPrintHandler {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl WriterPrintHandler {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        WriterPrintHandler {
            writer: Mutex::new(writer),
        }
    }

    fn write(&self, msg: &str, newline: bool) {
        let mut writer = self.writer.lock();
        let result = if newline {
            writeln!(writer, "{msg}")
        } else {
            write!(writer, "{msg}")
        };
        if let Err(error) = result.and_then(|()| writer.flush()) {
            tracing::warn!(%error, "print sink write failed");
        }
    }
}

/// Print handler implementation using enum dispatch.
pub enum PrintHandlerImpl {
    /// Writes to stdout (default).
    Stdout,
    /// Captures to a buffer.
    Buffer(BufferPrintHandler),
    /// Writes to an embedder-supplied writer.
    Writer(WriterPrintHandler),
    /// Discards all output.
    Silent,
}

impl PrintHandlerImpl {
    /// Print a line (with newline).
    pub fn println(&self, msg: &str) {
        match self {
            Self::Stdout => println!("{msg}"),
            Self::Buffer(h) => h.println(msg),
            Self::Writer(h) => h.write(msg, true),
            Self::Silent => {}
        }
    }

    /// Print without newline.
    pub fn print(&self, msg: &str) {
        match self {
            Self::Stdout => print!("{msg}"),
            Self::Buffer(h) => h.print(msg),
            Self::Writer(h) => h.write(msg, false),
            Self::Silent => {}
        }
    }

    /// Get all captured output.
    ///
    /// Returns an empty string for handlers that don't capture.
    pub fn get_output(&self) -> String {
        match self {
            Self::Buffer(h) => h.get_output(),
            Self::Stdout | Self::Writer(_) | Self::Silent => String::new(),
        }
    }

    /// Clear captured output.
    pub fn clear(&self) {
        if let Self::Buffer(h) = self {
            h.clear();
        }
    }
}

/// Shared print handler that can be passed around.
pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

/// Create a default stdout print handler.
pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout)
}

/// Create a buffer print handler for capturing output.
pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(BufferPrintHandler::new()))
}

/// Create a print handler writing to `writer`.
pub fn writer_handler(writer: Box<dyn Write + Send>) -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Writer(WriterPrintHandler::new(writer)))
}

/// Create a silent print handler that discards all output.
pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}
