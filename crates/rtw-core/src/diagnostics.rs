//! Diagnostic reporting
//!
//! Components never write to a global console. They report through an
//! [`ErrorChannel`] handed to them, and the host composes a single
//! [`DiagnosticSink`] that mirrors every report into a user-visible display
//! while still forwarding it to the original channel.

use std::sync::Arc;

use parking_lot::Mutex;

/// An error-reporting channel
///
/// One call is one report; `parts` are the individual arguments of that report.
pub trait ErrorChannel {
    fn error(&self, parts: &[String]);
}

impl<T: ErrorChannel + ?Sized> ErrorChannel for Arc<T> {
    fn error(&self, parts: &[String]) {
        (**self).error(parts)
    }
}

/// A read-only text surface showing the latest diagnostic
pub trait DiagnosticDisplay {
    /// Replace the displayed text
    fn show(&self, text: &str);
}

impl<T: DiagnosticDisplay + ?Sized> DiagnosticDisplay for Arc<T> {
    fn show(&self, text: &str) {
        (**self).show(text)
    }
}

/// Forwards reports to `tracing` at error level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingChannel;

impl ErrorChannel for TracingChannel {
    fn error(&self, parts: &[String]) {
        tracing::error!(target: "rtw::diagnostics", "{}", parts.join(" "));
    }
}

/// Records every report, in call order
#[derive(Debug, Default)]
pub struct MemoryChannel {
    calls: Mutex<Vec<Vec<String>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports received so far
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

impl ErrorChannel for MemoryChannel {
    fn error(&self, parts: &[String]) {
        self.calls.lock().push(parts.to_vec());
    }
}

/// In-memory display surface
#[derive(Debug, Default)]
pub struct TextDisplay {
    text: Mutex<String>,
}

impl TextDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently displayed text
    pub fn text(&self) -> String {
        self.text.lock().clone()
    }
}

impl DiagnosticDisplay for TextDisplay {
    fn show(&self, text: &str) {
        let mut current = self.text.lock();
        current.clear();
        current.push_str(text);
    }
}

/// Ordered, append-only list of diagnostic messages
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Mutex<Vec<String>>,
}

impl DiagnosticLog {
    pub fn push(&self, message: impl Into<String>) {
        self.entries.lock().push(message.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.entries.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// All messages joined with newlines, oldest first
    pub fn joined(&self) -> String {
        self.entries.lock().join("\n")
    }
}

/// Fan-out channel: display + log + original channel
///
/// Each report is joined with `\n`, shown on the display (replacing what was
/// there), appended to the log, and then forwarded unmodified to the wrapped
/// channel.
pub struct DiagnosticSink {
    original: Box<dyn ErrorChannel>,
    display: Box<dyn DiagnosticDisplay>,
    log: DiagnosticLog,
}

/// Shared diagnostic sink type
pub type SharedSink = Arc<DiagnosticSink>;

impl DiagnosticSink {
    pub fn new(
        original: impl ErrorChannel + 'static,
        display: impl DiagnosticDisplay + 'static,
    ) -> Self {
        Self {
            original: Box::new(original),
            display: Box::new(display),
            log: DiagnosticLog::default(),
        }
    }

    /// Create a shared sink
    pub fn shared(
        original: impl ErrorChannel + 'static,
        display: impl DiagnosticDisplay + 'static,
    ) -> SharedSink {
        Arc::new(Self::new(original, display))
    }

    /// Every message reported through this sink
    pub fn log(&self) -> &DiagnosticLog {
        &self.log
    }

    /// Report a single message
    pub fn report(&self, message: impl Into<String>) {
        self.error(&[message.into()]);
    }
}

impl ErrorChannel for DiagnosticSink {
    fn error(&self, parts: &[String]) {
        let joined = parts.join("\n");
        self.display.show(&joined);
        self.log.push(joined);
        self.original.error(parts);
    }
}

impl std::fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticSink")
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}
