//! User-facing log events
//!
//! Operations report progress through a [`LogSink`] handed to the data
//! manager at construction. Front-ends decide where events end up: the
//! default [`TracingSink`] forwards them to `tracing`, [`MemorySink`]
//! collects them for display or inspection.

use std::sync::{Arc, Mutex};

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Get the string representation of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single structured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
}

/// Receiver of log events.
pub trait LogSink: Send + Sync {
    fn emit(&self, event: LogEvent);
}

/// Forwards events to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, event: LogEvent) {
        match event.level {
            LogLevel::Debug => tracing::debug!(target: "dm", "{}", event.message),
            LogLevel::Info => tracing::info!(target: "dm", "{}", event.message),
            LogLevel::Warn => tracing::warn!(target: "dm", "{}", event.message),
            LogLevel::Error => tracing::error!(target: "dm", "{}", event.message),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Messages of the events at `level`.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, event: LogEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Cheap handle used by the components to emit events.
///
/// Info events are only passed on when `verbose` is set.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    verbose: bool,
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>, verbose: bool) -> Self {
        Self { sink, verbose }
    }

    /// Logger that forwards everything to `tracing`.
    pub fn tracing(verbose: bool) -> Self {
        Self::new(Arc::new(TracingSink), verbose)
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if level == LogLevel::Info && !self.verbose {
            return;
        }
        self.sink.emit(LogEvent {
            level,
            message: message.into(),
        });
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("verbose", &self.verbose).finish()
    }
}
