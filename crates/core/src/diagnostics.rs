//! Diagnostic side channel.
//!
//! Pipeline stages report progress through an injected [`DiagnosticSink`]
//! instead of a global logger. Recording never fails and never changes a
//! result.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Tracing target used by [`TracingSink`].
pub const TRACING_TARGET: &str = "liquidity";

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Leveled sink for diagnostic messages.
pub trait DiagnosticSink: Send + Sync {
    /// Record one message.
    fn record(&self, level: DiagnosticLevel, message: fmt::Arguments<'_>);

    fn debug(&self, message: fmt::Arguments<'_>) {
        self.record(DiagnosticLevel::Debug, message);
    }

    fn info(&self, message: fmt::Arguments<'_>) {
        self.record(DiagnosticLevel::Info, message);
    }

    fn warn(&self, message: fmt::Arguments<'_>) {
        self.record(DiagnosticLevel::Warn, message);
    }

    fn error(&self, message: fmt::Arguments<'_>) {
        self.record(DiagnosticLevel::Error, message);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    fn record(&self, level: DiagnosticLevel, message: fmt::Arguments<'_>) {
        (**self).record(level, message);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Arc<S> {
    fn record(&self, level: DiagnosticLevel, message: fmt::Arguments<'_>) {
        (**self).record(level, message);
    }
}

/// Forwards diagnostics to `tracing` under the `liquidity` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, level: DiagnosticLevel, message: fmt::Arguments<'_>) {
        match level {
            DiagnosticLevel::Debug => tracing::debug!(target: TRACING_TARGET, "{}", message),
            DiagnosticLevel::Info => tracing::info!(target: TRACING_TARGET, "{}", message),
            DiagnosticLevel::Warn => tracing::warn!(target: TRACING_TARGET, "{}", message),
            DiagnosticLevel::Error => tracing::error!(target: TRACING_TARGET, "{}", message),
        }
    }
}

/// Discards every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _level: DiagnosticLevel, _message: fmt::Arguments<'_>) {}
}

/// A recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub level: DiagnosticLevel,
    pub message: String,
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events, oldest first.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    /// Number of events recorded at `level`.
    pub fn count(&self, level: DiagnosticLevel) -> usize {
        self.events.lock().iter().filter(|e| e.level == level).count()
    }

    /// Whether any event at `level` contains `needle`.
    pub fn contains(&self, level: DiagnosticLevel, needle: &str) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| e.level == level && e.message.contains(needle))
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, level: DiagnosticLevel, message: fmt::Arguments<'_>) {
        self.events.lock().push(DiagnosticEvent {
            level,
            message: message.to_string(),
        });
    }
}
