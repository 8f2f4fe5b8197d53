//! Testing utilities for Switchyard.
//!
//! This module provides handlers that make dispatch order and outcomes
//! observable from tests.
//!
//! # Features
//!
//! - [`Journal`]: A shared, ordered log that handlers append to
//! - [`RecordingHandler`]: Records its label and continues
//! - [`VetoHandler`]: Records its label and vetoes
//! - [`FailingHandler`]: Records its label and fails
//! - [`RespondingHandler`]: Records a success carrying its label
//! - [`CountingHandler`]: Counts invocations

use switchyard_core::{Context, Flow, Handler, HandlerError, HandlerResult};
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Journal
// ============================================================================

/// An ordered, thread-safe log of handler invocations.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// A snapshot of all entries in order.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets all entries.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// ============================================================================
// Recording Handlers
// ============================================================================

/// A handler that records its label and continues.
///
/// # Example
///
/// ```rust,ignore
/// let journal = Journal::new();
/// sink.register_handler(HandlerRef::new(RecordingHandler::new(&journal, "A")), kind)?;
/// sink.build().process(&mut ctx)?;
/// assert_eq!(journal.entries(), ["A"]);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingHandler {
    label: String,
    journal: Journal,
}

impl RecordingHandler {
    /// Creates a handler writing `label` to `journal`.
    pub fn new(journal: &Journal, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            journal: journal.clone(),
        }
    }
}

impl Handler for RecordingHandler {
    fn process(&self, _ctx: &mut Context) -> HandlerResult {
        self.journal.record(self.label.as_str());
        Ok(Flow::Continue)
    }
}

/// A handler that records its label and vetoes.
///
/// Optionally records an error response first, to check that a veto never
/// overwrites an outcome that is already set.
#[derive(Debug, Clone)]
pub struct VetoHandler {
    label: String,
    journal: Journal,
    error: Option<String>,
}

impl VetoHandler {
    /// Creates a vetoing handler writing `label` to `journal`.
    pub fn new(journal: &Journal, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            journal: journal.clone(),
            error: None,
        }
    }

    /// Records `message` as an error response before vetoing.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

impl Handler for VetoHandler {
    fn process(&self, ctx: &mut Context) -> HandlerResult {
        self.journal.record(self.label.as_str());
        if let Some(message) = &self.error {
            ctx.error(message.as_str());
        }
        Ok(Flow::veto(format!("vetoed by {}", self.label)))
    }
}

/// A handler that records its label and fails.
#[derive(Debug, Clone)]
pub struct FailingHandler {
    label: String,
    journal: Journal,
}

impl FailingHandler {
    /// Creates a failing handler writing `label` to `journal`.
    pub fn new(journal: &Journal, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            journal: journal.clone(),
        }
    }
}

impl Handler for FailingHandler {
    fn process(&self, _ctx: &mut Context) -> HandlerResult {
        self.journal.record(self.label.as_str());
        Err(HandlerError::msg(format!("{} failed", self.label)))
    }
}

/// A handler that records a success carrying its label as a `String`.
#[derive(Debug, Clone)]
pub struct RespondingHandler {
    label: String,
    journal: Journal,
}

impl RespondingHandler {
    /// Creates a responding handler writing `label` to `journal`.
    pub fn new(journal: &Journal, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            journal: journal.clone(),
        }
    }
}

impl Handler for RespondingHandler {
    fn process(&self, ctx: &mut Context) -> HandlerResult {
        self.journal.record(self.label.as_str());
        ctx.success_with(self.label.clone());
        Ok(Flow::Continue)
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that counts how many times it was called.
///
/// Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct CountingHandler {
    calls: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls so far.
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Handler for CountingHandler {
    fn process(&self, _ctx: &mut Context) -> HandlerResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Flow::Continue)
    }
}
