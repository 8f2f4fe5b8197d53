//! Late-bound and swappable references to sinks.

use super::{Sink, SinkBuilder, Slot};
use switchyard_core::{ConfigError, Context, HandlerError, KEY_MESSAGE_SINK, Properties};
use arc_swap::ArcSwap;
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

// ============================================================================
// SinkRef
// ============================================================================

/// A handle to a sink that resolves to its most recently built snapshot.
///
/// Handlers receive one during initialization under
/// [`KEY_MESSAGE_SINK`], typically to reprocess derived messages through
/// their own sink. The handle holds no strong reference, so it never keeps
/// a sink alive.
#[derive(Clone)]
pub struct SinkRef {
    name: String,
    slot: Slot,
}

impl SinkRef {
    pub(crate) fn new(name: String, slot: Slot) -> Self {
        Self { name, slot }
    }

    /// Extracts the sink handle injected into initialization properties.
    pub fn from_properties(properties: &Properties) -> Result<SinkRef, ConfigError> {
        properties.require::<SinkRef>(KEY_MESSAGE_SINK).cloned()
    }

    /// The sink name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current snapshot, if the sink has been built and is still alive.
    pub fn get(&self) -> Option<Arc<Sink>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
    }

    /// Dispatches `ctx` through the current snapshot.
    pub fn process(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        let sink = self.get().ok_or_else(|| HandlerError::SinkUnavailable {
            sink: self.name.clone(),
        })?;
        sink.process(ctx)
    }

    /// Returns `true` if both handles refer to the same sink.
    pub fn same_sink(&self, other: &SinkRef) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for SinkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRef")
            .field("name", &self.name)
            .field("built", &self.get().is_some())
            .finish()
    }
}

// ============================================================================
// SharedSink
// ============================================================================

/// A sink that can be reconfigured while it is in use.
///
/// Readers [`load`](SharedSink::load) the current snapshot with an atomic
/// pointer load and dispatch through it without holding any lock.
/// [`update`](SharedSink::update) rebuilds from a copy of the current tables
/// and swaps the result in; dispatches already running keep the snapshot
/// they loaded. Updates are serialized.
pub struct SharedSink {
    current: ArcSwap<Sink>,
    writer: Mutex<()>,
}

impl SharedSink {
    /// Freezes `builder` and makes it the current snapshot.
    pub fn new(builder: SinkBuilder) -> Self {
        Self::from_sink(builder.build())
    }

    /// Wraps an already built sink.
    pub fn from_sink(sink: Arc<Sink>) -> Self {
        Self {
            current: ArcSwap::new(sink),
            writer: Mutex::new(()),
        }
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<Sink> {
        self.current.load_full()
    }

    /// Dispatches `ctx` through the current snapshot.
    pub fn process(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        self.load().process(ctx)
    }

    /// Applies `change` to a copy of the current tables and publishes the
    /// result.
    ///
    /// Handles taken from earlier snapshots follow the published one. If
    /// `change` fails the current snapshot stays in place.
    pub fn update<F>(&self, change: F) -> Result<Arc<Sink>, ConfigError>
    where
        F: FnOnce(&mut SinkBuilder) -> Result<(), ConfigError>,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut builder = self.current.load().successor();
        change(&mut builder)?;
        let sink = builder.build();
        self.current.store(Arc::clone(&sink));
        tracing::debug!(sink = sink.name(), "sink snapshot replaced");
        Ok(sink)
    }
}

impl fmt::Debug for SharedSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSink")
            .field("current", &self.load())
            .finish()
    }
}
