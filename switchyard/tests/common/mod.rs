#![allow(dead_code)]

use switchyard::{HandlerRef, Message, testing::Journal, testing::RecordingHandler};

// ============================================================================
// Test Message Types
// ============================================================================

#[derive(Debug, Message)]
pub struct ReflectAttributes {
    pub object: u32,
}

#[derive(Debug, Message)]
pub struct RemoveObject {
    pub object: u32,
}

#[derive(Debug, Message)]
pub struct TimeAdvanceGrant {
    pub time: f64,
}

// ============================================================================
// Helpers
// ============================================================================

/// A recording handler named after its label.
pub fn recorder(journal: &Journal, label: &str, priority: u8) -> HandlerRef {
    HandlerRef::new(RecordingHandler::new(journal, label))
        .named(label)
        .with_priority(priority)
}

/// Installs a test subscriber so `RUST_LOG=switchyard=trace` shows dispatch
/// logs. Safe to call from several tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
