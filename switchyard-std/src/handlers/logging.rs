//! Logging handler for message observation.

use switchyard_core::{Context, Flow, Handler, HandlerResult};

/// A handler that logs every message it sees.
///
/// Usually registered as a global handler so that it audits all traffic
/// through a sink. Never vetoes and never records a response.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

impl Handler for LoggingHandler {
    fn process(&self, ctx: &mut Context) -> HandlerResult {
        tracing::debug!(
            message = ctx.request().identifier(),
            request = ?ctx.request(),
            answered = ctx.has_response(),
            "Processing message"
        );
        Ok(Flow::Continue)
    }
}
