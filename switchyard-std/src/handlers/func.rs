//! Closure-backed handlers.

use switchyard_core::{Context, Handler, HandlerResult};

/// A handler backed by a closure.
///
/// Built with [`handler_fn`].
#[derive(Clone)]
pub struct FnHandler<F> {
    func: F,
}

/// Wraps a closure as a [`Handler`].
///
/// # Example
///
/// ```rust,ignore
/// let resign = handler_fn(|ctx: &mut Context| {
///     ctx.success();
///     Ok(Flow::Continue)
/// });
/// ```
pub fn handler_fn<F>(func: F) -> FnHandler<F>
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
{
    FnHandler { func }
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
{
    fn process(&self, ctx: &mut Context) -> HandlerResult {
        (self.func)(ctx)
    }
}
