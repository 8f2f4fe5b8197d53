//! Ready-made handlers.

mod filter;
mod func;
mod logging;

pub use filter::FilterHandler;
pub use func::{FnHandler, handler_fn};
pub use logging::LoggingHandler;
