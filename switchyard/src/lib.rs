//! # switchyard - Priority-Ordered Message Dispatch
//!
//! `switchyard` routes typed requests and callbacks through composable
//! handlers: global preprocess and postprocess chains, one route per message
//! kind, priority-ordered augmentation when several handlers share a kind,
//! and veto semantics that end a phase without signalling an error.
//!
//! Handlers are declared once and deployed in bulk: blueprints are grouped
//! into modules, and a [`Registry`] applies the modules to named sinks,
//! gated by deployment keywords.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchyard::prelude::*;
//!
//! #[derive(Debug, Message)]
//! struct ResignFederation;
//!
//! #[message_handler(module = "federation", sink = "incoming", messages = [ResignFederation])]
//! #[derive(Default)]
//! struct ResignHandler;
//!
//! impl Handler for ResignHandler {
//!     fn process(&self, ctx: &mut Context) -> HandlerResult {
//!         ctx.success();
//!         Ok(Flow::Continue)
//!     }
//! }
//!
//! let registry = Registry::builder().declare::<ResignHandler>().build()?;
//! let mut incoming = SinkBuilder::new("incoming");
//! registry.apply(std::slice::from_mut(&mut incoming), &[], &Properties::new())?;
//! let incoming = incoming.build();
//!
//! let mut ctx = Context::new(ResignFederation);
//! incoming.process(&mut ctx)?;
//! assert!(ctx.is_success_response());
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use switchyard_core::{
    // Error types
    AugmentRefusal,
    BoxError,
    ConfigError,
    // Context
    Context,
    // Handler
    Flow,
    Handler,
    HandlerError,
    HandlerMeta,
    HandlerRef,
    HandlerResult,
    // Initialization
    KEY_MESSAGE_SINK,
    // Message
    Kind,
    Message,
    Payload,
    Priority,
    Properties,
    Response,
    SwitchyardError,
    short_type_name,
};

pub use switchyard_std::{
    // Modules
    Blueprint,
    BlueprintId,
    // Chains
    Chain,
    Declared,
    // Sinks
    DefaultHandler,
    // Registry
    Deployment,
    DeploymentReport,
    // Configuration
    DispatchConfig,
    GlobalRole,
    Module,
    Registry,
    RegistryBuilder,
    Route,
    SharedSink,
    Sink,
    SinkBuilder,
    SinkConfig,
    SinkRef,
};

/// Standard handler implementations.
pub mod handlers {
    pub use switchyard_std::handlers::{FilterHandler, FnHandler, LoggingHandler, handler_fn};
}

/// Testing utilities.
pub mod testing {
    pub use switchyard_std::testing::{
        CountingHandler, FailingHandler, Journal, RecordingHandler, RespondingHandler,
        VetoHandler,
    };
}

/// Prelude module - common imports for Switchyard.
///
/// # Usage
///
/// ```rust,ignore
/// use switchyard::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Deployment
        Blueprint,
        // Errors
        BoxError,
        Chain,
        ConfigError,
        // Core types
        Context,
        Declared,
        Flow,
        GlobalRole,
        Handler,
        HandlerError,
        HandlerRef,
        HandlerResult,
        Kind,
        Message,
        Module,
        Properties,
        Registry,
        Sink,
        SinkBuilder,
        SinkRef,
    };

    #[cfg(feature = "macros")]
    pub use crate::message_handler;
}

#[cfg(feature = "macros")]
pub use switchyard_macros::{Message, message_handler};
