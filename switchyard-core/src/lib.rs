//! # switchyard-core
//!
//! Core traits and primitives for the Switchyard message-dispatch engine.
//!
//! This crate has minimal dependencies and is meant to be imported by crates
//! that only implement handlers or define messages, without pulling in the
//! sinks and registries of `switchyard-std`.
//!
//! # Building Blocks
//!
//! ## Messages ([`Message`], [`Kind`])
//!
//! Every request or callback is a typed, immutable value. Its [`Kind`] is the
//! routing key a sink uses to find handlers.
//!
//! ## Context ([`Context`], [`Response`])
//!
//! One dispatch works on one context: the request plus the response that
//! handlers eventually record.
//!
//! ## Handlers ([`Handler`], [`HandlerRef`], [`Flow`])
//!
//! A handler processes a context and returns a [`Flow`]: continue, or veto
//! the rest of the current phase. Failures are returned as [`HandlerError`].
//! [`HandlerRef`] carries the registration attributes (name, [`Priority`],
//! augmentable) next to the shared instance.
//!
//! ## Initialization ([`Properties`])
//!
//! Deployment settings handed to [`Handler::initialize`].
//!
//! # Error Types
//!
//! - [`SwitchyardError`] - Top-level error type
//! - [`ConfigError`] - Registration and bootstrap errors
//! - [`HandlerError`] - Processing errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod context;
mod error;
mod handler;
mod message;
mod properties;
mod response;

// Re-exports
pub use context::Context;
pub use error::{AugmentRefusal, BoxError, ConfigError, HandlerError, SwitchyardError};
pub use handler::{
    Flow, Handler, HandlerMeta, HandlerRef, HandlerResult, Priority, short_type_name,
};
pub use message::{Kind, Message};
pub use properties::{KEY_MESSAGE_SINK, Properties};
pub use response::{Payload, Response};
