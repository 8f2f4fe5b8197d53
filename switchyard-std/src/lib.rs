//! # switchyard-std
//!
//! Sinks, chains, modules and the handler registry for the Switchyard
//! message-dispatch engine.
//!
//! This crate provides:
//! - **Chains**: [`Chain`], priority-ordered composite handlers
//! - **Sinks**: [`SinkBuilder`], [`Sink`], [`SinkRef`], [`SharedSink`]
//! - **Modules**: [`Blueprint`], [`Module`], keyword-gated bulk deployment
//! - **Registry**: [`Registry`], the catalog of every deployable module
//! - **Configuration**: [`DispatchConfig`], TOML deployment descriptions
//! - **Standard handlers**: Logging, Filter, closures
//! - **Testing**: recording handlers in [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use switchyard_core;

// Modules
pub mod chain;
pub mod config;
pub mod handlers;
pub mod module;
pub mod registry;
pub mod sink;
pub mod testing;

pub use chain::Chain;
pub use config::{DispatchConfig, SinkConfig};
pub use module::{Blueprint, BlueprintId, Declared, Module};
pub use registry::{Deployment, DeploymentReport, Registry, RegistryBuilder};
pub use sink::{DefaultHandler, GlobalRole, Route, SharedSink, Sink, SinkBuilder, SinkRef};
