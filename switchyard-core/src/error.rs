//! Error types for Switchyard.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`SwitchyardError`] - Top-level error type
//! - [`ConfigError`] - Registration, module application and bootstrap errors
//! - [`HandlerError`] - Failures raised while processing a message
//!
//! A veto is not an error. It is reported through [`Flow::Veto`](crate::Flow)
//! and never leaves a sink.

use crate::message::Kind;
use std::fmt;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Switchyard operations.
#[derive(Error, Debug)]
pub enum SwitchyardError {
    /// Configuration or bootstrap failed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A handler failed while processing a message.
    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Which side of an augmentation refused to be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AugmentRefusal {
    /// The handler being registered is not augmentable.
    Incoming,
    /// The handler already installed for the kind is not augmentable.
    Existing,
}

impl fmt::Display for AugmentRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incoming => f.write_str("handler not augmentable and another handler exists"),
            Self::Existing => f.write_str("existing handler isn't augmentable"),
        }
    }
}

/// Errors raised while configuring sinks, modules and registries.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Two handlers for the same kind could not be combined.
    #[error(
        "cannot register [{incoming}] for message [{kind}] over [{existing}]: {refusal}"
    )]
    NotAugmentable {
        /// The contested routing key.
        kind: Kind,
        /// Name of the installed handler or chain.
        existing: String,
        /// Name of the handler being registered.
        incoming: String,
        /// Which side refused.
        refusal: AugmentRefusal,
    },

    /// A global registration named no pre/post role.
    #[error("handler [{handler}] is not a global handler: no pre/post role given")]
    NotGlobal {
        /// The offending handler.
        handler: String,
    },

    /// A module targets a sink that was not supplied to `apply`.
    #[error("handler [{blueprint}] targets sink [{sink}], which was not supplied")]
    SinkNotFound {
        /// The missing sink name.
        sink: String,
        /// The blueprint that asked for it.
        blueprint: String,
    },

    /// A blueprint is missing required metadata.
    #[error("invalid handler declaration [{blueprint}]: {reason}")]
    InvalidBlueprint {
        /// The rejected blueprint.
        blueprint: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two modules with different names were combined.
    #[error("cannot combine module [{found}] into module [{expected}]")]
    ModuleMismatch {
        /// Name of the receiving module.
        expected: String,
        /// Name of the module being merged in.
        found: String,
    },

    /// A module name is not present in the registry.
    #[error("unknown module: {0}")]
    UnknownModule(String),

    /// Two sinks share a name.
    #[error("duplicate sink name: {0}")]
    DuplicateSink(String),

    /// A required initialization property is absent.
    #[error("missing property: {key}")]
    MissingProperty {
        /// The property key.
        key: String,
    },

    /// An initialization property holds a value of another type.
    #[error("property [{key}] is not of type {expected}")]
    PropertyType {
        /// The property key.
        key: String,
        /// The requested type.
        expected: &'static str,
    },

    /// A handler rejected its initialization properties.
    #[error("failed to initialize handler [{handler}]")]
    Initialization {
        /// The handler that failed.
        handler: String,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },

    /// A deployment description could not be parsed.
    #[error("failed to parse dispatch configuration")]
    Parse(#[source] BoxError),

    /// A deployment description is structurally invalid.
    #[error("invalid dispatch configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Wraps an arbitrary failure as an initialization error for `handler`.
    pub fn initialization<E: Into<BoxError>>(handler: impl Into<String>, source: E) -> Self {
        Self::Initialization {
            handler: handler.into(),
            source: source.into(),
        }
    }
}

/// Errors raised by handlers while processing a message.
///
/// These propagate unchanged through chains and sinks to the caller of
/// `Sink::process`.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The request was not of the type the handler expects.
    #[error("invalid message type [{actual}], expecting [{expected}]")]
    InvalidKind {
        /// The type the handler asked for.
        expected: Kind,
        /// The type actually carried by the context.
        actual: Kind,
    },

    /// A sink reference could not be resolved.
    #[error("sink [{sink}] is not available")]
    SinkUnavailable {
        /// Name of the sink.
        sink: String,
    },

    /// A configuration step failed during processing.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A plain failure message.
    #[error("{0}")]
    Message(String),

    /// A custom handler error.
    #[error(transparent)]
    Custom(BoxError),
}

impl HandlerError {
    /// Creates an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wraps an arbitrary error.
    pub fn custom<E: Into<BoxError>>(err: E) -> Self {
        Self::Custom(err.into())
    }
}

// Convenience conversions
impl From<BoxError> for SwitchyardError {
    fn from(err: BoxError) -> Self {
        SwitchyardError::Custom(err)
    }
}

impl From<BoxError> for HandlerError {
    fn from(err: BoxError) -> Self {
        HandlerError::Custom(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Update;

    #[test]
    fn not_augmentable_display_names_both_sides() {
        let err = ConfigError::NotAugmentable {
            kind: Kind::of::<Update>(),
            existing: "Reflect".into(),
            incoming: "Audit".into(),
            refusal: AugmentRefusal::Existing,
        };
        assert_eq!(
            err.to_string(),
            "cannot register [Audit] for message [Update] over [Reflect]: existing handler isn't augmentable"
        );
    }

    #[test]
    fn invalid_kind_display() {
        let err = HandlerError::InvalidKind {
            expected: Kind::of::<Update>(),
            actual: Kind::of::<String>(),
        };
        assert_eq!(
            err.to_string(),
            "invalid message type [String], expecting [Update]"
        );
    }

    #[test]
    fn initialization_keeps_source() {
        let err = ConfigError::initialization("Timer", HandlerError::msg("no clock"));
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("no clock"));
    }

    #[test]
    fn config_error_converts_into_top_level() {
        let err: SwitchyardError = ConfigError::UnknownModule("time".into()).into();
        assert!(matches!(err, SwitchyardError::Config(_)));
        assert_eq!(err.to_string(), "configuration error: unknown module: time");
    }
}
