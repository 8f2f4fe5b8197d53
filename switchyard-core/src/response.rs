//! Terminal outcome of a dispatched message.

use crate::error::BoxError;
use std::{any::Any, error::Error, fmt};

/// Opaque success payload carried by a [`Response`].
pub type Payload = Box<dyn Any + Send + Sync>;

/// The outcome recorded on a [`Context`](crate::Context).
///
/// A context starts without a response; handlers record one with
/// `success*` or `error*`. The engine itself only ever records an empty
/// success, and only when a veto ends a phase of an unanswered call.
pub enum Response {
    /// The call completed, optionally with a result value.
    Success(Option<Payload>),

    /// The call failed.
    Error {
        /// Human-readable failure description.
        message: String,
        /// The underlying failure, if one was supplied.
        cause: Option<BoxError>,
    },
}

impl Response {
    /// Returns `true` for [`Response::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns `true` for [`Response::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The success payload downcast to `T`.
    pub fn result<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Success(Some(value)) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// The failure description, if this is an error.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Error { message, .. } => Some(message),
            Self::Success(_) => None,
        }
    }

    /// The underlying failure, if this is an error carrying one.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            Self::Error {
                cause: Some(cause), ..
            } => Some(&**cause),
            _ => None,
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(None) => f.write_str("Success"),
            Self::Success(Some(_)) => f.write_str("Success(..)"),
            Self::Error { message, cause } => f
                .debug_struct("Error")
                .field("message", message)
                .field("cause", cause)
                .finish(),
        }
    }
}
