//! # Message Context
//!
//! A [`Context`] pairs one request [`Message`] with the [`Response`] that
//! handlers eventually record for it. Every handler in a dispatch receives
//! the same `&mut Context`.
//!
//! Recording a response does not stop processing. Later handlers may read
//! it, and only another explicit `success*` or `error*` call replaces it.

use crate::{
    error::{BoxError, HandlerError},
    message::{Kind, Message},
    response::Response,
};
use std::{any::Any, error::Error, fmt};

/// The request/response envelope for a single dispatch.
pub struct Context {
    request: Box<dyn Message>,
    response: Option<Response>,
}

impl Context {
    /// Creates a context for `request` with no response.
    pub fn new<M: Message>(request: M) -> Self {
        Self::from_boxed(Box::new(request))
    }

    /// Creates a context for an already boxed request.
    pub fn from_boxed(request: Box<dyn Message>) -> Self {
        Self {
            request,
            response: None,
        }
    }

    // ------------------------------------------------------------------------
    // Request
    // ------------------------------------------------------------------------

    /// The current request.
    pub fn request(&self) -> &dyn Message {
        &*self.request
    }

    /// The routing key of the current request.
    pub fn kind(&self) -> Kind {
        (*self.request).kind()
    }

    /// The request as `M`, without side effects.
    pub fn try_request<M: Message>(&self) -> Option<&M> {
        (*self.request).as_any().downcast_ref::<M>()
    }

    /// The request as `M`.
    ///
    /// On a type mismatch this records an error response on the context
    /// before returning [`HandlerError::InvalidKind`].
    pub fn request_as<M: Message>(&mut self) -> Result<&M, HandlerError> {
        let expected = Kind::of::<M>();
        let actual = self.kind();
        if !(*self.request).as_any().is::<M>() {
            self.error(format!(
                "Invalid message type [{actual}], expecting [{expected}]"
            ));
            return Err(HandlerError::InvalidKind { expected, actual });
        }
        (*self.request)
            .as_any()
            .downcast_ref::<M>()
            .ok_or(HandlerError::InvalidKind { expected, actual })
    }

    /// Replaces the request, keeping any recorded response.
    pub fn set_request<M: Message>(&mut self, request: M) {
        self.request = Box::new(request);
    }

    /// Replaces the request with an already boxed one.
    pub fn set_boxed_request(&mut self, request: Box<dyn Message>) {
        self.request = request;
    }

    /// Replaces the request and clears the response, readying the context
    /// for reuse.
    pub fn reset<M: Message>(&mut self, request: M) {
        self.request = Box::new(request);
        self.response = None;
    }

    /// Consumes the context, returning the request and response.
    pub fn into_parts(self) -> (Box<dyn Message>, Option<Response>) {
        (self.request, self.response)
    }

    // ------------------------------------------------------------------------
    // Response
    // ------------------------------------------------------------------------

    /// The recorded response, if any.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Removes and returns the recorded response.
    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }

    /// Returns `true` once a terminal outcome has been recorded.
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// Returns `true` if the recorded response is a success.
    pub fn is_success_response(&self) -> bool {
        self.response.as_ref().is_some_and(Response::is_success)
    }

    /// Returns `true` if the recorded response is an error.
    pub fn is_error_response(&self) -> bool {
        self.response.as_ref().is_some_and(Response::is_error)
    }

    /// Records a success without a result value.
    pub fn success(&mut self) {
        self.response = Some(Response::Success(None));
    }

    /// Records a success carrying `value`.
    pub fn success_with<T: Any + Send + Sync>(&mut self, value: T) {
        self.response = Some(Response::Success(Some(Box::new(value))));
    }

    /// The success result downcast to `T`.
    pub fn success_result<T: Any>(&self) -> Option<&T> {
        self.response.as_ref().and_then(Response::result::<T>)
    }

    /// Records a failure described by `message`.
    pub fn error(&mut self, message: impl Into<String>) {
        self.response = Some(Response::Error {
            message: message.into(),
            cause: None,
        });
    }

    /// Records a failure caused by `cause`.
    pub fn error_with<E: Into<BoxError>>(&mut self, cause: E) {
        let cause = cause.into();
        self.response = Some(Response::Error {
            message: cause.to_string(),
            cause: Some(cause),
        });
    }

    /// The failure description of an error response.
    pub fn error_message(&self) -> Option<&str> {
        self.response.as_ref().and_then(Response::message)
    }

    /// The underlying failure of an error response.
    pub fn error_cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.response.as_ref().and_then(Response::cause)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request", &self.request)
            .field("response", &self.response)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Join {
        federate: &'static str,
    }

    #[derive(Debug)]
    struct Resign;

    macro_rules! message {
        ($ty:ty) => {
            impl Message for $ty {
                fn kind(&self) -> Kind {
                    Kind::of::<Self>()
                }
                fn as_any(&self) -> &dyn Any {
                    self
                }
            }
        };
    }

    message!(Join);
    message!(Resign);

    #[test]
    fn new_context_has_no_response() {
        let ctx = Context::new(Resign);
        assert!(!ctx.has_response());
        assert!(!ctx.is_success_response());
        assert_eq!(ctx.kind(), Kind::of::<Resign>());
    }

    #[test]
    fn request_as_matches_type() {
        let mut ctx = Context::new(Join { federate: "alpha" });
        let join = ctx.request_as::<Join>().unwrap();
        assert_eq!(join.federate, "alpha");
        assert!(!ctx.has_response());
    }

    #[test]
    fn request_as_mismatch_records_error() {
        let mut ctx = Context::new(Resign);
        let err = ctx.request_as::<Join>().unwrap_err();
        assert!(matches!(err, HandlerError::InvalidKind { .. }));
        assert!(ctx.is_error_response());
        assert_eq!(
            ctx.error_message(),
            Some("Invalid message type [Resign], expecting [Join]")
        );
    }

    #[test]
    fn success_with_value_is_retrievable() {
        let mut ctx = Context::new(Resign);
        ctx.success_with(42_u32);
        assert!(ctx.is_success_response());
        assert_eq!(ctx.success_result::<u32>(), Some(&42));
        assert_eq!(ctx.success_result::<String>(), None);
    }

    #[test]
    fn later_outcome_replaces_earlier() {
        let mut ctx = Context::new(Resign);
        ctx.error("first");
        ctx.success();
        assert!(ctx.is_success_response());
        assert_eq!(ctx.error_message(), None);
    }

    #[test]
    fn error_with_keeps_cause() {
        let mut ctx = Context::new(Resign);
        ctx.error_with(HandlerError::msg("federation not joined"));
        assert_eq!(ctx.error_message(), Some("federation not joined"));
        assert!(ctx.error_cause().is_some());
    }

    #[test]
    fn reset_clears_response() {
        let mut ctx = Context::new(Resign);
        ctx.success();
        ctx.reset(Join { federate: "beta" });
        assert!(!ctx.has_response());
        assert!(ctx.try_request::<Join>().is_some());
    }
}
