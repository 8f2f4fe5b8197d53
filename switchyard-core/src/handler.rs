//! # Handlers
//!
//! A [`Handler`] is the unit of message processing. It receives the shared
//! [`Context`] and tells the enclosing chain or sink how to proceed:
//!
//! - `Ok(Flow::Continue)` - keep going
//! - `Ok(Flow::Veto(_))` - stop the current phase, the call is complete
//! - `Err(_)` - abort the dispatch and surface the failure
//!
//! The handler trait carries only behavior. Name, priority and the
//! augmentable flag travel alongside it in a [`HandlerRef`], which is what
//! chains and sinks store.

use crate::{
    context::Context,
    error::{ConfigError, HandlerError},
    properties::Properties,
};
use std::{fmt, sync::Arc};

// ============================================================================
// Flow
// ============================================================================

/// Control signal returned by a handler.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Flow {
    /// Pass the context to the next handler.
    #[default]
    Continue,
    /// Stop the current phase and treat the call as completed normally.
    Veto(Option<String>),
}

impl Flow {
    /// A veto carrying a reason for the logs.
    pub fn veto(reason: impl Into<String>) -> Self {
        Self::Veto(Some(reason.into()))
    }

    /// Returns `true` for [`Flow::Veto`].
    pub fn is_veto(&self) -> bool {
        matches!(self, Self::Veto(_))
    }

    /// Returns `true` for [`Flow::Continue`].
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// The veto reason, if one was given.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Veto(reason) => reason.as_deref(),
            Self::Continue => None,
        }
    }
}

/// The result of [`Handler::process`].
pub type HandlerResult = Result<Flow, HandlerError>;

// ============================================================================
// Handler
// ============================================================================

/// Processes messages routed to it by a sink.
///
/// # Example
///
/// ```rust,ignore
/// struct Resign;
///
/// impl Handler for Resign {
///     fn process(&self, ctx: &mut Context) -> HandlerResult {
///         let request = ctx.request_as::<ResignFederation>()?;
///         // ...
///         ctx.success();
///         Ok(Flow::Continue)
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a message handler",
    label = "missing `Handler` implementation",
    note = "Handlers must implement `process(&self, &mut Context) -> HandlerResult`."
)]
pub trait Handler: Send + Sync + 'static {
    /// Processes the context.
    fn process(&self, ctx: &mut Context) -> HandlerResult;

    /// Called once after the handler has been registered with a sink.
    ///
    /// `properties` carries deployment settings plus a reference to the
    /// owning sink under [`KEY_MESSAGE_SINK`](crate::KEY_MESSAGE_SINK).
    fn initialize(&self, properties: &Properties) -> Result<(), ConfigError> {
        let _ = properties;
        Ok(())
    }
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn process(&self, ctx: &mut Context) -> HandlerResult {
        (**self).process(ctx)
    }

    fn initialize(&self, properties: &Properties) -> Result<(), ConfigError> {
        (**self).initialize(properties)
    }
}

// ============================================================================
// Priority
// ============================================================================

/// Handler priority in `1..=10`. Higher runs earlier within a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    /// The lowest priority.
    pub const MIN: Priority = Priority(1);
    /// The highest priority.
    pub const MAX: Priority = Priority(10);
    /// The priority of handlers that do not declare one.
    pub const DEFAULT: Priority = Priority(5);

    /// Creates a priority, clamping `value` into `1..=10`.
    pub const fn new(value: u8) -> Self {
        if value < Self::MIN.0 {
            Self::MIN
        } else if value > Self::MAX.0 {
            Self::MAX
        } else {
            Self(value)
        }
    }

    /// The numeric value.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// HandlerRef
// ============================================================================

/// Registration attributes of a handler instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerMeta {
    /// Display name, used in logs and for lookup within chains.
    pub name: String,
    /// Ordering within a chain.
    pub priority: Priority,
    /// Whether the handler may share its kind with other handlers.
    pub augmentable: bool,
}

impl HandlerMeta {
    /// Metadata with default priority, augmentable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: Priority::DEFAULT,
            augmentable: true,
        }
    }
}

/// A shared handler instance together with its registration attributes.
///
/// Cloning is cheap; clones share the handler instance but carry their own
/// copy of the attributes.
#[derive(Clone)]
pub struct HandlerRef {
    meta: HandlerMeta,
    handler: Arc<dyn Handler>,
}

impl HandlerRef {
    /// Wraps `handler`, naming it after its type.
    pub fn new<H: Handler>(handler: H) -> Self {
        Self::from_arc(Arc::new(handler), short_type_name::<H>())
    }

    /// Wraps an already shared handler.
    pub fn from_arc(handler: Arc<dyn Handler>, name: impl Into<String>) -> Self {
        Self {
            meta: HandlerMeta::new(name),
            handler,
        }
    }

    /// Wraps a shared handler with explicit attributes.
    pub fn with_meta(handler: Arc<dyn Handler>, meta: HandlerMeta) -> Self {
        Self { meta, handler }
    }

    /// Sets the name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.meta.name = name.into();
        self
    }

    /// Sets the priority, clamped into `1..=10`.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.meta.priority = Priority::new(priority);
        self
    }

    /// Sets the augmentable flag.
    pub fn augmentable(mut self, augmentable: bool) -> Self {
        self.meta.augmentable = augmentable;
        self
    }

    /// The handler name.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Renames the handler.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.meta.name = name.into();
    }

    /// The handler priority.
    pub fn priority(&self) -> Priority {
        self.meta.priority
    }

    /// Changes the priority, clamped into `1..=10`.
    pub fn set_priority(&mut self, priority: u8) {
        self.meta.priority = Priority::new(priority);
    }

    /// Whether other handlers may be combined with this one.
    pub fn is_augmentable(&self) -> bool {
        self.meta.augmentable
    }

    /// Changes the augmentable flag.
    pub fn set_augmentable(&mut self, augmentable: bool) {
        self.meta.augmentable = augmentable;
    }

    /// All registration attributes.
    pub fn meta(&self) -> &HandlerMeta {
        &self.meta
    }

    /// The shared handler instance.
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Returns `true` if both refer to the same handler instance.
    pub fn same_instance(&self, other: &HandlerRef) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }

    /// Runs the handler.
    pub fn process(&self, ctx: &mut Context) -> HandlerResult {
        self.handler.process(ctx)
    }

    /// Initializes the handler.
    pub fn initialize(&self, properties: &Properties) -> Result<(), ConfigError> {
        self.handler.initialize(properties)
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRef")
            .field("name", &self.meta.name)
            .field("priority", &self.meta.priority)
            .field("augmentable", &self.meta.augmentable)
            .finish()
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.meta.name, self.meta.priority)
    }
}

/// The type name of `T` without module path or generic arguments.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
