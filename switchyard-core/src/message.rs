//! Message and routing-key types.
//!
//! A [`Message`] is an immutable request value travelling through a sink.
//! Its [`Kind`] is the routing key: sinks map kinds to handlers, never
//! individual values.

use std::{
    any::{Any, TypeId},
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

// ============================================================================
// Kind
// ============================================================================

/// The routing key of a message: the identity of its concrete type.
///
/// Equality and hashing use the [`TypeId`]; ordering sorts by short type
/// name first so that sets of kinds print in a stable, readable order.
#[derive(Clone, Copy)]
pub struct Kind {
    id: TypeId,
    name: &'static str,
}

impl Kind {
    /// The kind of the message type `M`.
    pub fn of<M: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<M>(),
            name: std::any::type_name::<M>(),
        }
    }

    /// The underlying type identifier.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without its module path or generic arguments.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Returns `true` if this is the kind of `M`.
    pub fn is<M: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<M>()
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Kind {}

impl Hash for Kind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Kind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Kind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.short_name()
            .cmp(other.short_name())
            .then_with(|| self.name.cmp(other.name))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({})", self.name)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

// ============================================================================
// Message
// ============================================================================

/// A typed request or callback dispatched through a sink.
///
/// Implement with `#[derive(Message)]` rather than by hand; the derive
/// guarantees that [`kind`](Message::kind) reports the concrete type.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Message)]
/// struct JoinFederation { federate: String }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a dispatchable Message",
    label = "missing `Message` implementation",
    note = "Add `#[derive(Message)]`; messages must be `Debug + Send + Sync + 'static`."
)]
pub trait Message: Any + fmt::Debug + Send + Sync {
    /// The routing key of this message.
    fn kind(&self) -> Kind;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// A short human-readable label used in logs.
    fn identifier(&self) -> &'static str {
        self.kind().short_name()
    }
}

impl<'a> dyn Message + 'a {
    /// Returns `true` if the message is an `M`.
    pub fn is<M: Message>(&self) -> bool {
        self.as_any().is::<M>()
    }

    /// Downcasts to the concrete message type.
    pub fn downcast_ref<M: Message>(&self) -> Option<&M> {
        self.as_any().downcast_ref::<M>()
    }
}
