//! Mutable sink configuration.

use super::{DefaultHandler, GlobalRole, Route, Sink, SinkRef, Slot, Tables};
use crate::chain::Chain;
use switchyard_core::{AugmentRefusal, ConfigError, HandlerRef, Kind};
use std::{
    collections::{BTreeSet, hash_map::Entry},
    fmt,
    sync::{Arc, PoisonError, RwLock, Weak},
};

/// Builder for a [`Sink`].
///
/// All registration happens here. [`build`](SinkBuilder::build) freezes the
/// tables into an immutable, shareable sink.
///
/// Cloning a builder is cheap: handler instances are shared. Clones keep
/// the same identity, so handles taken from either resolve to whichever
/// clone is built last.
#[derive(Clone)]
pub struct SinkBuilder {
    tables: Tables,
    slot: Slot,
}

impl SinkBuilder {
    /// Creates an empty sink called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            tables: Tables::new(name.into()),
            slot: Arc::new(RwLock::new(Weak::new())),
        }
    }

    pub(crate) fn from_parts(tables: Tables, slot: Slot) -> Self {
        Self { tables, slot }
    }

    /// Sets whether a veto marks an unanswered context successful.
    ///
    /// Enabled by default.
    pub fn auto_succeed_on_veto(mut self, enabled: bool) -> Self {
        self.tables.auto_succeed_on_veto = enabled;
        self
    }

    /// The sink name.
    pub fn name(&self) -> &str {
        &self.tables.name
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Registers `handler` for messages of `kind`.
    ///
    /// If the kind already has a route, the two are combined: an existing
    /// chain gains the handler in priority order, and a single handler is
    /// replaced by a new chain `"<existing>-augmented"` holding both. Both
    /// sides must be augmentable; otherwise nothing changes and
    /// [`ConfigError::NotAugmentable`] is returned.
    pub fn register_handler(&mut self, handler: HandlerRef, kind: Kind) -> Result<(), ConfigError> {
        let mut slot = match self.tables.routes.entry(kind) {
            Entry::Vacant(slot) => {
                tracing::debug!(
                    sink = %self.tables.name,
                    message = %kind,
                    handler = handler.name(),
                    "registered handler"
                );
                slot.insert(Route::Handler(handler));
                return Ok(());
            }
            Entry::Occupied(slot) => slot,
        };

        let refusal = if !handler.is_augmentable() {
            Some(AugmentRefusal::Incoming)
        } else if !slot.get().is_augmentable() {
            Some(AugmentRefusal::Existing)
        } else {
            None
        };
        if let Some(refusal) = refusal {
            return Err(ConfigError::NotAugmentable {
                kind,
                existing: slot.get().name().to_owned(),
                incoming: handler.name().to_owned(),
                refusal,
            });
        }

        tracing::debug!(
            sink = %self.tables.name,
            message = %kind,
            handler = handler.name(),
            existing = slot.get().name(),
            "augmenting handler"
        );
        let route = slot.get_mut();
        let augmented = match route {
            Route::Chain(chain) => {
                chain.add_handler(handler);
                None
            }
            Route::Handler(existing) => Some(
                Chain::new(format!("{}-augmented", existing.name()))
                    .with(existing.clone())
                    .with(handler),
            ),
        };
        if let Some(chain) = augmented {
            *route = Route::Chain(chain);
        }
        Ok(())
    }

    /// Registers `handler` in the global chains selected by `role`.
    ///
    /// An empty role is rejected with [`ConfigError::NotGlobal`].
    pub fn register_global_handler(
        &mut self,
        handler: HandlerRef,
        role: GlobalRole,
    ) -> Result<(), ConfigError> {
        if role.is_empty() {
            return Err(ConfigError::NotGlobal {
                handler: handler.name().to_owned(),
            });
        }
        tracing::debug!(
            sink = %self.tables.name,
            handler = handler.name(),
            ?role,
            "registered global handler"
        );
        if role.contains(GlobalRole::PRE) {
            self.tables.pre.add_handler(handler.clone());
        }
        if role.contains(GlobalRole::POST) {
            self.tables.post.add_handler(handler);
        }
        Ok(())
    }

    /// Removes the route for `kind`.
    pub fn remove_handler(&mut self, kind: Kind) -> Option<Route> {
        self.tables.routes.remove(&kind)
    }

    /// Removes global handlers called `name` from the chains selected by
    /// `role`. Returns `true` if anything was removed.
    pub fn remove_global_handler(&mut self, name: &str, role: GlobalRole) -> bool {
        let mut removed = false;
        if role.contains(GlobalRole::PRE) {
            removed |= self.tables.pre.remove_handler(name).is_some();
        }
        if role.contains(GlobalRole::POST) {
            removed |= self.tables.post.remove_handler(name).is_some();
        }
        removed
    }

    /// Replaces the handler used for unrouted kinds.
    pub fn set_default_handler(&mut self, handler: HandlerRef) {
        self.tables.default = handler;
    }

    /// Drops every route and global handler and restores the built-in
    /// default handler.
    pub fn clear(&mut self) {
        self.tables.routes.clear();
        self.tables.pre.clear();
        self.tables.post.clear();
        self.tables.default = DefaultHandler::handler_ref(&self.tables.name);
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// The route for `kind`.
    pub fn route(&self, kind: Kind) -> Option<&Route> {
        self.tables.routes.get(&kind)
    }

    /// Mutable access to the route for `kind`.
    pub fn route_mut(&mut self, kind: Kind) -> Option<&mut Route> {
        self.tables.routes.get_mut(&kind)
    }

    /// Returns `true` if another handler could still be registered for
    /// `kind`.
    pub fn is_augmentable(&self, kind: Kind) -> bool {
        self.tables
            .routes
            .get(&kind)
            .is_none_or(Route::is_augmentable)
    }

    /// Returns `true` if a handler is registered for `kind`.
    pub fn is_supported(&self, kind: Kind) -> bool {
        self.tables.is_supported(kind)
    }

    /// All kinds with a registered handler.
    pub fn supported_messages(&self) -> BTreeSet<Kind> {
        self.tables.supported_messages()
    }

    /// The handler used for unrouted kinds.
    pub fn default_handler(&self) -> &HandlerRef {
        &self.tables.default
    }

    /// The preprocess chain.
    pub fn preprocess(&self) -> &Chain {
        &self.tables.pre
    }

    /// The postprocess chain.
    pub fn postprocess(&self) -> &Chain {
        &self.tables.post
    }

    /// The first global handler called `name` in the chains selected by
    /// `role`.
    pub fn global_handler(&self, name: &str, role: GlobalRole) -> Option<&HandlerRef> {
        self.tables.global_handler(name, role)
    }

    /// The global handlers in the chains selected by `role`.
    pub fn global_handlers(&self, role: GlobalRole) -> Vec<&HandlerRef> {
        self.tables.global_handlers(role)
    }

    /// A multi-line report of the routing table.
    pub fn status(&self) -> String {
        self.tables.status()
    }

    // ------------------------------------------------------------------------
    // Freezing
    // ------------------------------------------------------------------------

    /// A handle to this sink, resolvable once the builder is built.
    pub fn handle(&self) -> SinkRef {
        SinkRef::new(self.tables.name.clone(), Arc::clone(&self.slot))
    }

    /// Freezes the tables and points every handle of this sink at the
    /// result.
    pub fn build(self) -> Arc<Sink> {
        let sink = Arc::new(Sink::from_parts(self.tables, Arc::clone(&self.slot)));
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Arc::downgrade(&sink);
        tracing::debug!(sink = sink.name(), "sink built");
        sink
    }
}

impl fmt::Display for SinkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tables, f)
    }
}

impl fmt::Debug for SinkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkBuilder")
            .field("name", &self.tables.name)
            .field("routes", &self.tables.routes.len())
            .field("preprocess", &self.tables.pre)
            .field("postprocess", &self.tables.post)
            .finish()
    }
}
