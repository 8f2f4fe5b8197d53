//! # Sinks
//!
//! A sink is a named routing table: message kind to handler or chain, a
//! default handler for unrouted kinds, and global preprocess/postprocess
//! chains that see every message.
//!
//! Sinks are configured through a [`SinkBuilder`] and frozen into an
//! immutable [`Sink`] that any number of threads may dispatch through.
//!
//! # Dispatch
//!
//! [`Sink::process`] runs three phases:
//!
//! 1. **Preprocess** - a veto here ends the dispatch; routing and
//!    postprocessing are skipped.
//! 2. **Route** - the handler or chain registered for the message kind, or
//!    the default handler. A veto ends this phase only; postprocessing
//!    still runs.
//! 3. **Postprocess** - a veto ends the dispatch.
//!
//! When a veto ends a phase and no handler has recorded a response, the
//! sink records an empty success (configurable with
//! [`SinkBuilder::auto_succeed_on_veto`]). A handler error aborts the
//! dispatch immediately and is returned to the caller untouched.

mod builder;
mod handle;
mod route;

pub use builder::SinkBuilder;
pub use handle::{SharedSink, SinkRef};
pub use route::{GlobalRole, Route};

use crate::chain::Chain;
use switchyard_core::{Context, Flow, Handler, HandlerError, HandlerRef, HandlerResult, Kind};
use std::{
    collections::{BTreeSet, HashMap},
    fmt::{self, Write as _},
    sync::{Arc, RwLock, Weak},
};

/// Late-bound link from a sink's handles to its latest frozen snapshot.
pub(crate) type Slot = Arc<RwLock<Weak<Sink>>>;

// ============================================================================
// Tables
// ============================================================================

/// State shared by [`SinkBuilder`] and [`Sink`].
#[derive(Clone)]
pub(crate) struct Tables {
    pub(crate) name: String,
    pub(crate) routes: HashMap<Kind, Route>,
    pub(crate) default: HandlerRef,
    pub(crate) pre: Chain,
    pub(crate) post: Chain,
    pub(crate) auto_succeed_on_veto: bool,
}

impl Tables {
    pub(crate) fn new(name: String) -> Self {
        Self {
            default: DefaultHandler::handler_ref(&name),
            pre: Chain::new(format!("{name}.preprocess")),
            post: Chain::new(format!("{name}.postprocess")),
            routes: HashMap::new(),
            auto_succeed_on_veto: true,
            name,
        }
    }

    pub(crate) fn is_supported(&self, kind: Kind) -> bool {
        self.routes.contains_key(&kind)
    }

    pub(crate) fn supported_messages(&self) -> BTreeSet<Kind> {
        self.routes.keys().copied().collect()
    }

    pub(crate) fn global_handler(&self, name: &str, role: GlobalRole) -> Option<&HandlerRef> {
        let pre = role
            .contains(GlobalRole::PRE)
            .then(|| self.pre.handler(name))
            .flatten();
        pre.or_else(|| {
            role.contains(GlobalRole::POST)
                .then(|| self.post.handler(name))
                .flatten()
        })
    }

    pub(crate) fn global_handlers(&self, role: GlobalRole) -> Vec<&HandlerRef> {
        let mut handlers = Vec::new();
        if role.contains(GlobalRole::PRE) {
            handlers.extend(self.pre.handlers());
        }
        if role.contains(GlobalRole::POST) {
            handlers.extend(self.post.handlers());
        }
        handlers
    }

    pub(crate) fn status(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_status(&mut out);
        out
    }

    fn write_status(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "Message Sink: name={}", self.name)?;
        writeln!(out, "Default Handler")?;
        writeln!(out, "  (DEFAULT) name={}", self.default.name())?;

        writeln!(out, "Global Handlers ({})", self.pre.len() + self.post.len())?;
        for handler in self.pre.handlers() {
            writeln!(
                out,
                "  (PREPROCESS)  name={}, priority={}",
                handler.name(),
                handler.priority()
            )?;
        }
        for handler in self.post.handlers() {
            writeln!(
                out,
                "  (POSTPROCESS) name={}, priority={}",
                handler.name(),
                handler.priority()
            )?;
        }

        writeln!(out, "Registered Handlers ({})", self.routes.len())?;
        for kind in self.supported_messages() {
            if let Some(route) = self.routes.get(&kind) {
                writeln!(out, "  (REGISTERED)  [message={kind}], {route}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Tables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[sink: name={}, handlers={}, preprocess={}, postprocess={}]",
            self.name,
            self.routes.len(),
            self.pre.len(),
            self.post.len()
        )
    }
}

// ============================================================================
// Sink
// ============================================================================

/// A frozen routing table.
///
/// Obtained from [`SinkBuilder::build`]. A sink never changes; use
/// [`to_builder`](Sink::to_builder) or [`SharedSink`] to derive an updated
/// snapshot.
pub struct Sink {
    tables: Tables,
    slot: Slot,
}

impl Sink {
    pub(crate) fn from_parts(tables: Tables, slot: Slot) -> Self {
        Self { tables, slot }
    }

    /// The sink name.
    pub fn name(&self) -> &str {
        &self.tables.name
    }

    /// Dispatches `ctx` through the preprocess, route and postprocess
    /// phases.
    ///
    /// A veto never escapes this call. Handler errors are returned as-is.
    pub fn process(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        let kind = ctx.kind();
        let span = tracing::trace_span!("sink.process", sink = %self.tables.name, message = %kind);
        let _enter = span.enter();

        if let Flow::Veto(reason) = self.tables.pre.process(ctx)? {
            tracing::trace!(phase = "preprocess", reason = reason.as_deref(), "vetoed");
            self.settle(ctx);
            return Ok(());
        }

        let flow = match self.tables.routes.get(&kind) {
            Some(route) => route.process(ctx)?,
            None => self.tables.default.process(ctx)?,
        };
        if let Flow::Veto(reason) = flow {
            tracing::trace!(phase = "route", reason = reason.as_deref(), "vetoed");
            self.settle(ctx);
        }

        if let Flow::Veto(reason) = self.tables.post.process(ctx)? {
            tracing::trace!(phase = "postprocess", reason = reason.as_deref(), "vetoed");
            self.settle(ctx);
        }
        Ok(())
    }

    fn settle(&self, ctx: &mut Context) {
        if self.tables.auto_succeed_on_veto && !ctx.has_response() {
            ctx.success();
        }
    }

    /// Returns `true` if a handler is registered for `kind`.
    pub fn is_supported(&self, kind: Kind) -> bool {
        self.tables.is_supported(kind)
    }

    /// All kinds with a registered handler.
    pub fn supported_messages(&self) -> BTreeSet<Kind> {
        self.tables.supported_messages()
    }

    /// The route for `kind`.
    pub fn route(&self, kind: Kind) -> Option<&Route> {
        self.tables.routes.get(&kind)
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

    /// Whether an unanswered context is marked successful on veto.
    pub fn auto_succeeds_on_veto(&self) -> bool {
        self.tables.auto_succeed_on_veto
    }

    /// A multi-line report of the routing table.
    pub fn status(&self) -> String {
        self.tables.status()
    }

    /// A handle that resolves to the latest snapshot of this sink.
    pub fn handle(&self) -> SinkRef {
        SinkRef::new(self.tables.name.clone(), Arc::clone(&self.slot))
    }

    /// A builder seeded with this sink's tables.
    ///
    /// Handler instances are shared with this snapshot. The result is an
    /// independent sink: its handles never resolve to this one, and this
    /// sink's handles keep resolving here.
    pub fn to_builder(&self) -> SinkBuilder {
        SinkBuilder::from_parts(self.tables.clone(), Arc::new(RwLock::new(Weak::new())))
    }

    /// A builder whose [`build`](SinkBuilder::build) re-points this sink's
    /// handles at the new snapshot. Only for callers that publish what they
    /// build.
    pub(crate) fn successor(&self) -> SinkBuilder {
        SinkBuilder::from_parts(self.tables.clone(), Arc::clone(&self.slot))
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tables, f)
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("name", &self.tables.name)
            .field("routes", &self.tables.routes.len())
            .field("preprocess", &self.tables.pre)
            .field("postprocess", &self.tables.post)
            .finish()
    }
}

// ============================================================================
// Default Handler
// ============================================================================

/// The handler a sink falls back to for unrouted kinds.
///
/// Logs a warning and continues without recording a response.
#[derive(Debug, Clone)]
pub struct DefaultHandler {
    sink: String,
}

impl DefaultHandler {
    /// Creates the fallback for the sink called `sink`.
    pub fn new(sink: impl Into<String>) -> Self {
        Self { sink: sink.into() }
    }

    fn handler_ref(sink: &str) -> HandlerRef {
        HandlerRef::new(Self::new(sink)).named(format!("{sink}.default"))
    }
}

impl Handler for DefaultHandler {
    fn process(&self, ctx: &mut Context) -> HandlerResult {
        tracing::warn!(
            sink = %self.sink,
            message = %ctx.kind(),
            "No handler for message, ignoring"
        );
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingHandler, Journal, RecordingHandler};
    use switchyard_core::Message;

    #[derive(Debug)]
    struct Discover;

    impl Message for Discover {
        fn kind(&self) -> Kind {
            Kind::of::<Self>()
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[derive(Debug)]
    struct Delete;

    impl Message for Delete {
        fn kind(&self) -> Kind {
            Kind::of::<Self>()
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[test]
    fn supported_messages_sorted_by_name() {
        let mut builder = SinkBuilder::new("incoming");
        builder
            .register_handler(HandlerRef::new(CountingHandler::new()), Kind::of::<Discover>())
            .unwrap();
        builder
            .register_handler(HandlerRef::new(CountingHandler::new()), Kind::of::<Delete>())
            .unwrap();
        let sink = builder.build();

        let names: Vec<_> = sink
            .supported_messages()
            .into_iter()
            .map(|kind| kind.short_name())
            .collect();
        assert_eq!(names, ["Delete", "Discover"]);
        assert_eq!(
            sink.to_string(),
            "[sink: name=incoming, handlers=2, preprocess=0, postprocess=0]"
        );
    }

    #[test]
    fn default_handler_named_after_sink() {
        let sink = SinkBuilder::new("outgoing").build();
        assert_eq!(sink.default_handler().name(), "outgoing.default");
        assert_eq!(sink.preprocess().name(), "outgoing.preprocess");
        assert_eq!(sink.postprocess().name(), "outgoing.postprocess");
    }

    #[test]
    fn to_builder_yields_independent_sink() {
        let journal = Journal::new();
        let mut builder = SinkBuilder::new("incoming");
        builder
            .register_handler(
                HandlerRef::new(RecordingHandler::new(&journal, "discover")),
                Kind::of::<Discover>(),
            )
            .unwrap();
        let first = builder.build();
        let handle = first.handle();

        let mut next = first.to_builder();
        next.register_handler(
            HandlerRef::new(RecordingHandler::new(&journal, "delete")),
            Kind::of::<Delete>(),
        )
        .unwrap();
        let second = next.build();

        assert!(!first.is_supported(Kind::of::<Delete>()));
        assert!(second.is_supported(Kind::of::<Discover>()));
        assert!(!handle.same_sink(&second.handle()));
        assert!(Arc::ptr_eq(&handle.get().unwrap(), &first));

        handle.process(&mut Context::new(Discover)).unwrap();
        second.handle().process(&mut Context::new(Delete)).unwrap();
        assert_eq!(journal.entries(), ["discover", "delete"]);
    }

    #[test]
    fn dropped_rebuild_leaves_live_handle_resolving() {
        let counter = CountingHandler::new();
        let mut builder = SinkBuilder::new("incoming");
        builder
            .register_handler(HandlerRef::new(counter.clone()), Kind::of::<Discover>())
            .unwrap();
        let live = builder.build();
        let handle = live.handle();

        drop(live.to_builder().build());

        assert!(Arc::ptr_eq(&handle.get().unwrap(), &live));
        handle.process(&mut Context::new(Discover)).unwrap();
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn successor_repoints_existing_handles() {
        let live = SinkBuilder::new("incoming").build();
        let handle = live.handle();
        let next = live.successor().build();
        assert!(Arc::ptr_eq(&handle.get().unwrap(), &next));
    }
}
