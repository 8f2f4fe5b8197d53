//! Priority-ordered handler chains.

use switchyard_core::{Context, Flow, Handler, HandlerRef, HandlerResult};
use std::fmt;

/// An ordered composite of handlers that is itself a [`Handler`].
///
/// Members are kept in descending priority. Members of equal priority keep
/// their insertion order.
///
/// Processing runs the members in order and stops at the first veto or
/// error, which is returned unchanged to the caller.
#[derive(Clone, Default)]
pub struct Chain {
    name: String,
    handlers: Vec<HandlerRef>,
}

impl Chain {
    /// Creates an empty chain.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Vec::new(),
        }
    }

    /// Adds a handler, builder style.
    pub fn with(mut self, handler: HandlerRef) -> Self {
        self.add_handler(handler);
        self
    }

    /// The chain name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts `handler` before the first member of strictly lower priority,
    /// or at the end.
    pub fn add_handler(&mut self, handler: HandlerRef) {
        let priority = handler.priority();
        let index = self
            .handlers
            .iter()
            .position(|member| member.priority() < priority)
            .unwrap_or(self.handlers.len());
        self.handlers.insert(index, handler);
    }

    /// Removes the first member called `name`.
    pub fn remove_handler(&mut self, name: &str) -> Option<HandlerRef> {
        let index = self.handlers.iter().position(|h| h.name() == name)?;
        Some(self.handlers.remove(index))
    }

    /// Removes the member at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<HandlerRef> {
        (index < self.handlers.len()).then(|| self.handlers.remove(index))
    }

    /// The first member called `name`.
    pub fn handler(&self, name: &str) -> Option<&HandlerRef> {
        self.handlers.iter().find(|h| h.name() == name)
    }

    /// The member at `index`.
    pub fn handler_at(&self, index: usize) -> Option<&HandlerRef> {
        self.handlers.get(index)
    }

    /// Returns `true` if a member is called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handler(name).is_some()
    }

    /// All members in execution order.
    pub fn handlers(&self) -> &[HandlerRef] {
        &self.handlers
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if the chain has no members.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Removes every member.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl Handler for Chain {
    fn process(&self, ctx: &mut Context) -> HandlerResult {
        for handler in &self.handlers {
            let flow = handler.process(ctx)?;
            if flow.is_veto() {
                tracing::trace!(
                    chain = %self.name,
                    handler = handler.name(),
                    reason = flow.reason(),
                    "chain vetoed"
                );
                return Ok(flow);
            }
        }
        Ok(Flow::Continue)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, handler) in self.handlers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{handler}")?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name)
            .field("handlers", &self.handlers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingHandler, Journal, RecordingHandler, VetoHandler};
    use switchyard_core::{Kind, Message};

    #[derive(Debug)]
    struct Tick;

    impl Message for Tick {
        fn kind(&self) -> Kind {
            Kind::of::<Self>()
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn recorder(journal: &Journal, label: &str, priority: u8) -> HandlerRef {
        HandlerRef::new(RecordingHandler::new(journal, label))
            .named(label)
            .with_priority(priority)
    }

    #[test]
    fn keeps_descending_priority() {
        let journal = Journal::new();
        let mut chain = Chain::new("time");
        chain.add_handler(recorder(&journal, "B", 3));
        chain.add_handler(recorder(&journal, "A", 8));
        chain.add_handler(recorder(&journal, "C", 5));
        assert_eq!(chain.to_string(), "[A(8), C(5), B(3)]");
    }

    #[test]
    fn equal_priorities_keep_insertion_order() {
        let journal = Journal::new();
        let chain = Chain::new("time")
            .with(recorder(&journal, "first", 5))
            .with(recorder(&journal, "second", 5))
            .with(recorder(&journal, "third", 5));

        let mut ctx = Context::new(Tick);
        assert_eq!(chain.process(&mut ctx).unwrap(), Flow::Continue);
        assert_eq!(journal.entries(), ["first", "second", "third"]);
    }

    #[test]
    fn veto_stops_remaining_members() {
        let journal = Journal::new();
        let chain = Chain::new("guarded")
            .with(recorder(&journal, "early", 9))
            .with(HandlerRef::new(VetoHandler::new(&journal, "gate")).with_priority(5))
            .with(recorder(&journal, "late", 1));

        let mut ctx = Context::new(Tick);
        assert!(chain.process(&mut ctx).unwrap().is_veto());
        assert_eq!(journal.entries(), ["early", "gate"]);
    }

    #[test]
    fn error_propagates_and_stops() {
        let journal = Journal::new();
        let chain = Chain::new("failing")
            .with(HandlerRef::new(FailingHandler::new(&journal, "boom")))
            .with(recorder(&journal, "after", 1));

        let mut ctx = Context::new(Tick);
        assert!(chain.process(&mut ctx).is_err());
        assert_eq!(journal.entries(), ["boom"]);
    }

    #[test]
    fn nested_veto_stops_outer_chain() {
        let journal = Journal::new();
        let inner = Chain::new("inner")
            .with(HandlerRef::new(VetoHandler::new(&journal, "inner-gate")));
        let outer = Chain::new("outer")
            .with(HandlerRef::new(inner).with_priority(9))
            .with(recorder(&journal, "outer-tail", 1));

        let mut ctx = Context::new(Tick);
        assert!(outer.process(&mut ctx).unwrap().is_veto());
        assert_eq!(journal.entries(), ["inner-gate"]);
    }

    #[test]
    fn lookup_and_removal() {
        let journal = Journal::new();
        let mut chain = Chain::new("ops")
            .with(recorder(&journal, "A", 8))
            .with(recorder(&journal, "B", 3));

        assert_eq!(chain.handler_at(1).map(HandlerRef::name), Some("B"));
        assert!(chain.contains("A"));
        assert_eq!(chain.remove_handler("A").map(|h| h.name().to_owned()), Some("A".into()));
        assert!(chain.remove_handler("A").is_none());
        assert!(chain.remove_at(5).is_none());
        assert_eq!(chain.len(), 1);
        chain.clear();
        assert!(chain.is_empty());
    }
}
