//! Filter handler for conditional processing.

use switchyard_core::{Context, Flow, Handler, HandlerResult, Message};

/// A handler that vetoes messages failing a predicate.
///
/// As a preprocess handler it drops unwanted traffic before routing; inside
/// a chain it stops the members behind it.
pub struct FilterHandler<F> {
    predicate: F,
    reason: String,
}

impl<F> FilterHandler<F>
where
    F: Fn(&dyn Message) -> bool + Send + Sync + 'static,
{
    /// Create a filter passing messages for which `predicate` holds.
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            reason: "filtered".to_owned(),
        }
    }

    /// Set the veto reason reported for rejected messages.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

impl<F> Handler for FilterHandler<F>
where
    F: Fn(&dyn Message) -> bool + Send + Sync + 'static,
{
    fn process(&self, ctx: &mut Context) -> HandlerResult {
        if (self.predicate)(ctx.request()) {
            Ok(Flow::Continue)
        } else {
            Ok(Flow::veto(self.reason.as_str()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::Kind;

    #[derive(Debug)]
    struct Heartbeat(u32);

    impl Message for Heartbeat {
        fn kind(&self) -> Kind {
            Kind::of::<Self>()
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn even(message: &dyn Message) -> bool {
        message
            .downcast_ref::<Heartbeat>()
            .is_some_and(|beat| beat.0 % 2 == 0)
    }

    #[test]
    fn passes_matching_messages() {
        let filter = FilterHandler::new(even);
        let flow = filter.process(&mut Context::new(Heartbeat(4))).unwrap();
        assert!(flow.is_continue());
    }

    #[test]
    fn vetoes_with_reason() {
        let filter = FilterHandler::new(even).with_reason("odd heartbeat");
        let flow = filter.process(&mut Context::new(Heartbeat(3))).unwrap();
        assert_eq!(flow.reason(), Some("odd heartbeat"));
    }
}
