//! Routing-table entries and global roles.

use crate::chain::Chain;
use bitflags::bitflags;
use switchyard_core::{Context, Handler, HandlerRef, HandlerResult};
use std::fmt;

bitflags! {
    /// Where a global handler runs: before routing, after it, or both.
    ///
    /// The empty set means "not global".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GlobalRole: u8 {
        /// Runs in the preprocess chain.
        const PRE = 1;
        /// Runs in the postprocess chain.
        const POST = 1 << 1;
        /// Runs in both chains.
        const BOTH = Self::PRE.bits() | Self::POST.bits();
    }
}

impl GlobalRole {
    /// The "not global" role.
    pub const NONE: GlobalRole = GlobalRole::empty();
}

/// What a sink runs for one message kind.
#[derive(Clone, Debug)]
pub enum Route {
    /// A single handler.
    Handler(HandlerRef),
    /// Several handlers combined by augmentation.
    Chain(Chain),
}

impl Route {
    /// Name of the handler or chain.
    pub fn name(&self) -> &str {
        match self {
            Self::Handler(handler) => handler.name(),
            Self::Chain(chain) => chain.name(),
        }
    }

    /// Whether more handlers may join this route. Chains always accept.
    pub fn is_augmentable(&self) -> bool {
        match self {
            Self::Handler(handler) => handler.is_augmentable(),
            Self::Chain(_) => true,
        }
    }

    /// The handlers that run for this route, in order.
    pub fn handlers(&self) -> &[HandlerRef] {
        match self {
            Self::Handler(handler) => std::slice::from_ref(handler),
            Self::Chain(chain) => chain.handlers(),
        }
    }

    /// The chain, if augmentation produced one.
    pub fn as_chain(&self) -> Option<&Chain> {
        match self {
            Self::Chain(chain) => Some(chain),
            Self::Handler(_) => None,
        }
    }

    /// Mutable access to the chain, for removing individual members.
    pub fn as_chain_mut(&mut self) -> Option<&mut Chain> {
        match self {
            Self::Chain(chain) => Some(chain),
            Self::Handler(_) => None,
        }
    }

    /// Runs the route.
    pub fn process(&self, ctx: &mut Context) -> HandlerResult {
        match self {
            Self::Handler(handler) => handler.process(ctx),
            Self::Chain(chain) => chain.process(ctx),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(handler) => write!(
                f,
                "handler={}, priority={}, augmentable={}",
                handler.name(),
                handler.priority(),
                handler.is_augmentable()
            ),
            Self::Chain(chain) => write!(f, "chain={chain}"),
        }
    }
}
