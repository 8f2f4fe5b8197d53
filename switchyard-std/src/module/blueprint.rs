//! Declarative handler metadata.

use crate::sink::GlobalRole;
use switchyard_core::{
    ConfigError, Handler, HandlerMeta, HandlerRef, Kind, Message, Priority, short_type_name,
};
use std::{fmt, sync::Arc};

/// Identity of a [`Blueprint`], used to deduplicate modules.
///
/// Defaults to the fully qualified type name of the handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlueprintId(String);

impl BlueprintId {
    /// Creates an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlueprintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlueprintId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BlueprintId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

type Factory = Arc<dyn Fn() -> Arc<dyn Handler> + Send + Sync>;

/// Everything needed to deploy a handler type: where it goes, what it
/// handles and how to construct it.
///
/// # Example
///
/// ```rust,ignore
/// let blueprint = Blueprint::of::<ReflectHandler>()
///     .module("object")
///     .sink("incoming")
///     .message::<ReflectAttributes>()
///     .keyword("lrc1516e")
///     .priority(7);
/// ```
#[derive(Clone)]
pub struct Blueprint {
    id: BlueprintId,
    name: String,
    modules: Vec<String>,
    sinks: Vec<String>,
    kinds: Vec<Kind>,
    keywords: Vec<String>,
    global: GlobalRole,
    priority: Priority,
    augmentable: bool,
    factory: Factory,
}

impl Blueprint {
    /// A blueprint for `H`, constructed with `H::default()`.
    pub fn of<H: Handler + Default>() -> Self {
        Self::new(std::any::type_name::<H>(), H::default)
    }

    /// A blueprint identified by `id`, constructed by `factory`.
    ///
    /// The handler name defaults to the short type name of `H`.
    pub fn new<H, F>(id: impl Into<BlueprintId>, factory: F) -> Self
    where
        H: Handler,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: short_type_name::<H>().to_owned(),
            modules: Vec::new(),
            sinks: Vec::new(),
            kinds: Vec::new(),
            keywords: Vec::new(),
            global: GlobalRole::NONE,
            priority: Priority::DEFAULT,
            augmentable: true,
            factory: Arc::new(move || Arc::new(factory()) as Arc<dyn Handler>),
        }
    }

    // ------------------------------------------------------------------------
    // Declaration
    // ------------------------------------------------------------------------

    /// Adds the blueprint to module `name`.
    pub fn module(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.modules, name.into());
        self
    }

    /// Targets the sink called `name`.
    pub fn sink(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.sinks, name.into());
        self
    }

    /// Targets every sink in `names`.
    pub fn sinks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            push_unique(&mut self.sinks, name.into());
        }
        self
    }

    /// Handles messages of type `M`.
    pub fn message<M: Message>(self) -> Self {
        self.kind(Kind::of::<M>())
    }

    /// Handles messages of `kind`.
    pub fn kind(mut self, kind: Kind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Restricts deployment to runs that supply `keyword`.
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        push_unique(&mut self.keywords, keyword.into());
        self
    }

    /// Registers as a global handler instead of per message kind.
    pub fn global(mut self, role: GlobalRole) -> Self {
        self.global = role;
        self
    }

    /// Sets the priority, clamped into `1..=10`.
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = Priority::new(priority);
        self
    }

    /// Sets whether instances may share a kind with other handlers.
    pub fn augmentable(mut self, augmentable: bool) -> Self {
        self.augmentable = augmentable;
        self
    }

    /// Overrides the handler name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The identity.
    pub fn id(&self) -> &BlueprintId {
        &self.id
    }

    /// The name instances are registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Modules this blueprint belongs to.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Target sink names.
    pub fn target_sinks(&self) -> &[String] {
        &self.sinks
    }

    /// Handled message kinds.
    pub fn kinds(&self) -> &[Kind] {
        &self.kinds
    }

    /// Deployment keywords.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// The global role; empty for per-kind handlers.
    pub fn global_role(&self) -> GlobalRole {
        self.global
    }

    /// Returns `true` for global handlers.
    pub fn is_global(&self) -> bool {
        !self.global.is_empty()
    }

    /// The declared priority.
    pub fn declared_priority(&self) -> Priority {
        self.priority
    }

    /// The declared augmentable flag.
    pub fn is_augmentable(&self) -> bool {
        self.augmentable
    }

    // ------------------------------------------------------------------------
    // Deployment
    // ------------------------------------------------------------------------

    /// Checks that the blueprint can be deployed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidBlueprint {
            blueprint: self.id.to_string(),
            reason: reason.to_owned(),
        };
        if self.sinks.is_empty() {
            return Err(invalid("no target sink"));
        }
        if !self.is_global() && self.kinds.is_empty() {
            return Err(invalid("no message kinds and no global role"));
        }
        Ok(())
    }

    /// Returns `true` if a run with `keywords` should deploy this blueprint.
    ///
    /// An empty list on either side matches everything; otherwise one
    /// keyword must match, ignoring case (Unicode lowercase folding).
    pub fn matches_keywords(&self, keywords: &[&str]) -> bool {
        if self.keywords.is_empty() || keywords.is_empty() {
            return true;
        }
        let wanted: Vec<String> = keywords.iter().map(|kw| kw.to_lowercase()).collect();
        self.keywords
            .iter()
            .any(|own| wanted.contains(&own.to_lowercase()))
    }

    /// Constructs a fresh instance with the declared attributes.
    pub fn instantiate(&self) -> HandlerRef {
        HandlerRef::with_meta(
            (self.factory)(),
            HandlerMeta {
                name: self.name.clone(),
                priority: self.priority,
                augmentable: self.augmentable,
            },
        )
    }

    /// A multi-line description of the declaration.
    pub fn describe(&self) -> String {
        let kinds: Vec<String> = self.kinds.iter().map(ToString::to_string).collect();
        format!(
            "  handler: {}\n    id: {}\n    keywords: {:?}\n    sinks: {:?}\n    messages: {:?}\n    modules: {:?}\n    global: {:?}\n    augmentable: {}\n    priority: {}\n",
            self.name,
            self.id,
            self.keywords,
            self.sinks,
            kinds,
            self.modules,
            self.global,
            self.augmentable,
            self.priority
        )
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("modules", &self.modules)
            .field("sinks", &self.sinks)
            .field("kinds", &self.kinds)
            .field("keywords", &self.keywords)
            .field("global", &self.global)
            .field("priority", &self.priority)
            .field("augmentable", &self.augmentable)
            .finish_non_exhaustive()
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

/// A handler type that carries its own deployment declaration.
///
/// Usually implemented with `#[message_handler(...)]`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not declare a deployment blueprint",
    label = "missing `Declared` implementation",
    note = "Annotate the handler with `#[message_handler(...)]` or implement `Declared::blueprint`."
)]
pub trait Declared: Handler + Default {
    /// The deployment declaration of this handler type.
    fn blueprint() -> Blueprint;
}
