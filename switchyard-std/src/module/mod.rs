//! # Modules
//!
//! A [`Module`] is a named bundle of handler [`Blueprint`]s deployed
//! together. [`Module::apply`] instantiates every blueprint whose keywords
//! match and registers the instances with the sinks they target.
//!
//! Application is all-or-nothing: changes are staged on copies of the
//! supplied builders and only written back when every blueprint has been
//! registered and initialized.

mod blueprint;

pub use blueprint::{Blueprint, BlueprintId, Declared};

use crate::sink::SinkBuilder;
use switchyard_core::{ConfigError, KEY_MESSAGE_SINK, Properties};
use std::{collections::BTreeSet, fmt};

/// A named, ordered set of blueprints.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    blueprints: Vec<Blueprint>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blueprints: Vec::new(),
        }
    }

    /// The module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blueprints in insertion order.
    pub fn blueprints(&self) -> &[Blueprint] {
        &self.blueprints
    }

    /// The blueprint identified by `id`.
    pub fn blueprint(&self, id: &BlueprintId) -> Option<&Blueprint> {
        self.blueprints.iter().find(|bp| bp.id() == id)
    }

    /// Number of blueprints.
    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    /// Returns `true` if the module holds no blueprints.
    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }

    /// Adds a validated blueprint.
    ///
    /// Returns `false` if a blueprint with the same identity is already
    /// present; the module is left unchanged in that case.
    pub fn add_handler(&mut self, blueprint: Blueprint) -> Result<bool, ConfigError> {
        blueprint.validate()?;
        if self.blueprint(blueprint.id()).is_some() {
            return Ok(false);
        }
        self.blueprints.push(blueprint);
        Ok(true)
    }

    /// Adds several blueprints, stopping at the first invalid one.
    pub fn add_handlers<I>(&mut self, blueprints: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = Blueprint>,
    {
        for blueprint in blueprints {
            self.add_handler(blueprint)?;
        }
        Ok(())
    }

    /// Removes the blueprint identified by `id`.
    pub fn remove_handler(&mut self, id: &BlueprintId) -> Option<Blueprint> {
        let index = self.blueprints.iter().position(|bp| bp.id() == id)?;
        Some(self.blueprints.remove(index))
    }

    /// Merges the blueprints of a module with the same name into this one.
    pub fn combine(&mut self, other: &Module) -> Result<(), ConfigError> {
        if other.name != self.name {
            return Err(ConfigError::ModuleMismatch {
                expected: self.name.clone(),
                found: other.name.clone(),
            });
        }
        for blueprint in &other.blueprints {
            if self.blueprint(blueprint.id()).is_none() {
                self.blueprints.push(blueprint.clone());
            }
        }
        Ok(())
    }

    /// Deploys the module into `sinks`.
    ///
    /// For every blueprint whose keywords match `keywords`, one instance is
    /// created per target sink, registered (globally or once per declared
    /// kind), then initialized with `properties` plus the sink handle under
    /// [`KEY_MESSAGE_SINK`].
    ///
    /// Returns the identities of the blueprints deployed to at least one
    /// sink. On error no builder in `sinks` is modified.
    pub fn apply(
        &self,
        sinks: &mut [SinkBuilder],
        keywords: &[&str],
        properties: &Properties,
    ) -> Result<BTreeSet<BlueprintId>, ConfigError> {
        let mut staged = sinks.to_vec();
        let applied = self.apply_staged(&mut staged, keywords, properties)?;
        for (sink, staged) in sinks.iter_mut().zip(staged) {
            *sink = staged;
        }
        Ok(applied)
    }

    pub(crate) fn apply_staged(
        &self,
        sinks: &mut [SinkBuilder],
        keywords: &[&str],
        properties: &Properties,
    ) -> Result<BTreeSet<BlueprintId>, ConfigError> {
        let mut applied = BTreeSet::new();
        for blueprint in &self.blueprints {
            if !blueprint.matches_keywords(keywords) {
                tracing::trace!(
                    module = %self.name,
                    handler = blueprint.name(),
                    "keywords do not match, skipping"
                );
                continue;
            }

            for target in blueprint.target_sinks() {
                let sink = sinks
                    .iter_mut()
                    .find(|sink| sink.name() == target)
                    .ok_or_else(|| ConfigError::SinkNotFound {
                        sink: target.clone(),
                        blueprint: blueprint.name().to_owned(),
                    })?;

                let handler = blueprint.instantiate();
                if blueprint.is_global() {
                    sink.register_global_handler(handler.clone(), blueprint.global_role())?;
                } else {
                    for kind in blueprint.kinds() {
                        sink.register_handler(handler.clone(), *kind)?;
                    }
                }

                let mut init = properties.clone();
                init.insert(KEY_MESSAGE_SINK, sink.handle());
                handler
                    .initialize(&init)
                    .map_err(|err| ConfigError::initialization(handler.name(), err))?;

                applied.insert(blueprint.id().clone());
            }
        }

        tracing::debug!(
            module = %self.name,
            "Applied [{}/{}] handlers",
            applied.len(),
            self.blueprints.len()
        );
        Ok(applied)
    }

    /// A multi-line description of the module and its blueprints.
    pub fn describe(&self) -> String {
        let mut out = format!("Module: {} ({} handlers)\n", self.name, self.len());
        for blueprint in &self.blueprints {
            out.push_str(&blueprint.describe());
        }
        out
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[module: name={}, handlers={}]", self.name, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sink::{GlobalRole, Route, SinkRef},
        testing::{Journal, RecordingHandler},
    };
    use switchyard_core::{Context, Flow, Handler, HandlerRef, HandlerResult, Kind, Message};
    use std::sync::{Arc, Mutex};

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
    struct Remove;

    impl Message for Remove {
        fn kind(&self) -> Kind {
            Kind::of::<Self>()
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn recorder(journal: &Journal, label: &'static str) -> Blueprint {
        let journal = journal.clone();
        Blueprint::new(label, move || RecordingHandler::new(&journal, label)).named(label)
    }

    fn sinks() -> Vec<SinkBuilder> {
        vec![SinkBuilder::new("incoming"), SinkBuilder::new("outgoing")]
    }

    #[test]
    fn apply_registers_per_kind_and_global() {
        let journal = Journal::new();
        let mut module = Module::new("object");
        module
            .add_handler(
                recorder(&journal, "Discover")
                    .sink("incoming")
                    .message::<Discover>()
                    .message::<Remove>(),
            )
            .unwrap();
        module
            .add_handler(
                recorder(&journal, "Audit")
                    .sinks(["incoming", "outgoing"])
                    .global(GlobalRole::POST),
            )
            .unwrap();

        let mut sinks = sinks();
        let applied = module
            .apply(&mut sinks, &[], &Properties::new())
            .unwrap();
        assert_eq!(applied.len(), 2);

        let incoming = &sinks[0];
        assert!(incoming.is_supported(Kind::of::<Discover>()));
        assert!(incoming.is_supported(Kind::of::<Remove>()));
        assert_eq!(incoming.postprocess().len(), 1);
        assert_eq!(sinks[1].postprocess().len(), 1);
        assert!(!sinks[1].is_supported(Kind::of::<Discover>()));
    }

    #[test]
    fn one_instance_per_sink_shared_across_kinds() {
        let journal = Journal::new();
        let mut module = Module::new("object");
        module
            .add_handler(
                recorder(&journal, "Discover")
                    .sinks(["incoming", "outgoing"])
                    .message::<Discover>()
                    .message::<Remove>(),
            )
            .unwrap();

        let mut sinks = sinks();
        module.apply(&mut sinks, &[], &Properties::new()).unwrap();

        let handler = |sink: &SinkBuilder, kind: Kind| match sink.route(kind) {
            Some(Route::Handler(h)) => h.clone(),
            other => panic!("unexpected route {other:?}"),
        };
        let a = handler(&sinks[0], Kind::of::<Discover>());
        let b = handler(&sinks[0], Kind::of::<Remove>());
        let c = handler(&sinks[1], Kind::of::<Discover>());
        assert!(a.same_instance(&b));
        assert!(!a.same_instance(&c));
    }

    #[test]
    fn keywords_gate_deployment() {
        let journal = Journal::new();
        let mut module = Module::new("federation");
        module
            .add_handler(
                recorder(&journal, "Modern")
                    .sink("incoming")
                    .message::<Discover>()
                    .keyword("lrc1516e"),
            )
            .unwrap();
        module
            .add_handler(
                recorder(&journal, "Legacy")
                    .sink("incoming")
                    .message::<Remove>()
                    .keyword("lrc13"),
            )
            .unwrap();

        module
            .add_handler(
                recorder(&journal, "Always")
                    .sink("outgoing")
                    .message::<Remove>(),
            )
            .unwrap();

        let mut sinks = sinks();
        let applied = module
            .apply(&mut sinks, &["LRC1516E"], &Properties::new())
            .unwrap();
        assert_eq!(applied.len(), 2);
        assert!(applied.contains(&BlueprintId::from("Modern")));
        assert!(applied.contains(&BlueprintId::from("Always")));
        assert!(!applied.contains(&BlueprintId::from("Legacy")));
        assert!(sinks[0].is_supported(Kind::of::<Discover>()));
        assert!(!sinks[0].is_supported(Kind::of::<Remove>()));
        assert_eq!(
            sinks[1].route(Kind::of::<Remove>()).map(|route| route.name()),
            Some("Always")
        );
    }

    #[test]
    fn missing_sink_changes_nothing() {
        let journal = Journal::new();
        let mut module = Module::new("object");
        module
            .add_handler(recorder(&journal, "Good").sink("incoming").message::<Discover>())
            .unwrap();
        module
            .add_handler(recorder(&journal, "Lost").sink("nowhere").message::<Remove>())
            .unwrap();

        let mut sinks = sinks();
        let err = module
            .apply(&mut sinks, &[], &Properties::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::SinkNotFound { ref sink, .. } if sink == "nowhere"));
        assert!(sinks[0].supported_messages().is_empty());
    }

    #[test]
    fn refused_augmentation_changes_nothing() {
        let journal = Journal::new();
        let mut module = Module::new("object");
        module
            .add_handler(recorder(&journal, "First").sink("incoming").message::<Remove>())
            .unwrap();
        module
            .add_handler(
                recorder(&journal, "Exclusive")
                    .sink("incoming")
                    .message::<Discover>()
                    .augmentable(false),
            )
            .unwrap();

        let mut sinks = sinks();
        sinks[0]
            .register_handler(
                HandlerRef::new(RecordingHandler::new(&journal, "Existing")),
                Kind::of::<Discover>(),
            )
            .unwrap();

        assert!(module.apply(&mut sinks, &[], &Properties::new()).is_err());
        assert!(!sinks[0].is_supported(Kind::of::<Remove>()));
        assert!(matches!(
            sinks[0].route(Kind::of::<Discover>()),
            Some(Route::Handler(_))
        ));
    }

    #[derive(Default)]
    struct SinkAware {
        seen: Arc<Mutex<Option<SinkRef>>>,
    }

    impl Handler for SinkAware {
        fn process(&self, _ctx: &mut Context) -> HandlerResult {
            Ok(Flow::Continue)
        }

        fn initialize(&self, properties: &Properties) -> Result<(), ConfigError> {
            let sink = SinkRef::from_properties(properties)?;
            if properties.get_str("mode") == Some("reject") {
                return Err(ConfigError::Invalid("rejected".into()));
            }
            *self.seen.lock().unwrap() = Some(sink);
            Ok(())
        }
    }

    #[test]
    fn initialize_receives_sink_handle() {
        let seen = Arc::new(Mutex::new(None));
        let shared = Arc::clone(&seen);
        let mut module = Module::new("support");
        module
            .add_handler(
                Blueprint::new("SinkAware", move || SinkAware {
                    seen: Arc::clone(&shared),
                })
                .sink("outgoing")
                .message::<Discover>(),
            )
            .unwrap();

        let mut sinks = sinks();
        module
            .apply(&mut sinks, &[], &Properties::new().with("mode", "accept"))
            .unwrap();

        let handle = seen.lock().unwrap().clone().unwrap();
        assert_eq!(handle.name(), "outgoing");
        let sink = sinks.remove(1).build();
        assert!(handle.same_sink(&sink.handle()));
        assert!(handle.get().is_some());
    }

    #[test]
    fn initialization_failure_changes_nothing() {
        let mut module = Module::new("support");
        module
            .add_handler(Blueprint::of::<SinkAware>().sink("outgoing").message::<Discover>())
            .unwrap();

        let mut sinks = sinks();
        let err = module
            .apply(&mut sinks, &[], &Properties::new().with("mode", "reject"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Initialization { .. }));
        assert!(sinks[1].supported_messages().is_empty());
    }

    #[test]
    fn combine_and_dedup() {
        let journal = Journal::new();
        let mut left = Module::new("time");
        left.add_handler(recorder(&journal, "A").sink("incoming").message::<Discover>())
            .unwrap();
        let mut right = Module::new("time");
        right
            .add_handlers([
                recorder(&journal, "A").sink("incoming").message::<Discover>(),
                recorder(&journal, "B").sink("incoming").message::<Remove>(),
            ])
            .unwrap();

        left.combine(&right).unwrap();
        assert_eq!(left.len(), 2);

        let other = Module::new("ownership");
        assert!(matches!(
            left.combine(&other),
            Err(ConfigError::ModuleMismatch { .. })
        ));
        assert!(left.remove_handler(&BlueprintId::from("A")).is_some());
        assert_eq!(left.len(), 1);
        assert!(!left.add_handler(recorder(&journal, "B").sink("incoming").message::<Remove>()).unwrap());
    }

    #[test]
    fn invalid_blueprint_rejected() {
        let journal = Journal::new();
        let mut module = Module::new("time");
        let err = module.add_handler(recorder(&journal, "Orphan")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBlueprint { .. }));
        assert!(module.is_empty());
    }
}
