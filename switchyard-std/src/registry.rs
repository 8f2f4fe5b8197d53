//! Registry module for blueprint management.
//!
//! This module provides a builder for collecting handler blueprints and a
//! frozen [`Registry`] that groups them into modules and deploys them into
//! sinks.
//!
//! The registry is an explicit list: every handler type that should be
//! deployable is registered by the application at startup.

use crate::{
    config::DispatchConfig,
    module::{Blueprint, BlueprintId, Declared, Module},
    sink::{Sink, SinkBuilder},
};
use switchyard_core::{ConfigError, Properties};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

// ============================================================================
// Builder
// ============================================================================

/// Builder for constructing a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    blueprints: Vec<Blueprint>,
}

impl RegistryBuilder {
    /// Create a new empty registry builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a blueprint.
    pub fn register(mut self, blueprint: Blueprint) -> Self {
        self.blueprints.push(blueprint);
        self
    }

    /// Register the declared blueprint of `H`.
    pub fn declare<H: Declared>(self) -> Self {
        self.register(H::blueprint())
    }

    /// Validate every blueprint and group them into modules.
    ///
    /// A blueprint listing several modules joins each of them.
    pub fn build(self) -> Result<Registry, ConfigError> {
        let mut modules: BTreeMap<String, Module> = BTreeMap::new();
        for blueprint in self.blueprints {
            blueprint.validate()?;
            if blueprint.modules().is_empty() {
                return Err(ConfigError::InvalidBlueprint {
                    blueprint: blueprint.id().to_string(),
                    reason: "no module".into(),
                });
            }
            for name in blueprint.modules() {
                modules
                    .entry(name.clone())
                    .or_insert_with(|| Module::new(name.as_str()))
                    .add_handler(blueprint.clone())?;
            }
        }
        tracing::debug!(modules = modules.len(), "registry built");
        Ok(Registry { modules })
    }
}

// ============================================================================
// Registry
// ============================================================================

/// The frozen catalog of all deployable modules.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    modules: BTreeMap<String, Module>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Collect ready-made modules, combining those that share a name.
    pub fn from_modules<I>(modules: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Module>,
    {
        let mut combined: BTreeMap<String, Module> = BTreeMap::new();
        for module in modules {
            match combined.get_mut(module.name()) {
                Some(existing) => existing.combine(&module)?,
                None => {
                    combined.insert(module.name().to_owned(), module);
                }
            }
        }
        Ok(Self { modules: combined })
    }

    /// All modules, ordered by name.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// The module called `name`.
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Module names, in order.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if no module is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Applies every module to `sinks`.
    ///
    /// All-or-nothing across modules: on error no builder is modified.
    pub fn apply(
        &self,
        sinks: &mut [SinkBuilder],
        keywords: &[&str],
        properties: &Properties,
    ) -> Result<DeploymentReport, ConfigError> {
        self.apply_all(self.modules.values().collect(), sinks, keywords, properties)
    }

    /// Applies the named modules to `sinks`, in the order given.
    pub fn apply_modules(
        &self,
        names: &[&str],
        sinks: &mut [SinkBuilder],
        keywords: &[&str],
        properties: &Properties,
    ) -> Result<DeploymentReport, ConfigError> {
        let selected = names
            .iter()
            .map(|name| {
                self.modules
                    .get(*name)
                    .ok_or_else(|| ConfigError::UnknownModule((*name).to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.apply_all(selected, sinks, keywords, properties)
    }

    fn apply_all(
        &self,
        modules: Vec<&Module>,
        sinks: &mut [SinkBuilder],
        keywords: &[&str],
        properties: &Properties,
    ) -> Result<DeploymentReport, ConfigError> {
        let mut staged = sinks.to_vec();
        let mut report = DeploymentReport::default();
        let mut declared = BTreeSet::new();

        for module in modules {
            declared.extend(module.blueprints().iter().map(|bp| bp.id().clone()));
            let applied = module.apply_staged(&mut staged, keywords, properties)?;
            report.applied.insert(module.name().to_owned(), applied);
        }

        let applied: BTreeSet<BlueprintId> =
            report.applied.values().flatten().cloned().collect();
        report.unused = declared.difference(&applied).cloned().collect();
        report.declared = declared.len();

        for (sink, staged) in sinks.iter_mut().zip(staged) {
            *sink = staged;
        }

        tracing::info!(
            unused = report.unused.len(),
            "Applied [{}/{}] handlers",
            applied.len(),
            report.declared
        );
        Ok(report)
    }

    /// Creates the sinks described by `config`, applies the selected modules
    /// and freezes the result.
    ///
    /// `properties` override the configuration's own properties.
    pub fn deploy(
        &self,
        config: &DispatchConfig,
        properties: &Properties,
    ) -> Result<Deployment, ConfigError> {
        config.validate()?;

        let mut builders: Vec<SinkBuilder> = config
            .sinks
            .iter()
            .map(|sink| {
                SinkBuilder::new(sink.name.as_str()).auto_succeed_on_veto(sink.auto_succeed_on_veto)
            })
            .collect();
        let properties = config.properties().merged(properties);
        let keywords = config.keyword_refs();

        let report = if config.modules.is_empty() {
            self.apply(&mut builders, &keywords, &properties)?
        } else {
            let names: Vec<&str> = config.modules.iter().map(String::as_str).collect();
            self.apply_modules(&names, &mut builders, &keywords, &properties)?
        };

        let sinks = builders
            .into_iter()
            .map(|builder| (builder.name().to_owned(), builder.build()))
            .collect();
        Ok(Deployment { sinks, report })
    }

    /// A multi-line description of every module.
    pub fn describe(&self) -> String {
        self.modules.values().map(Module::describe).collect()
    }
}

// ============================================================================
// Reports
// ============================================================================

/// What a registry application deployed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentReport {
    applied: BTreeMap<String, BTreeSet<BlueprintId>>,
    unused: BTreeSet<BlueprintId>,
    declared: usize,
}

impl DeploymentReport {
    /// Blueprints deployed by the module called `module`.
    pub fn applied(&self, module: &str) -> Option<&BTreeSet<BlueprintId>> {
        self.applied.get(module)
    }

    /// Returns `true` if the blueprint was deployed by any module.
    pub fn is_applied(&self, id: &BlueprintId) -> bool {
        self.applied.values().any(|ids| ids.contains(id))
    }

    /// Number of distinct blueprints deployed.
    pub fn applied_count(&self) -> usize {
        self.applied
            .values()
            .flatten()
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Number of distinct blueprints in the applied modules.
    pub fn declared_count(&self) -> usize {
        self.declared
    }

    /// Blueprints that were not deployed anywhere, typically because their
    /// keywords did not match.
    pub fn unused(&self) -> &BTreeSet<BlueprintId> {
        &self.unused
    }
}

/// Frozen sinks produced by [`Registry::deploy`].
#[derive(Debug)]
pub struct Deployment {
    sinks: BTreeMap<String, Arc<Sink>>,
    report: DeploymentReport,
}

impl Deployment {
    /// The sink called `name`.
    pub fn sink(&self, name: &str) -> Option<&Arc<Sink>> {
        self.sinks.get(name)
    }

    /// All sinks by name.
    pub fn sinks(&self) -> &BTreeMap<String, Arc<Sink>> {
        &self.sinks
    }

    /// What was deployed.
    pub fn report(&self) -> &DeploymentReport {
        &self.report
    }

    /// Takes ownership of the sinks.
    pub fn into_sinks(self) -> BTreeMap<String, Arc<Sink>> {
        self.sinks
    }
}
