//! Deployment configuration: which sinks exist, which modules are applied
//! and with which keywords and properties.
//!
//! # Example TOML
//!
//! ```toml
//! keywords = ["lrc1516e"]
//! modules = []              # empty: every module in the registry
//!
//! [[sinks]]
//! name = "incoming"
//!
//! [[sinks]]
//! name = "outgoing"
//! auto_succeed_on_veto = false
//!
//! [properties]
//! "lrc.name" = "federate-1"
//! "lrc.lookahead" = 10
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use switchyard_core::{ConfigError, Properties};
use std::collections::HashSet;

/// Top-level deployment configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Keywords selecting which blueprints are deployed.
    pub keywords: Vec<String>,

    /// Modules to apply. Empty means every module.
    pub modules: Vec<String>,

    /// Sinks to create, in order.
    pub sinks: Vec<SinkConfig>,

    /// Initialization properties passed to every handler.
    pub properties: Map<String, Value>,
}

/// A single sink definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SinkConfig {
    /// Unique sink name.
    pub name: String,

    /// Whether a veto marks an unanswered context successful. Default: true.
    #[serde(default = "default_auto_succeed")]
    pub auto_succeed_on_veto: bool,
}

fn default_auto_succeed() -> bool {
    true
}

impl SinkConfig {
    /// A sink definition with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_succeed_on_veto: true,
        }
    }
}

impl DispatchConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|err| ConfigError::Parse(Box::new(err)))
    }

    /// Checks that at least one sink is defined and sink names are unique
    /// and non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sinks.is_empty() {
            return Err(ConfigError::Invalid("no sinks defined".into()));
        }
        let mut seen = HashSet::new();
        for sink in &self.sinks {
            if sink.name.trim().is_empty() {
                return Err(ConfigError::Invalid("sink name must not be empty".into()));
            }
            if !seen.insert(sink.name.as_str()) {
                return Err(ConfigError::DuplicateSink(sink.name.clone()));
            }
        }
        Ok(())
    }

    /// The keywords as borrowed strings.
    pub fn keyword_refs(&self) -> Vec<&str> {
        self.keywords.iter().map(String::as_str).collect()
    }

    /// The configured properties as handler initialization properties.
    ///
    /// Strings become `String`, booleans `bool`, integers `i64`, other
    /// numbers `f64`. Arrays, tables and nulls are kept as
    /// `serde_json::Value`.
    pub fn properties(&self) -> Properties {
        let mut properties = Properties::new();
        for (key, value) in &self.properties {
            match value {
                Value::String(s) => properties.insert(key.clone(), s.clone()),
                Value::Bool(b) => properties.insert(key.clone(), *b),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => properties.insert(key.clone(), i),
                    None => properties.insert(key.clone(), n.as_f64().unwrap_or(f64::NAN)),
                },
                other => properties.insert(key.clone(), other.clone()),
            }
        }
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
keywords = ["lrc1516e"]

[[sinks]]
name = "incoming"

[[sinks]]
name = "outgoing"
auto_succeed_on_veto = false

[properties]
"lrc.name" = "federate-1"
"lrc.lookahead" = 10
"lrc.strict" = true
"lrc.ratio" = 0.5
"#;

    #[test]
    fn parses_sample() {
        let config = DispatchConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            config.sinks,
            [
                SinkConfig::new("incoming"),
                SinkConfig {
                    name: "outgoing".into(),
                    auto_succeed_on_veto: false,
                },
            ]
        );
        assert_eq!(config.keyword_refs(), ["lrc1516e"]);
        assert!(config.modules.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn properties_are_typed() {
        let props = DispatchConfig::from_toml_str(SAMPLE).unwrap().properties();
        assert_eq!(props.get_str("lrc.name"), Some("federate-1"));
        assert_eq!(props.get::<i64>("lrc.lookahead"), Some(&10));
        assert_eq!(props.get::<bool>("lrc.strict"), Some(&true));
        assert_eq!(props.get::<f64>("lrc.ratio"), Some(&0.5));
    }

    #[test]
    fn empty_document_is_default() {
        let config = DispatchConfig::from_toml_str("").unwrap();
        assert_eq!(config, DispatchConfig::default());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn duplicate_sinks_rejected() {
        let config = DispatchConfig {
            sinks: vec![SinkConfig::new("incoming"), SinkConfig::new("incoming")],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateSink(name)) if name == "incoming"
        ));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = DispatchConfig::from_toml_str("[[sinks]\nname =").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
