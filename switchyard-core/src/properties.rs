//! Initialization properties handed to handlers.

use crate::error::ConfigError;
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// Property key under which a handler receives a reference to the sink it
/// was registered with.
pub const KEY_MESSAGE_SINK: &str = "messaging.sink";

type Value = Arc<dyn Any + Send + Sync>;

/// A string-keyed bag of typed values passed to
/// [`Handler::initialize`](crate::Handler::initialize).
///
/// Values are shared, so cloning a `Properties` is cheap.
#[derive(Clone, Default)]
pub struct Properties {
    values: HashMap<String, Value>,
}

impl Properties {
    /// An empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    pub fn with<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a value, replacing any previous one under `key`.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Arc::new(value));
    }

    /// Inserts an already shared value.
    pub fn insert_shared(&mut self, key: impl Into<String>, value: Arc<dyn Any + Send + Sync>) {
        self.values.insert(key.into(), value);
    }

    /// Removes a value.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// The value under `key`, if present and of type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|value| (**value).downcast_ref::<T>())
    }

    /// The shared value under `key`.
    pub fn get_shared(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.values.get(key).cloned()
    }

    /// The value under `key`, failing if it is missing or of another type.
    pub fn require<T: Any>(&self, key: &str) -> Result<&T, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::MissingProperty { key: key.to_owned() })?;
        (**value)
            .downcast_ref::<T>()
            .ok_or_else(|| ConfigError::PropertyType {
                key: key.to_owned(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// A string value stored as `String` or `&'static str`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        let value = self.values.get(key)?;
        if let Some(s) = (**value).downcast_ref::<String>() {
            return Some(s);
        }
        (**value).downcast_ref::<&'static str>().copied()
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copies every entry of `other` into `self`, overwriting on conflict.
    pub fn extend(&mut self, other: &Properties) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), Arc::clone(value));
        }
    }

    /// A copy of `self` overlaid with `other`.
    pub fn merged(&self, other: &Properties) -> Properties {
        let mut merged = self.clone();
        merged.extend(other);
        merged
    }
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Properties").field("keys", &keys).finish()
    }
}
