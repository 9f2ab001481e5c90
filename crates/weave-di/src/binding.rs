//! Abstract-to-concrete bindings and per-consumer overrides

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::{DIError, DIResult, Producer, Value};

/// What an abstract identifier is bound to.
#[derive(Debug, Clone)]
pub enum Concrete {
    /// Build this type instead.
    Type(String),
    /// Call this producer and use its result.
    Producer(Producer),
    /// Use this value as-is.
    Instance(Value),
}

impl Concrete {
    pub fn producer<F>(f: F) -> Self
    where
        F: Fn() -> DIResult<Value> + Send + Sync + 'static,
    {
        Concrete::Producer(Producer::new(f))
    }

    pub fn instance(value: impl Into<Value>) -> Self {
        Concrete::Instance(value.into())
    }

    pub fn type_name(&self) -> Option<&str> {
        match self {
            Concrete::Type(name) => Some(name),
            _ => None,
        }
    }
}

impl From<&str> for Concrete {
    fn from(type_name: &str) -> Self {
        Concrete::Type(type_name.to_string())
    }
}

impl From<String> for Concrete {
    fn from(type_name: String) -> Self {
        Concrete::Type(type_name)
    }
}

impl From<Value> for Concrete {
    fn from(value: Value) -> Self {
        Concrete::Instance(value)
    }
}

impl From<Producer> for Concrete {
    fn from(producer: Producer) -> Self {
        Concrete::Producer(producer)
    }
}

/// Global bindings plus contextual bindings keyed by consumer type.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: HashMap<String, Concrete>,
    contextual: HashMap<String, HashMap<String, Concrete>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `abstract_id` globally. Each id can be bound once.
    pub fn bind(&mut self, abstract_id: impl Into<String>, concrete: impl Into<Concrete>) -> DIResult<()> {
        let abstract_id = abstract_id.into();
        if self.bindings.contains_key(&abstract_id) {
            return Err(DIError::ServiceAlreadyRegistered {
                service_type: abstract_id,
            });
        }

        debug!("Bound {}", abstract_id);
        self.bindings.insert(abstract_id, concrete.into());
        Ok(())
    }

    /// Bind `needed` to `concrete` while building `consumer` only.
    pub fn add_contextual(&mut self, consumer: &str, needed: &str, concrete: Concrete) {
        debug!("Bound {} for consumer {}", needed, consumer);
        self.contextual
            .entry(consumer.to_string())
            .or_default()
            .insert(needed.to_string(), concrete);
    }

    /// The binding for `type_id`, preferring one scoped to `consumer`.
    pub fn resolve(&self, type_id: &str, consumer: Option<&str>) -> Option<Concrete> {
        consumer
            .and_then(|consumer| self.contextual.get(consumer))
            .and_then(|scoped| scoped.get(type_id))
            .or_else(|| self.bindings.get(type_id))
            .cloned()
    }

    /// The concrete type name `type_id` is bound to, or `type_id` unchanged.
    pub fn resolve_type_name(&self, type_id: &str) -> String {
        self.bindings
            .get(type_id)
            .and_then(Concrete::type_name)
            .unwrap_or(type_id)
            .to_string()
    }

    pub fn has(&self, type_id: &str) -> bool {
        self.bindings.contains_key(type_id)
    }

    pub fn keys(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn contextual_len(&self) -> usize {
        self.contextual.values().map(HashMap::len).sum()
    }
}

/// Starts a contextual binding: `when(consumers).needs(type).give(concrete)`.
#[must_use = "a contextual binding is only registered by calling `give`"]
pub struct ContextualBindingBuilder<'a> {
    registry: &'a RwLock<BindingRegistry>,
    consumers: Vec<String>,
}

impl<'a> ContextualBindingBuilder<'a> {
    pub(crate) fn new(registry: &'a RwLock<BindingRegistry>, consumers: Vec<String>) -> Self {
        Self {
            registry,
            consumers,
        }
    }

    /// The dependency type to override for the consumers.
    pub fn needs(self, needed: impl Into<String>) -> ContextualNeeds<'a> {
        ContextualNeeds {
            registry: self.registry,
            consumers: self.consumers,
            needed: needed.into(),
        }
    }
}

/// A contextual binding waiting for its concrete implementation.
#[must_use = "a contextual binding is only registered by calling `give`"]
pub struct ContextualNeeds<'a> {
    registry: &'a RwLock<BindingRegistry>,
    consumers: Vec<String>,
    needed: String,
}

impl ContextualNeeds<'_> {
    /// Register the binding for every consumer at once.
    pub fn give(self, concrete: impl Into<Concrete>) {
        let concrete = concrete.into();
        let mut registry = self.registry.write();
        for consumer in &self.consumers {
            registry.add_contextual(consumer, &self.needed, concrete.clone());
        }
    }
}
