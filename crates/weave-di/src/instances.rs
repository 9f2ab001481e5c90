//! Registered service instances and their frozen state

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::{Closure, ClosureId, DIError, DIResult, ExtensionManager, Value};

/// What a read of a registered service has to do next.
///
/// The registry never invokes closures itself; the container does, without
/// holding any lock.
#[derive(Debug, Clone)]
pub enum Read {
    /// Return this value verbatim.
    Value(Value),
    /// Invoke on every read; the stored closure stays in place.
    Factory(Closure),
    /// Invoke once, then [`InstanceRegistry::settle`] the result.
    Lazy(Closure),
}

/// Stored service values keyed by id.
///
/// An id moves from absent to present on `set`, and from present to frozen
/// on its first read. `remove` returns any id to absent.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: HashMap<String, Value>,
    frozen: HashSet<String>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    pub fn set(&mut self, id: &str, value: Value) -> DIResult<()> {
        if self.frozen.contains(id) {
            warn!("Rejected override of frozen service {}", id);
            return Err(DIError::FrozenInstanceOverride { id: id.to_string() });
        }

        debug!("Set service {} ({})", id, value.kind());
        self.instances.insert(id.to_string(), value);
        Ok(())
    }

    /// Freeze `id` and decide how its stored value is read.
    pub fn checkout(&mut self, id: &str, extensions: &ExtensionManager) -> Option<Read> {
        let value = self.instances.get(id)?;
        self.frozen.insert(id.to_string());

        let read = match value {
            Value::Closure(closure) if extensions.is_factory(value) => Read::Factory(closure.clone()),
            Value::Closure(closure) if !extensions.is_protected(value) => Read::Lazy(closure.clone()),
            other => Read::Value(other.clone()),
        };
        Some(read)
    }

    /// Cache the result of a lazy closure in place of the closure.
    ///
    /// Leaves the entry alone if it no longer holds that closure.
    pub fn settle(&mut self, id: &str, closure: ClosureId, resolved: Value) -> Value {
        if let Some(stored) = self.instances.get_mut(id) {
            if stored.as_closure().map(Closure::id) == Some(closure) {
                *stored = resolved.clone();
            }
        }
        resolved
    }

    pub fn remove(&mut self, id: &str) {
        debug!("Removed service {}", id);
        self.instances.remove(id);
        self.frozen.remove(id);
    }

    pub fn is_frozen(&self, id: &str) -> bool {
        self.frozen.contains(id)
    }

    /// The stored value without reading it, so nothing is frozen or invoked.
    pub fn raw(&self, id: &str) -> Option<&Value> {
        self.instances.get(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.instances.keys().cloned().collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.instances.values()
    }

    pub fn frozen_count(&self) -> usize {
        self.frozen.len()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
