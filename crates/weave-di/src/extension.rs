//! Factory and protected marking, pending extensions, decorator composition

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{Closure, ClosureId, DIError, DIResult, Extension, Value};

/// Tracks closure markings and extensions waiting for their service.
#[derive(Debug, Default)]
pub struct ExtensionManager {
    factories: HashSet<ClosureId>,
    protected: HashSet<ClosureId>,
    pending: HashMap<String, Vec<Extension>>,
    currently_extending: Option<String>,
}

impl ExtensionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with extensions already queued per service id.
    pub fn with_pending(pending: HashMap<String, Vec<Extension>>) -> Self {
        Self {
            pending,
            ..Self::default()
        }
    }

    pub fn mark_factory(&mut self, closure: &Closure) {
        self.factories.insert(closure.id());
    }

    pub fn mark_protected(&mut self, closure: &Closure) {
        self.protected.insert(closure.id());
    }

    pub fn is_factory(&self, value: &Value) -> bool {
        value
            .as_closure()
            .is_some_and(|closure| self.factories.contains(&closure.id()))
    }

    pub fn is_protected(&self, value: &Value) -> bool {
        value
            .as_closure()
            .is_some_and(|closure| self.protected.contains(&closure.id()))
    }

    /// Queue `extension` until `id` is set.
    pub fn schedule(&mut self, id: &str, extension: Extension) {
        debug!("Scheduled extension for {}", id);
        self.pending.entry(id.to_string()).or_default().push(extension);
    }

    pub fn has_pending(&self, id: &str) -> bool {
        self.pending.get(id).is_some_and(|queue| !queue.is_empty())
    }

    /// Extensions queued for `id`, in scheduling order.
    pub fn pending(&self, id: &str) -> Vec<Extension> {
        self.pending.get(id).cloned().unwrap_or_default()
    }

    pub fn clear_pending(&mut self, id: &str) {
        self.pending.remove(id);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    pub fn is_extending(&self, id: &str) -> bool {
        self.currently_extending.as_deref() == Some(id)
    }

    /// Swap the currently extending marker, returning the previous one.
    pub fn replace_extending(&mut self, id: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.currently_extending, id)
    }

    /// Move factory marking from the closure an extension replaced to its wrapper.
    pub fn transfer_factory_status(&mut self, from: &Value, to: &Closure) {
        let Some(from) = from.as_closure() else {
            return;
        };
        if self.factories.remove(&from.id()) {
            self.factories.insert(to.id());
        }
    }

    /// Wrap `current` so that reading the result applies `extension` to it.
    ///
    /// A closure is invoked first and the extension sees its result. Objects,
    /// arrays and maps are handed to the extension directly.
    pub fn compose(id: &str, current: Value, extension: Extension) -> DIResult<Closure> {
        if !current.is_extendable() {
            return Err(DIError::InstanceNotExtendable { id: id.to_string() });
        }

        Ok(Closure::new(move |container| {
            let base = match &current {
                Value::Closure(inner) => inner.invoke(container)?,
                other => other.clone(),
            };
            extension.apply(base, container)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marking_is_per_closure_identity() {
        let mut manager = ExtensionManager::new();
        let factory = Closure::new(|_| Ok(Value::data(1)));
        let twin = Closure::new(|_| Ok(Value::data(1)));
        manager.mark_factory(&factory);

        assert!(manager.is_factory(&factory.clone().into()));
        assert!(!manager.is_factory(&twin.into()));
        assert!(!manager.is_factory(&Value::data(1)));
        assert!(!manager.is_protected(&factory.into()));
    }

    #[test]
    fn test_pending_keeps_scheduling_order() {
        let mut manager = ExtensionManager::new();
        manager.schedule("svc", Extension::new(|_, _| Ok(None)));
        manager.schedule("svc", Extension::new(|_, _| Ok(None)));

        assert!(manager.has_pending("svc"));
        assert_eq!(manager.pending("svc").len(), 2);
        assert_eq!(manager.pending_count(), 2);

        manager.clear_pending("svc");
        assert!(!manager.has_pending("svc"));
        assert!(manager.pending("svc").is_empty());
    }

    #[test]
    fn test_transfer_factory_status_moves_marking() {
        let mut manager = ExtensionManager::new();
        let old = Closure::new(|_| Ok(Value::data(1)));
        let new = Closure::new(|_| Ok(Value::data(2)));
        manager.mark_factory(&old);

        manager.transfer_factory_status(&old.clone().into(), &new);
        assert!(!manager.is_factory(&old.into()));
        assert!(manager.is_factory(&new.into()));
    }

    #[test]
    fn test_transfer_ignores_unmarked_values() {
        let mut manager = ExtensionManager::new();
        let new = Closure::new(|_| Ok(Value::data(2)));
        manager.transfer_factory_status(&Value::data(serde_json::json!([1])), &new);
        assert!(!manager.is_factory(&new.into()));
    }

    #[test]
    fn test_compose_rejects_scalars() {
        let result = ExtensionManager::compose("port", Value::data(8080), Extension::new(|_, _| Ok(None)));
        assert!(matches!(result, Err(DIError::InstanceNotExtendable { id }) if id == "port"));
    }

    #[test]
    fn test_extending_marker_round_trip() {
        let mut manager = ExtensionManager::new();
        assert_eq!(manager.replace_extending(Some("svc".into())), None);
        assert!(manager.is_extending("svc"));
        assert!(!manager.is_extending("other"));
        assert_eq!(manager.replace_extending(None), Some("svc".into()));
        assert!(!manager.is_extending("svc"));
    }
}
