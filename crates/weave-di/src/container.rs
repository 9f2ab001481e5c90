//! The container façade
//!
//! [`Container`] ties the registries together. Every lock it owns is released
//! before user code runs (service closures, extensions, producers and
//! constructors), so that code may call back into the container freely.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::cache::DependencyCache;
use crate::instances::Read;
use crate::resolver::DependencyResolver;
use crate::{
    AliasCachePolicy, AliasRegistry, Args, BindingRegistry, Closure, Concrete, ContainerBuilder,
    ContainerStats, ContextualBindingBuilder, DIError, DIResult, Extension, ExtensionManager,
    FuzzyMatcher, Injectable, InstanceRegistry, TypeCatalog, TypeProvider, Value,
};

/// Registered instances and the extension state that rewrites them.
#[derive(Debug, Default)]
struct ServiceState {
    instances: InstanceRegistry,
    extensions: ExtensionManager,
}

/// Outcome of [`Container::extend`].
#[derive(Debug, Clone)]
pub enum Extended {
    /// The service is not registered yet; the extension runs when it is set.
    Pending(Extension),
    /// The service now holds this wrapping closure.
    Applied(Closure),
}

impl Extended {
    pub fn is_pending(&self) -> bool {
        matches!(self, Extended::Pending(_))
    }

    pub fn closure(&self) -> Option<&Closure> {
        match self {
            Extended::Applied(closure) => Some(closure),
            Extended::Pending(_) => None,
        }
    }
}

/// Restores the previous "currently extending" marker when dropped.
struct ExtendingMarker<'a> {
    state: &'a Mutex<ServiceState>,
    previous: Option<String>,
}

impl Drop for ExtendingMarker<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .extensions
            .replace_extending(self.previous.take());
    }
}

/// Dependency injection container.
///
/// Named services are stored with [`set`](Self::set) and frozen on their
/// first [`get`](Self::get). Anything else `get` is asked for is built from
/// the type metadata, following bindings.
pub struct Container {
    aliases: Mutex<AliasRegistry>,
    bindings: Arc<RwLock<BindingRegistry>>,
    cache: DependencyCache,
    state: Mutex<ServiceState>,
    matcher: FuzzyMatcher,
}

impl Container {
    /// A container that knows no types.
    pub fn new() -> Self {
        Self::with_types(Arc::new(TypeCatalog::new()))
    }

    pub fn with_types(types: Arc<dyn TypeProvider>) -> Self {
        Self::from_parts(
            types,
            BindingRegistry::new(),
            HashMap::new(),
            AliasCachePolicy::default(),
            FuzzyMatcher::default(),
        )
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Build `type_name` with a fresh container over `types`.
    pub fn create(types: impl TypeProvider + 'static, type_name: &str) -> DIResult<Value> {
        Self::with_types(Arc::new(types)).get(type_name)
    }

    pub(crate) fn from_parts(
        types: Arc<dyn TypeProvider>,
        bindings: BindingRegistry,
        pending: HashMap<String, Vec<Extension>>,
        alias_cache: AliasCachePolicy,
        matcher: FuzzyMatcher,
    ) -> Self {
        let bindings = Arc::new(RwLock::new(bindings));
        let resolver = DependencyResolver::new(types, bindings.clone(), matcher);

        Self {
            aliases: Mutex::new(AliasRegistry::new(alias_cache)),
            bindings,
            cache: DependencyCache::new(resolver),
            state: Mutex::new(ServiceState {
                instances: InstanceRegistry::new(),
                extensions: ExtensionManager::with_pending(pending),
            }),
            matcher,
        }
    }

    /// Whether a service is registered under `id` or the id it aliases.
    pub fn has(&self, id: &str) -> bool {
        let id = self.canonical(id);
        self.state.lock().instances.has(&id)
    }

    /// Register a service value, then apply any extensions waiting for it.
    pub fn set(&self, id: &str, value: impl Into<Value>) -> DIResult<()> {
        {
            let mut state = self.state.lock();
            state.instances.set(id, value.into())?;
            if state.extensions.is_extending(id) || !state.extensions.has_pending(id) {
                return Ok(());
            }
        }

        self.apply_pending(id)
    }

    /// Read a registered service, or build the type `id` names.
    ///
    /// Reading a registered service freezes it.
    pub fn get(&self, id: &str) -> DIResult<Value> {
        let id = self.canonical(id);
        let read = {
            let mut state = self.state.lock();
            let ServiceState {
                instances,
                extensions,
            } = &mut *state;
            instances.checkout(&id, extensions)
        };

        match read {
            Some(Read::Value(value)) => Ok(value),
            Some(Read::Factory(closure)) => closure.invoke(self),
            Some(Read::Lazy(closure)) => {
                let resolved = closure.invoke(self)?;
                Ok(self.state.lock().instances.settle(&id, closure.id(), resolved))
            }
            None => self.create_instance(&id),
        }
    }

    /// [`get`](Self::get) a service object of type `T`.
    pub fn get_as<T: Send + Sync + 'static>(&self, id: &str) -> DIResult<Arc<T>> {
        let value = self.get(id)?;
        value.downcast::<T>().ok_or_else(|| DIError::InvalidServiceType {
            message: format!(
                "service '{}' is {}, expected {}",
                id,
                value.kind(),
                std::any::type_name::<T>()
            ),
        })
    }

    /// Resolve the callable's parameters and call it.
    pub fn resolve(&self, callable: &Injectable) -> DIResult<Value> {
        let args = self.cache.callable(callable)?;
        callable.call(Args::new(args.as_ref().clone()))
    }

    /// Mark `closure` to be invoked on every read instead of once.
    pub fn factory(&self, closure: Closure) -> Closure {
        self.state.lock().extensions.mark_factory(&closure);
        closure
    }

    /// Mark `closure` to be returned as-is instead of invoked.
    pub fn protect(&self, closure: Closure) -> Closure {
        self.state.lock().extensions.mark_protected(&closure);
        closure
    }

    /// Drop a service and its frozen flag so it can be set again.
    pub fn remove(&self, id: &str) {
        let id = self.canonical(id);
        self.state.lock().instances.remove(&id);
    }

    /// Make `alias` resolve to `id`. Aliases are single-hop.
    pub fn alias(&self, alias: impl Into<String>, id: impl Into<String>) {
        let (alias, id) = (alias.into(), id.into());
        debug!("Aliased {} to {}", alias, id);
        self.aliases.lock().add(alias, id);
    }

    /// Decorate a service.
    ///
    /// Extensions of a service that is not registered yet are queued and
    /// applied, in order, when it is set.
    pub fn extend(&self, id: &str, extension: Extension) -> DIResult<Extended> {
        let id = self.canonical(id);
        self.extend_registered(&id, extension)
    }

    /// Start a contextual binding for the given consumer types.
    pub fn when<I, S>(&self, consumers: I) -> ContextualBindingBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ContextualBindingBuilder::new(&self.bindings, consumers.into_iter().map(Into::into).collect())
    }

    /// Resolve and cache argument lists ahead of the first construction.
    pub fn warm_up<S: AsRef<str>>(&self, type_names: &[S]) -> DIResult<()> {
        self.cache.warm_up(type_names).map(|_| ())
    }

    /// Concrete type names `type_name` transitively depends on. Builds nothing.
    pub fn dependency_tree(&self, type_name: &str) -> Vec<String> {
        self.cache.resolver().dependency_tree(type_name)
    }

    /// Ids of all registered services, sorted.
    pub fn registered_services(&self) -> Vec<String> {
        let mut ids = self.state.lock().instances.ids();
        ids.sort();
        ids
    }

    /// Whether the service stored under `id` is a factory closure.
    pub fn is_factory(&self, id: &str) -> bool {
        let id = self.canonical(id);
        let state = self.state.lock();
        state
            .instances
            .raw(&id)
            .is_some_and(|value| state.extensions.is_factory(value))
    }

    /// Whether `id` has been read and can no longer be set or extended.
    pub fn is_frozen(&self, id: &str) -> bool {
        let id = self.canonical(id);
        self.state.lock().instances.is_frozen(&id)
    }

    /// Abstract identifiers with a global binding.
    pub fn bindings(&self) -> Vec<String> {
        let mut keys = self.bindings.read().keys();
        keys.sort();
        keys
    }

    /// Snapshot of what the container currently holds.
    pub fn stats(&self) -> ContainerStats {
        let (bindings, contextual_bindings) = {
            let registry = self.bindings.read();
            (registry.len(), registry.contextual_len())
        };
        let aliases = self.aliases.lock().len();
        let cached_dependencies = self.cache.len();
        let singletons = self.cache.resolver().singleton_count();

        let state = self.state.lock();
        let factory_services = state
            .instances
            .values()
            .filter(|value| state.extensions.is_factory(value))
            .count();

        ContainerStats {
            registered_services: state.instances.len(),
            frozen_services: state.instances.frozen_count(),
            factory_services,
            bindings,
            contextual_bindings,
            aliases,
            cached_dependencies,
            pending_extensions: state.extensions.pending_count(),
            singletons,
        }
    }

    fn canonical(&self, id: &str) -> String {
        self.aliases.lock().resolve(id)
    }

    fn extend_registered(&self, id: &str, extension: Extension) -> DIResult<Extended> {
        let current = {
            let mut state = self.state.lock();
            let current = state.instances.raw(id).cloned();
            let Some(current) = current else {
                state.extensions.schedule(id, extension.clone());
                return Ok(Extended::Pending(extension));
            };

            if state.instances.is_frozen(id) {
                warn!("Rejected extension of frozen service {}", id);
                return Err(DIError::FrozenInstanceExtend { id: id.to_string() });
            }
            if state.extensions.is_protected(&current) {
                warn!("Rejected extension of protected service {}", id);
                return Err(DIError::InstanceProtected { id: id.to_string() });
            }
            current
        };

        let extended = ExtensionManager::compose(id, current.clone(), extension)?;
        self.set(id, extended.clone())?;
        self.state
            .lock()
            .extensions
            .transfer_factory_status(&current, &extended);

        debug!("Extended service {}", id);
        Ok(Extended::Applied(extended))
    }

    fn apply_pending(&self, id: &str) -> DIResult<()> {
        let previous = self
            .state
            .lock()
            .extensions
            .replace_extending(Some(id.to_string()));
        let _marker = ExtendingMarker {
            state: &self.state,
            previous,
        };

        let pending = self.state.lock().extensions.pending(id);
        debug!("Applying {} pending extensions to {}", pending.len(), id);
        for extension in pending {
            self.extend_registered(id, extension)?;
        }

        self.state.lock().extensions.clear_pending(id);
        Ok(())
    }

    fn create_instance(&self, id: &str) -> DIResult<Value> {
        let binding = self.bindings.read().resolve(id, None);
        match binding {
            Some(Concrete::Producer(producer)) => return producer.produce(),
            Some(Concrete::Instance(value)) => return Ok(value),
            Some(Concrete::Type(concrete)) if self.is_instantiable(&concrete) => {
                return self.cache.instantiate(&concrete);
            }
            _ => {}
        }

        if self.is_instantiable(id) {
            return self.cache.instantiate(id);
        }

        Err(self.not_found(id))
    }

    fn is_instantiable(&self, type_name: &str) -> bool {
        self.cache
            .resolver()
            .types()
            .describe(type_name)
            .is_some_and(|descriptor| descriptor.is_instantiable())
    }

    /// Suggestions come from binding keys, registered ids and buildable type names.
    fn not_found(&self, id: &str) -> DIError {
        let mut candidates = self.bindings.read().keys();
        candidates.extend(self.state.lock().instances.ids());
        candidates.extend(
            self.cache
                .resolver()
                .types()
                .type_names()
                .into_iter()
                .filter(|name| name != id && self.is_instantiable(name)),
        );
        DIError::DependencyNotFound {
            type_name: id.to_string(),
            suggestions: self.matcher.find_similar(id, candidates),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn append(item: i64) -> Extension {
        Extension::new(move |value, _| {
            let mut list = value.as_data().cloned().unwrap_or_else(|| json!([]));
            if let Some(items) = list.as_array_mut() {
                items.push(json!(item));
            }
            Ok(Some(Value::data(list)))
        })
    }

    #[test]
    fn test_extending_marker_is_restored_after_failure() {
        let container = Container::new();
        container
            .extend("svc", Extension::new(|_, _| Ok(None)))
            .unwrap();
        let protected = container.protect(Closure::new(|_| Ok(Value::data(1))));

        assert!(matches!(
            container.set("svc", protected),
            Err(DIError::InstanceProtected { .. })
        ));
        assert!(!container.state.lock().extensions.is_extending("svc"));
    }

    #[test]
    fn test_pending_extensions_are_cleared_after_flush() {
        let container = Container::new();
        container.extend("list", append(3)).unwrap();
        assert_eq!(container.stats().pending_extensions, 1);

        container.set("list", Value::data(json!([1, 2]))).unwrap();
        assert_eq!(container.stats().pending_extensions, 0);
        assert_eq!(container.get("list").unwrap().as_data(), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn test_extended_reports_pending_or_applied() {
        let container = Container::new();
        let pending = container.extend("list", append(1)).unwrap();
        assert!(pending.is_pending());
        assert!(pending.closure().is_none());

        container.set("other", Value::data(json!([]))).unwrap();
        let applied = container.extend("other", append(1)).unwrap();
        assert!(!applied.is_pending());
        assert!(container
            .get("other")
            .is_ok_and(|value| value.as_data() == Some(&json!([1]))));
    }
}
