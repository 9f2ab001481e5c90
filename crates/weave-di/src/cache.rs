//! Memoized constructor argument lists
//!
//! The first construction of a type resolves its argument list; every later
//! construction reuses that exact list. Dependencies that are not factories
//! are therefore shared between instances of the same dependent type.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::resolver::{DependencyResolver, Target};
use crate::{DIResult, Injectable, Value};

type ArgList = Arc<Vec<Value>>;

/// Argument lists keyed by type name, and separately by callable key.
pub struct DependencyCache {
    resolver: DependencyResolver,
    entries: RwLock<HashMap<String, ArgList>>,
    callables: RwLock<HashMap<String, ArgList>>,
}

impl DependencyCache {
    pub fn new(resolver: DependencyResolver) -> Self {
        Self {
            resolver,
            entries: RwLock::new(HashMap::new()),
            callables: RwLock::new(HashMap::new()),
        }
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    /// The argument list for `type_name`, resolving it on first access.
    pub fn get(&self, type_name: &str) -> DIResult<ArgList> {
        Self::get_or_resolve(&self.entries, &self.resolver, type_name, Target::Type(type_name))
    }

    /// The argument list for a callable, keyed by its identity.
    ///
    /// Callable keys never collide with type names, even when a named callable
    /// shares its name with a type.
    pub fn callable(&self, callable: &Injectable) -> DIResult<ArgList> {
        Self::get_or_resolve(
            &self.callables,
            &self.resolver,
            callable.key(),
            Target::Callable(callable),
        )
    }

    /// Resolve and cache argument lists for every known, instantiable type.
    ///
    /// Anything else is skipped; failures resolving a known type are returned.
    pub fn warm_up<S: AsRef<str>>(&self, type_names: &[S]) -> DIResult<usize> {
        let mut warmed = 0;
        for type_name in type_names.iter().map(AsRef::as_ref) {
            let instantiable = self
                .resolver
                .types()
                .describe(type_name)
                .is_some_and(|descriptor| descriptor.is_instantiable());
            if !instantiable {
                debug!("Skipping warm-up of {}", type_name);
                continue;
            }

            self.get(type_name)?;
            warmed += 1;
        }

        info!("Warmed up {} of {} types", warmed, type_names.len());
        Ok(warmed)
    }

    /// Build `type_name` from its cached argument list.
    pub fn instantiate(&self, type_name: &str) -> DIResult<Value> {
        let descriptor = match self.resolver.types().describe(type_name) {
            Some(descriptor) if descriptor.is_instantiable() => descriptor,
            _ => return Err(self.resolver.not_found(type_name)),
        };

        if let Some(existing) = self.resolver.singleton(&descriptor) {
            return Ok(existing);
        }

        let args = self.get(type_name)?;
        debug!("Constructing {}", type_name);
        self.resolver.instantiate_with(&descriptor, args.as_ref().clone())
    }

    /// Whether the argument list of type `type_name` is cached.
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.read().contains_key(type_name)
    }

    /// Whether the argument list of `callable` is cached.
    pub fn contains_callable(&self, callable: &Injectable) -> bool {
        self.callables.read().contains_key(callable.key())
    }

    /// Cached argument lists, types and callables together.
    pub fn len(&self) -> usize {
        self.entries.read().len() + self.callables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_or_resolve(
        entries: &RwLock<HashMap<String, ArgList>>,
        resolver: &DependencyResolver,
        key: &str,
        target: Target<'_>,
    ) -> DIResult<ArgList> {
        if let Some(cached) = entries.read().get(key) {
            return Ok(cached.clone());
        }

        // Resolved outside the lock: constructors may call back into the container.
        let resolved = Arc::new(resolver.resolve_dependencies(target)?);
        debug!("Cached {} arguments for {}", resolved.len(), key);
        Ok(entries
            .write()
            .entry(key.to_string())
            .or_insert(resolved)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{BindingRegistry, FuzzyMatcher, Parameter, TypeCatalog, TypeDescriptor};

    struct Engine;
    struct Car {
        engine: Arc<Engine>,
    }

    static ENGINES_BUILT: AtomicUsize = AtomicUsize::new(0);

    fn cache() -> DependencyCache {
        let mut catalog = TypeCatalog::new();
        catalog
            .register(TypeDescriptor::concrete("Engine", |_| {
                ENGINES_BUILT.fetch_add(1, Ordering::SeqCst);
                Ok(Value::object(Engine))
            }))
            .unwrap();
        catalog
            .register(
                TypeDescriptor::concrete("Car", |args| {
                    Ok(Value::object(Car { engine: args.object::<Engine>(0)? }))
                })
                .param(Parameter::new("engine", "Engine")),
            )
            .unwrap();
        catalog
            .register(TypeDescriptor::abstract_type("Vehicle"))
            .unwrap();

        DependencyCache::new(DependencyResolver::new(
            Arc::new(catalog),
            Arc::new(RwLock::new(BindingRegistry::new())),
            FuzzyMatcher::default(),
        ))
    }

    #[test]
    fn test_cached_arguments_are_reused() {
        let cache = cache();
        let first = cache.instantiate("Car").unwrap().downcast::<Car>().unwrap();
        let second = cache.instantiate("Car").unwrap().downcast::<Car>().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first.engine, &second.engine));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_warm_up_skips_unknown_and_abstract_types() {
        let cache = cache();
        let warmed = cache.warm_up(&["Car", "Vehicle", "Nope"]).unwrap();

        assert_eq!(warmed, 1);
        assert!(cache.contains("Car"));
        assert!(!cache.contains("Vehicle"));
        assert!(!cache.contains("Nope"));
    }

    #[test]
    fn test_warm_up_resolves_without_constructing_the_target() {
        let cache = cache();
        let before = ENGINES_BUILT.load(Ordering::SeqCst);
        cache.warm_up(&["Car"]).unwrap();

        // Car's engine argument is built, Car itself is not
        assert!(ENGINES_BUILT.load(Ordering::SeqCst) > before);
        assert!(cache.contains("Car"));
    }

    #[test]
    fn test_distinct_callables_get_distinct_entries() {
        let cache = cache();
        let a = Injectable::new(|_| Ok(Value::data(1))).param(Parameter::new("engine", "Engine"));
        let b = Injectable::new(|_| Ok(Value::data(1))).param(Parameter::new("engine", "Engine"));

        cache.callable(&a).unwrap();
        cache.callable(&a.clone()).unwrap();
        cache.callable(&b).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_named_callable_does_not_share_type_entry() {
        let cache = cache();
        cache.get("Engine").unwrap();

        let handler = Injectable::named("Engine", |_| Ok(Value::data(1)))
            .param(Parameter::new("engine", "Engine"));
        assert_eq!(cache.callable(&handler).unwrap().len(), 1);
        assert!(cache.contains("Engine"));
        assert!(cache.contains_callable(&handler));
        assert_eq!(cache.len(), 2);
    }
}
