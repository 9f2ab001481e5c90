//! Recursive constructor-graph resolution
//!
//! The resolver walks a type's constructor parameters depth first and builds
//! every dependency before the dependent. Types currently under construction
//! are tracked on a [`ResolutionStack`] that lives for one top-level call;
//! entering a type that is already on the stack is a cycle.

use std::collections::{HashMap, HashSet};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::{
    Args, BindingRegistry, Concrete, DIError, DIResult, FuzzyMatcher, Injectable, Parameter,
    ServiceLifetime, TypeDescriptor, TypeProvider, Value,
};

/// What to resolve parameters for.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Type(&'a str),
    Callable(&'a Injectable),
}

/// Type identifiers on the active construction path.
#[derive(Debug, Default)]
pub struct ResolutionStack {
    entries: Vec<String>,
}

impl ResolutionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `type_name` for the lifetime of the returned frame.
    pub fn enter(&mut self, type_name: &str) -> DIResult<StackFrame<'_>> {
        if self.contains(type_name) {
            let mut chain = self.entries.clone();
            chain.push(type_name.to_string());
            warn!("Circular dependency detected: {}", chain.join(" -> "));
            return Err(DIError::CircularDependency { chain });
        }

        self.entries.push(type_name.to_string());
        Ok(StackFrame { stack: self })
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.iter().any(|entry| entry == type_name)
    }

    pub fn chain(&self) -> Vec<String> {
        self.entries.clone()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }
}

/// Pops its entry off the [`ResolutionStack`] when dropped, on every exit path.
#[derive(Debug)]
pub struct StackFrame<'a> {
    stack: &'a mut ResolutionStack,
}

impl Deref for StackFrame<'_> {
    type Target = ResolutionStack;

    fn deref(&self) -> &ResolutionStack {
        self.stack
    }
}

impl DerefMut for StackFrame<'_> {
    fn deref_mut(&mut self) -> &mut ResolutionStack {
        self.stack
    }
}

impl Drop for StackFrame<'_> {
    fn drop(&mut self) {
        self.stack.entries.pop();
    }
}

/// Builds constructor argument lists from type metadata and bindings.
pub struct DependencyResolver {
    types: Arc<dyn TypeProvider>,
    bindings: Arc<RwLock<BindingRegistry>>,
    matcher: FuzzyMatcher,
    singletons: Mutex<HashMap<String, Value>>,
}

impl DependencyResolver {
    pub fn new(
        types: Arc<dyn TypeProvider>,
        bindings: Arc<RwLock<BindingRegistry>>,
        matcher: FuzzyMatcher,
    ) -> Self {
        Self {
            types,
            bindings,
            matcher,
            singletons: Mutex::new(HashMap::new()),
        }
    }

    pub fn types(&self) -> &Arc<dyn TypeProvider> {
        &self.types
    }

    /// Resolve the ordered argument list for a type's constructor or a callable.
    ///
    /// A type unknown to the provider, or one without parameters, yields an
    /// empty list.
    pub fn resolve_dependencies(&self, target: Target<'_>) -> DIResult<Vec<Value>> {
        let mut stack = ResolutionStack::new();
        match target {
            Target::Type(type_name) => {
                let Some(descriptor) = self.types.describe(type_name) else {
                    return Ok(Vec::new());
                };
                let mut frame = stack.enter(type_name)?;
                self.resolve_parameters(descriptor.parameters(), Some(type_name), &mut frame)
            }
            Target::Callable(callable) => {
                self.resolve_parameters(callable.parameters(), None, &mut stack)
            }
        }
    }

    /// Build `type_name` through its descriptor, honoring singleton lifetime.
    pub fn instantiate_with(&self, descriptor: &TypeDescriptor, args: Vec<Value>) -> DIResult<Value> {
        if let Some(existing) = self.singleton(descriptor) {
            return Ok(existing);
        }

        let value = descriptor.instantiate(Args::new(args))?;
        Ok(self.remember(descriptor, value))
    }

    pub fn singleton_count(&self) -> usize {
        self.singletons.lock().len()
    }

    /// The error reported for a type nothing can be built for.
    pub fn not_found(&self, type_name: &str) -> DIError {
        let candidates = self.bindings.read().keys();
        DIError::DependencyNotFound {
            type_name: type_name.to_string(),
            suggestions: self.matcher.find_similar(type_name, candidates),
        }
    }

    /// Concrete type names `type_name` transitively needs, without building anything.
    pub fn dependency_tree(&self, type_name: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        if self.types.describe(type_name).is_some() {
            self.collect_dependencies(type_name, &mut seen, &mut ordered);
        }
        ordered
    }

    fn collect_dependencies(&self, type_name: &str, seen: &mut HashSet<String>, ordered: &mut Vec<String>) {
        let Some(descriptor) = self.types.describe(type_name) else {
            return;
        };

        for parameter in descriptor.parameters() {
            let Some(declared) = parameter.type_name() else {
                continue;
            };
            if parameter.is_builtin() {
                continue;
            }

            let concrete = match parameter.injected() {
                Some(injected) => injected.to_string(),
                None => self.bindings.read().resolve_type_name(declared),
            };
            if !seen.insert(concrete.clone()) {
                continue;
            }

            ordered.push(concrete.clone());
            self.collect_dependencies(&concrete, seen, ordered);
        }
    }

    fn resolve_parameters(
        &self,
        parameters: &[Parameter],
        consumer: Option<&str>,
        stack: &mut ResolutionStack,
    ) -> DIResult<Vec<Value>> {
        parameters
            .iter()
            .map(|parameter| self.resolve_parameter(parameter, consumer, stack))
            .collect()
    }

    fn resolve_parameter(
        &self,
        parameter: &Parameter,
        consumer: Option<&str>,
        stack: &mut ResolutionStack,
    ) -> DIResult<Value> {
        let declaring_type = || consumer.unwrap_or("callable").to_string();

        let Some(type_name) = parameter.type_name() else {
            return Err(DIError::InvalidArgument {
                parameter: parameter.name().to_string(),
                declaring_type: declaring_type(),
                type_name: None,
                chain: stack.chain(),
            });
        };

        if let Some(default) = parameter.default_value() {
            return Ok(default.clone());
        }

        if parameter.is_builtin() {
            return Err(DIError::InvalidArgument {
                parameter: parameter.name().to_string(),
                declaring_type: declaring_type(),
                type_name: Some(type_name.to_string()),
                chain: stack.chain(),
            });
        }

        match parameter.injected() {
            Some(injected) => self.instantiate(injected, stack),
            None => self.resolve_class(type_name, consumer, stack),
        }
    }

    fn resolve_class(
        &self,
        type_name: &str,
        consumer: Option<&str>,
        stack: &mut ResolutionStack,
    ) -> DIResult<Value> {
        // Clone the binding out so no lock is held while producers run.
        let binding = self.bindings.read().resolve(type_name, consumer);
        match binding {
            Some(Concrete::Producer(producer)) => producer.produce(),
            Some(Concrete::Instance(value)) => Ok(value),
            Some(Concrete::Type(concrete)) => self.instantiate(&concrete, stack),
            None => self.instantiate(type_name, stack),
        }
    }

    fn instantiate(&self, type_name: &str, stack: &mut ResolutionStack) -> DIResult<Value> {
        let descriptor = match self.types.describe(type_name) {
            Some(descriptor) if descriptor.is_instantiable() => descriptor,
            _ => return Err(self.not_found(type_name)),
        };

        if let Some(existing) = self.singleton(&descriptor) {
            return Ok(existing);
        }

        let args = {
            let mut frame = stack.enter(type_name)?;
            self.resolve_parameters(descriptor.parameters(), Some(type_name), &mut frame)?
        };

        debug!("Constructing {}", type_name);
        let value = descriptor.instantiate(Args::new(args))?;
        Ok(self.remember(&descriptor, value))
    }

    pub(crate) fn singleton(&self, descriptor: &TypeDescriptor) -> Option<Value> {
        if descriptor.lifetime() != ServiceLifetime::Singleton {
            return None;
        }
        self.singletons.lock().get(descriptor.name()).cloned()
    }

    fn remember(&self, descriptor: &TypeDescriptor, value: Value) -> Value {
        if descriptor.lifetime() != ServiceLifetime::Singleton {
            return value;
        }

        debug!("Created singleton {}", descriptor.name());
        self.singletons
            .lock()
            .entry(descriptor.name().to_string())
            .or_insert(value)
            .clone()
    }
}
