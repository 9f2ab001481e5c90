//! Constructor metadata for injectable types and callables
//!
//! The container never inspects Rust types at runtime. Instead, each type it
//! can build is described once by a [`TypeDescriptor`]: its ordered
//! constructor parameters, how to construct it from resolved arguments, and
//! its lifetime. Descriptors are looked up through the [`TypeProvider`] seam;
//! [`TypeCatalog`] is the in-memory implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::registration::TypeRegistration;
use crate::{Args, DIError, DIResult, Value};

type ConstructorFn = dyn Fn(Args) -> DIResult<Value> + Send + Sync;

static NEXT_CALLABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Service lifetime management
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLifetime {
    /// Built once per container and shared
    Singleton,
    /// Built each time it's requested
    #[default]
    Transient,
}

/// Whether a type can be constructed directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Concrete,
    /// An interface or abstract type; needs a binding to be resolved.
    Abstract,
}

/// One constructor or function parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    type_name: Option<String>,
    builtin: bool,
    default: Option<Value>,
    inject: Option<String>,
}

impl Parameter {
    /// A parameter typed with a class or interface name.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.into()),
            builtin: false,
            default: None,
            inject: None,
        }
    }

    /// A parameter of a builtin scalar type such as `string` or `int`.
    pub fn builtin(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            builtin: true,
            ..Self::new(name, type_name)
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            builtin: false,
            default: None,
            inject: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Always inject `concrete` for this parameter, whatever is bound to its type.
    pub fn inject(mut self, concrete: impl Into<String>) -> Self {
        self.inject = Some(concrete.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn injected(&self) -> Option<&str> {
        self.inject.as_deref()
    }
}

/// Describes how to build one type.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    parameters: Vec<Parameter>,
    constructor: Option<Arc<ConstructorFn>>,
    lifetime: ServiceLifetime,
}

impl TypeDescriptor {
    /// A constructible type.
    pub fn concrete<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(Args) -> DIResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: TypeKind::Concrete,
            parameters: Vec::new(),
            constructor: Some(Arc::new(constructor)),
            lifetime: ServiceLifetime::default(),
        }
    }

    /// An interface or abstract type.
    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Abstract,
            parameters: Vec::new(),
            constructor: None,
            lifetime: ServiceLifetime::default(),
        }
    }

    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn singleton(self) -> Self {
        self.with_lifetime(ServiceLifetime::Singleton)
    }

    pub fn with_lifetime(mut self, lifetime: ServiceLifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    pub fn is_instantiable(&self) -> bool {
        self.kind == TypeKind::Concrete && self.constructor.is_some()
    }

    /// Run the constructor with already resolved arguments.
    pub fn instantiate(&self, args: Args) -> DIResult<Value> {
        match &self.constructor {
            Some(constructor) => constructor(args),
            None => Err(DIError::DependencyNotFound {
                type_name: self.name.clone(),
                suggestions: Vec::new(),
            }),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parameters", &self.parameters)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Source of constructor metadata for type identifiers.
pub trait TypeProvider: Send + Sync {
    fn describe(&self, type_name: &str) -> Option<Arc<TypeDescriptor>>;

    /// Every type name this provider knows about.
    fn type_names(&self) -> Vec<String>;
}

/// In-memory [`TypeProvider`] filled by explicit registration.
#[derive(Debug, Default, Clone)]
pub struct TypeCatalog {
    types: HashMap<String, Arc<TypeDescriptor>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. A name can only be registered once.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> DIResult<()> {
        if self.types.contains_key(descriptor.name()) {
            return Err(DIError::ServiceAlreadyRegistered {
                service_type: descriptor.name().to_string(),
            });
        }

        debug!("Registered type: {}", descriptor.name());
        self.types
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
        Ok(())
    }

    /// Register every [`TypeRegistration`] submitted through `inventory`.
    ///
    /// Types that are already present are left untouched.
    pub fn register_discovered(&mut self) -> usize {
        let mut added = 0;
        for registration in inventory::iter::<TypeRegistration>() {
            if self.types.contains_key(registration.name) {
                continue;
            }
            let descriptor = (registration.describe)();
            self.types
                .insert(descriptor.name().to_string(), Arc::new(descriptor));
            added += 1;
        }
        debug!("Registered {} discovered types", added);
        added
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeProvider for TypeCatalog {
    fn describe(&self, type_name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(type_name).cloned()
    }

    fn type_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }
}

/// A function whose parameters the container resolves before calling it.
#[derive(Clone)]
pub struct Injectable {
    key: String,
    parameters: Vec<Parameter>,
    body: Arc<ConstructorFn>,
}

impl Injectable {
    /// An anonymous callable. Every call to `new` yields a distinct cache key.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(Args) -> DIResult<Value> + Send + Sync + 'static,
    {
        let id = NEXT_CALLABLE_ID.fetch_add(1, Ordering::Relaxed);
        Self::named(format!("closure#{}", id), body)
    }

    /// A named callable, cached under its name.
    pub fn named<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Args) -> DIResult<Value> + Send + Sync + 'static,
    {
        Self {
            key: name.into(),
            parameters: Vec::new(),
            body: Arc::new(body),
        }
    }

    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn call(&self, args: Args) -> DIResult<Value> {
        (self.body)(args)
    }
}

impl fmt::Debug for Injectable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injectable")
            .field("key", &self.key)
            .field("parameters", &self.parameters)
            .finish()
    }
}
