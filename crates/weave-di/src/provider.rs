//! Service Provider trait for grouping container registrations
//!
//! A `ServiceProvider` bundles the types and bindings of one module so the
//! application only has to list providers when building its container.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use weave_di::{ContainerBuilder, DIResult, Parameter, ServiceProvider, TypeDescriptor, Value};
//!
//! pub struct LoggingProvider;
//!
//! impl ServiceProvider for LoggingProvider {
//!     fn name(&self) -> &'static str {
//!         "logging"
//!     }
//!
//!     fn register(&self, builder: &mut ContainerBuilder) -> DIResult<()> {
//!         builder.add_type(TypeDescriptor::concrete("FileLogger", |_| Ok(Value::object(FileLogger))))?;
//!         builder.add_binding("LoggerInterface", "FileLogger")?;
//!         Ok(())
//!     }
//! }
//!
//! let container = ContainerBuilder::new().provider(LoggingProvider).build()?;
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use crate::{Container, ContainerBuilder, DIResult};

// ============================================================================
// ServiceProvider Trait
// ============================================================================

/// Trait for types that contribute registrations to a container.
pub trait ServiceProvider: Send + Sync {
    /// Returns the name of this service provider.
    ///
    /// Used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Returns the priority of this service provider.
    ///
    /// Lower values are registered first. Default is 100.
    fn priority(&self) -> u32 {
        100
    }

    /// Add types, bindings and extensions to the builder.
    fn register(&self, builder: &mut ContainerBuilder) -> DIResult<()>;

    /// Optional: Check the built container, e.g. that required bindings exist.
    #[allow(unused_variables)]
    fn validate(&self, container: &Container) -> DIResult<()> {
        Ok(())
    }
}

// ============================================================================
// ServiceProviderRegistry
// ============================================================================

/// Registry for managing service providers.
#[derive(Default)]
pub struct ServiceProviderRegistry {
    providers: Vec<Arc<dyn ServiceProvider>>,
}

impl ServiceProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service provider to the registry.
    pub fn add<P: ServiceProvider + 'static>(&mut self, provider: P) -> &mut Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in registration order.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.sorted().iter().map(|p| p.name()).collect()
    }

    /// Run every provider's `register`, lowest priority value first.
    ///
    /// Providers with equal priority keep the order they were added in.
    pub fn register_all(&self, builder: &mut ContainerBuilder) -> DIResult<()> {
        let sorted = self.sorted();
        if sorted.is_empty() {
            return Ok(());
        }

        info!("Registering {} service providers", sorted.len());
        for provider in sorted {
            debug!(
                "Registering provider '{}' (priority: {})",
                provider.name(),
                provider.priority()
            );
            provider.register(builder)?;
        }
        Ok(())
    }

    /// Run every provider's `validate` against the built container.
    pub fn validate_all(&self, container: &Container) -> DIResult<()> {
        for provider in self.sorted() {
            provider.validate(container)?;
        }
        Ok(())
    }

    fn sorted(&self) -> Vec<&Arc<dyn ServiceProvider>> {
        let mut sorted: Vec<_> = self.providers.iter().collect();
        sorted.sort_by_key(|p| p.priority());
        sorted
    }
}
