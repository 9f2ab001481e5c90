//! Builder pattern for configuring the container

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::{
    BindingRegistry, Concrete, Container, ContainerConfig, DIResult, Extension, FuzzyMatcher,
    ServiceProvider, ServiceProviderRegistry, TypeCatalog, TypeDescriptor,
};

/// Collects types, bindings, providers and configuration for a [`Container`].
///
/// Bindings are fixed once the container is built; contextual bindings can
/// still be added later through [`Container::when`].
#[derive(Default)]
pub struct ContainerBuilder {
    catalog: TypeCatalog,
    bindings: BindingRegistry,
    pending: HashMap<String, Vec<Extension>>,
    providers: ServiceProviderRegistry,
    config: ContainerConfig,
}

impl ContainerBuilder {
    /// Create a new container builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a type
    pub fn register_type(mut self, descriptor: TypeDescriptor) -> DIResult<Self> {
        self.add_type(descriptor)?;
        Ok(self)
    }

    /// Register every type submitted through `inventory`
    pub fn register_discovered_types(mut self) -> Self {
        self.catalog.register_discovered();
        self
    }

    /// Bind an abstract identifier to a type name, producer or instance
    pub fn bind(mut self, abstract_id: impl Into<String>, concrete: impl Into<Concrete>) -> DIResult<Self> {
        self.add_binding(abstract_id, concrete)?;
        Ok(self)
    }

    /// Queue an extension for a service that will be set later
    pub fn extend(mut self, id: impl Into<String>, extension: Extension) -> Self {
        self.add_extension(id, extension);
        self
    }

    pub fn provider<P: ServiceProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.add(provider);
        self
    }

    pub fn add_type(&mut self, descriptor: TypeDescriptor) -> DIResult<&mut Self> {
        self.catalog.register(descriptor)?;
        Ok(self)
    }

    pub fn add_binding(
        &mut self,
        abstract_id: impl Into<String>,
        concrete: impl Into<Concrete>,
    ) -> DIResult<&mut Self> {
        self.bindings.bind(abstract_id, concrete)?;
        Ok(self)
    }

    pub fn add_extension(&mut self, id: impl Into<String>, extension: Extension) -> &mut Self {
        self.pending.entry(id.into()).or_default().push(extension);
        self
    }

    /// Build the container
    ///
    /// Providers register first, then configured bindings and aliases are
    /// applied. Providers validate the finished container before the
    /// configured warm-up runs.
    pub fn build(mut self) -> DIResult<Container> {
        let providers = std::mem::take(&mut self.providers);
        providers.register_all(&mut self)?;

        let config = std::mem::take(&mut self.config);
        config.validate()?;
        for (abstract_id, concrete) in &config.bindings {
            self.bindings.bind(abstract_id.clone(), concrete.clone())?;
        }

        let type_count = self.catalog.len();
        let container = Container::from_parts(
            Arc::new(self.catalog),
            self.bindings,
            self.pending,
            config.alias_cache,
            FuzzyMatcher::new(config.suggestions),
        );
        for (alias, id) in config.aliases {
            container.alias(alias, id);
        }

        providers.validate_all(&container)?;
        if !config.warm_up.is_empty() {
            container.warm_up(&config.warm_up)?;
        }

        info!(
            "Built container with {} types and {} bindings",
            type_count,
            container.bindings().len()
        );
        Ok(container)
    }
}
