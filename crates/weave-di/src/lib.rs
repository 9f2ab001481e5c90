//! Constructor-injection container
//!
//! `weave-di` builds object graphs from declared constructor parameters and
//! manages named services with explicit lifecycle rules. Types are described
//! once with a [`TypeDescriptor`]; the container resolves their parameters
//! recursively, following bindings from abstract identifiers to concrete
//! types, producers or instances.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use weave_di::{ContainerBuilder, Parameter, TypeDescriptor, Value};
//!
//! struct FileLogger;
//! struct UserService {
//!     logger: Arc<FileLogger>,
//! }
//!
//! let container = ContainerBuilder::new()
//!     .register_type(TypeDescriptor::concrete("FileLogger", |_| Ok(Value::object(FileLogger))))?
//!     .register_type(
//!         TypeDescriptor::concrete("UserService", |args| {
//!             Ok(Value::object(UserService { logger: args.object::<FileLogger>(0)? }))
//!         })
//!         .param(Parameter::new("logger", "LoggerInterface")),
//!     )?
//!     .bind("LoggerInterface", "FileLogger")?
//!     .build()?;
//!
//! let service = container.get_as::<UserService>("UserService")?;
//! # let _ = &service.logger;
//! # Ok::<(), weave_di::DIError>(())
//! ```
//!
//! ## Named services
//!
//! Values stored with [`Container::set`] are frozen on their first read.
//! Closures are invoked once and their result cached, unless marked with
//! [`Container::factory`] (invoked on every read) or [`Container::protect`]
//! (returned as-is). [`Container::extend`] decorates a service, or queues the
//! decoration until the service is set.

pub mod alias;
pub mod binding;
pub mod builder;
pub mod cache;
pub mod config;
pub mod container;
pub mod descriptor;
pub mod error;
pub mod extension;
pub mod fuzzy;
pub mod instances;
pub mod provider;
pub mod registration;
pub mod resolver;
pub mod stats;
pub mod value;

pub use inventory;

pub use alias::{AliasCachePolicy, AliasRegistry};
pub use binding::{BindingRegistry, Concrete, ContextualBindingBuilder, ContextualNeeds};
pub use builder::ContainerBuilder;
pub use cache::DependencyCache;
pub use config::ContainerConfig;
pub use container::{Container, Extended};
pub use descriptor::{
    Injectable, Parameter, ServiceLifetime, TypeCatalog, TypeDescriptor, TypeKind, TypeProvider,
};
pub use error::{DIError, DIResult};
pub use extension::ExtensionManager;
pub use fuzzy::{FuzzyMatcher, SuggestionConfig};
pub use instances::InstanceRegistry;
pub use provider::{ServiceProvider, ServiceProviderRegistry};
pub use registration::{discovered_type_count, list_discovered_types, TypeRegistration};
pub use resolver::{DependencyResolver, ResolutionStack, StackFrame, Target};
pub use stats::ContainerStats;
pub use value::{Args, Closure, ClosureId, Extension, Instance, Producer, Value};

/// Convenience macro for reading a typed service
#[macro_export]
macro_rules! get_service {
    ($container:expr, $service_type:ty, $id:expr) => {
        $container.get_as::<$service_type>($id)
    };
}

/// Convenience macro for submitting a type for discovery
///
/// ```rust,ignore
/// weave_di::discoverable!("Clock", describe_clock);
///
/// fn describe_clock() -> TypeDescriptor {
///     TypeDescriptor::concrete("Clock", |_| Ok(Value::object(Clock)))
/// }
/// ```
#[macro_export]
macro_rules! discoverable {
    ($name:expr, $describe:expr) => {
        $crate::inventory::submit! {
            $crate::TypeRegistration::new($name, $describe)
        }
    };
}
