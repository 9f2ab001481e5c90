//! Auto-discovery of type descriptors using inventory crate
//!
//! Crates describe their injectable types next to the types themselves and
//! submit them with `inventory::submit!`. A catalog collects every submitted
//! description at runtime, so no central list has to be maintained.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use weave_di::{TypeDescriptor, TypeRegistration, Value};
//!
//! inventory::submit! {
//!     TypeRegistration::new("FileLogger", describe_file_logger)
//! }
//!
//! fn describe_file_logger() -> TypeDescriptor {
//!     TypeDescriptor::concrete("FileLogger", |_| Ok(Value::object(FileLogger::default())))
//! }
//!
//! let mut catalog = TypeCatalog::new();
//! catalog.register_discovered();
//! ```

use crate::TypeDescriptor;

/// A type description that can be collected via inventory.
pub struct TypeRegistration {
    /// Type identifier the descriptor is registered under
    pub name: &'static str,

    /// Builds the descriptor; called once per catalog
    pub describe: fn() -> TypeDescriptor,
}

impl TypeRegistration {
    pub const fn new(name: &'static str, describe: fn() -> TypeDescriptor) -> Self {
        Self { name, describe }
    }
}

inventory::collect!(TypeRegistration);

/// Count of submitted type registrations.
pub fn discovered_type_count() -> usize {
    inventory::iter::<TypeRegistration>().count()
}

/// Names of all submitted type registrations.
pub fn list_discovered_types() -> Vec<&'static str> {
    inventory::iter::<TypeRegistration>()
        .map(|r| r.name)
        .collect()
}
