//! Container introspection counters

use serde::{Deserialize, Serialize};

/// A snapshot of what a container holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStats {
    pub registered_services: usize,
    pub frozen_services: usize,
    /// Registered services whose stored value is a factory closure
    pub factory_services: usize,
    pub bindings: usize,
    pub contextual_bindings: usize,
    pub aliases: usize,
    /// Argument lists held by the dependency cache
    pub cached_dependencies: usize,
    pub pending_extensions: usize,
    pub singletons: usize,
}

impl ContainerStats {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_field_names() {
        let stats = ContainerStats {
            registered_services: 2,
            frozen_services: 1,
            ..ContainerStats::default()
        };
        let json = stats.to_json();
        assert_eq!(json["registered_services"], 2);
        assert_eq!(json["frozen_services"], 1);
        assert_eq!(json["cached_dependencies"], 0);
    }
}
