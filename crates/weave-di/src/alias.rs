//! Service name aliases

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How cached alias resolutions react to a new alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasCachePolicy {
    /// Drop every cached resolution.
    #[default]
    ClearOnAdd,
    /// Drop only the cached resolution of the alias being added.
    EvictAlias,
}

/// One-hop alias table with memoized lookups.
#[derive(Debug, Default)]
pub struct AliasRegistry {
    aliases: HashMap<String, String>,
    resolved: HashMap<String, String>,
    policy: AliasCachePolicy,
}

impl AliasRegistry {
    pub fn new(policy: AliasCachePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn add(&mut self, alias: impl Into<String>, id: impl Into<String>) {
        let alias = alias.into();
        match self.policy {
            AliasCachePolicy::ClearOnAdd => self.resolved.clear(),
            AliasCachePolicy::EvictAlias => {
                self.resolved.remove(&alias);
            }
        }
        self.aliases.insert(alias, id.into());
    }

    /// The alias target of `id`, or `id` itself. Targets are not followed further.
    pub fn resolve(&mut self, id: &str) -> String {
        if let Some(resolved) = self.resolved.get(id) {
            return resolved.clone();
        }

        let resolved = self.aliases.get(id).cloned().unwrap_or_else(|| id.to_string());
        self.resolved.insert(id.to_string(), resolved.clone());
        resolved
    }

    pub fn has(&self, alias: &str) -> bool {
        self.aliases.contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub(crate) fn cached(&self) -> usize {
        self.resolved.len()
    }
}
