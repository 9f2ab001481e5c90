//! Property-based tests for container state rules and graph resolution

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;
use weave_di::*;

fn append(item: i64) -> Extension {
    Extension::new(move |value, _| {
        let mut list = value.as_data().cloned().unwrap_or_else(|| json!([]));
        if let Some(items) = list.as_array_mut() {
            items.push(json!(item));
        }
        Ok(Some(Value::data(list)))
    })
}

/// Generate service ids
fn arb_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.]{0,12}"
}

/// Types `Node0 -> Node1 -> ... -> Node{len-1}`, closing the loop when `cyclic`
fn chain_catalog(len: usize, cyclic: bool) -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    for i in 0..len {
        let mut descriptor = TypeDescriptor::concrete(format!("Node{}", i), move |args| {
            let depth = match args.len() {
                0 => 0,
                _ => args.data(0)?.as_i64().unwrap_or_default() + 1,
            };
            Ok(Value::data(depth))
        });
        if i + 1 < len {
            descriptor = descriptor.param(Parameter::new("next", format!("Node{}", i + 1)));
        } else if cyclic {
            descriptor = descriptor.param(Parameter::new("next", "Node0"));
        }
        catalog.register(descriptor).unwrap();
    }
    catalog
}

proptest! {
    #[test]
    fn test_extensions_apply_in_order(
        start in prop::collection::vec(any::<i64>(), 0..5),
        items in prop::collection::vec(any::<i64>(), 0..8),
        before_set in any::<bool>(),
    ) {
        let container = Container::new();
        if before_set {
            for item in &items {
                container.extend("list", append(*item)).unwrap();
            }
            container.set("list", Value::data(json!(start))).unwrap();
        } else {
            container.set("list", Value::data(json!(start))).unwrap();
            for item in &items {
                container.extend("list", append(*item)).unwrap();
            }
        }

        let mut expected = start.clone();
        expected.extend(items.iter().copied());
        let value = container.get("list").unwrap();
        prop_assert_eq!(value.as_data(), Some(&json!(expected)));
    }
}

proptest! {
    #[test]
    fn test_any_read_freezes(id in arb_id(), value in any::<i64>()) {
        let container = Container::new();
        container.set(&id, Value::data(value)).unwrap();
        container.get(&id).unwrap();

        let set_again = container.set(&id, Value::data(value));
        let matched = matches!(set_again, Err(DIError::FrozenInstanceOverride { .. }));
        prop_assert!(matched);
        let extend = container.extend(&id, append(1));
        let matched = matches!(extend, Err(DIError::FrozenInstanceExtend { .. }));
        prop_assert!(matched);
    }
}

proptest! {
    #[test]
    fn test_plain_closures_run_once_and_factories_every_read(reads in 1usize..10) {
        let container = Container::new();
        let plain_calls = Arc::new(AtomicUsize::new(0));
        let factory_calls = Arc::new(AtomicUsize::new(0));

        let counter = plain_calls.clone();
        container.set("plain", Value::closure(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::object(0u8))
        })).unwrap();

        let counter = factory_calls.clone();
        let factory = container.factory(Closure::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::object(0u8))
        }));
        container.set("factory", factory).unwrap();

        let first_plain = container.get("plain").unwrap();
        let first_factory = container.get("factory").unwrap();
        for _ in 1..reads {
            prop_assert!(container.get("plain").unwrap().ptr_eq(&first_plain));
            prop_assert!(!container.get("factory").unwrap().ptr_eq(&first_factory));
        }

        prop_assert_eq!(plain_calls.load(Ordering::SeqCst), 1);
        prop_assert_eq!(factory_calls.load(Ordering::SeqCst), reads);
    }
}

proptest! {
    #[test]
    fn test_alias_resolution_matches_last_target(
        pairs in prop::collection::vec((arb_id(), arb_id()), 0..10),
        probe in arb_id(),
        evict in any::<bool>(),
    ) {
        let policy = if evict { AliasCachePolicy::EvictAlias } else { AliasCachePolicy::ClearOnAdd };
        let mut registry = AliasRegistry::new(policy);
        let mut model = HashMap::new();

        for (alias, target) in &pairs {
            // Interleave lookups so the cache is exercised between adds
            registry.resolve(alias);
            registry.add(alias.clone(), target.clone());
            model.insert(alias.clone(), target.clone());
        }

        for (alias, _) in &pairs {
            prop_assert_eq!(&registry.resolve(alias), &model[alias]);
        }
        let expected = model.get(&probe).cloned().unwrap_or_else(|| probe.clone());
        prop_assert_eq!(registry.resolve(&probe), expected);
    }
}

proptest! {
    #[test]
    fn test_alias_has_matches_target(alias in arb_id(), target in arb_id()) {
        prop_assume!(alias != target);
        let container = Container::new();
        container.alias(alias.clone(), target.clone());
        prop_assert_eq!(container.has(&alias), container.has(&target));

        container.set(&target, Value::data(1)).unwrap();
        prop_assert!(container.has(&alias));
        prop_assert_eq!(container.has(&alias), container.has(&target));
    }
}

proptest! {
    #[test]
    fn test_acyclic_chains_resolve(len in 1usize..12) {
        let value = Container::create(chain_catalog(len, false), "Node0").unwrap();
        prop_assert_eq!(value.as_data(), Some(&json!(len as i64 - 1)));
    }
}

proptest! {
    #[test]
    fn test_cycles_report_exact_chain(len in 2usize..6, start in 0usize..6) {
        let start = start % len;
        let container = Container::with_types(Arc::new(chain_catalog(len, true)));
        let err = container.get(&format!("Node{}", start)).unwrap_err();

        let expected: Vec<String> = (0..=len).map(|i| format!("Node{}", (start + i) % len)).collect();
        let matched = matches!(err, DIError::CircularDependency { .. });
        prop_assert!(matched);
        prop_assert_eq!(err.chain(), expected.as_slice());
    }
}

proptest! {
    #[test]
    fn test_suggestions_respect_limits(
        target in "[A-Za-z]{3,12}",
        candidates in prop::collection::vec("[A-Za-z]{3,12}", 0..20),
    ) {
        let matcher = FuzzyMatcher::default();
        let suggestions = matcher.find_similar(&target, &candidates);

        prop_assert!(suggestions.len() <= 3);
        for suggestion in &suggestions {
            prop_assert!(candidates.contains(suggestion));
            prop_assert!(strsim::normalized_levenshtein(&target, suggestion) >= 0.6);
        }
        if candidates.contains(&target) {
            prop_assert_eq!(suggestions.first(), Some(&target));
        }
    }
}
