use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use stylebind::{
    inject, IndexAllocator, InjectOptions, Injected, InjectorFactory, Props, RegistryContext,
    RuleSet, SheetsRegistry, StyleEngine,
};

fn rules(n: usize) -> RuleSet {
    RuleSet::new().rule("item", [("order", n.to_string())])
}

proptest! {
    #[test]
    fn mount_order_never_changes_registry_order(order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle()) {
        let factory = InjectorFactory::new().with_allocator(Arc::new(IndexAllocator::new()));
        let wrappers: Vec<_> = (0..6)
            .map(|n| factory.inject(rules(n), InjectOptions::new()).container())
            .collect();

        let registry = SheetsRegistry::new();
        let ctx = RegistryContext::new(registry.clone(), Arc::new(StyleEngine::new()));
        let mut instances = Vec::new();
        for &n in &order {
            let mut instance = wrappers[n].instantiate(Props::new());
            instance.mount(&ctx).unwrap();
            instances.push(instance);
        }

        let expected: Vec<i64> = wrappers.iter().filter_map(|w| w.index()).collect();
        prop_assert_eq!(registry.indices(), expected);
    }

    #[test]
    fn attached_sheets_track_live_definitions(ops in prop::collection::vec((0..3usize, any::<bool>()), 1..40)) {
        let engine = Arc::new(StyleEngine::new());
        let registry = SheetsRegistry::new();
        let ctx = RegistryContext::new(registry.clone(), Arc::clone(&engine));
        let wrappers: Vec<_> = (0..3).map(|n| inject(rules(n)).container()).collect();
        let mut live: Vec<Vec<Injected>> = (0..3).map(|_| Vec::new()).collect();

        for (n, mount) in ops {
            if mount {
                let mut instance = wrappers[n].instantiate(Props::new());
                instance.mount(&ctx).unwrap();
                live[n].push(instance);
            } else if let Some(mut instance) = live[n].pop() {
                instance.unmount().unwrap();
            }

            let in_use: BTreeSet<usize> = (0..3).filter(|&i| !live[i].is_empty()).collect();
            prop_assert_eq!(engine.surface().len(), in_use.len());
            prop_assert_eq!(registry.len(), in_use.len());
            for i in 0..3 {
                let definition = wrappers[i].definition().unwrap();
                prop_assert_eq!(engine.ref_count(&definition), live[i].len());
            }
        }

        live.clear();
        prop_assert!(engine.surface().is_empty());
        prop_assert!(registry.is_empty());
    }
}
