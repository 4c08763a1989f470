//! Class name generation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::style::RuleSet;

use super::EngineId;

/// Generates `{prefix}{rule}-{engine}-{counter}` class names.
///
/// The counter is shared by every sheet of one engine, so names never
/// collide within an engine.
#[derive(Debug)]
pub(crate) struct ClassNameGenerator {
    prefix: String,
    engine_id: EngineId,
    counter: AtomicU64,
}

impl ClassNameGenerator {
    pub(crate) fn new(prefix: impl Into<String>, engine_id: EngineId) -> Self {
        Self {
            prefix: prefix.into(),
            engine_id,
            counter: AtomicU64::new(0),
        }
    }

    pub(crate) fn engine_id(&self) -> EngineId {
        self.engine_id
    }

    pub(crate) fn generate(&self, rule: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}{}-{}-{}", self.prefix, rule, self.engine_id.get(), n)
    }

    /// Maps every rule to a class name, reusing names from `previous`.
    pub(crate) fn assign(
        &self,
        rules: &RuleSet,
        previous: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        rules
            .names()
            .map(|name| {
                let class = previous
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| self.generate(name));
                (name.to_string(), class)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        let naming = ClassNameGenerator::new("", EngineId::new(3));
        assert_eq!(naming.generate("button"), "button-3-0");
        assert_eq!(naming.generate("button"), "button-3-1");
    }

    #[test]
    fn test_generate_uses_prefix() {
        let naming = ClassNameGenerator::new("app-", EngineId::new(0));
        assert_eq!(naming.generate("title"), "app-title-0-0");
    }

    #[test]
    fn test_assign_reuses_previous_names() {
        let naming = ClassNameGenerator::new("", EngineId::new(1));
        let first = naming.assign(&RuleSet::new().rule("a", [("color", "red")]), &BTreeMap::new());
        let second = naming.assign(
            &RuleSet::new()
                .rule("a", [("color", "blue")])
                .rule("b", [("color", "green")]),
            &first,
        );
        assert_eq!(second["a"], first["a"]);
        assert_eq!(second["b"], "b-1-1");
    }

    #[test]
    fn test_assign_drops_vanished_rules() {
        let naming = ClassNameGenerator::new("", EngineId::new(1));
        let first = naming.assign(
            &RuleSet::new().rule("a", [("x", "1")]).rule("b", [("x", "2")]),
            &BTreeMap::new(),
        );
        let second = naming.assign(&RuleSet::new().rule("a", [("x", "3")]), &first);
        assert_eq!(second.len(), 1);
        assert!(second.contains_key("a"));
    }
}
