//! Engine registry indexed by name, shortcut and category.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::{AnyEngine, EngineCategory, Result, SearchError};

#[derive(Default)]
struct Indexes {
    /// Registration order, used for stable listing.
    order: Vec<String>,
    by_name: HashMap<String, AnyEngine>,
    by_shortcut: HashMap<String, String>,
    by_category: HashMap<EngineCategory, Vec<String>>,
}

/// Holds every registered engine.
///
/// Reads take a shared lock and never block each other; registration takes
/// the exclusive lock and validates before touching any index, so a failed
/// registration leaves no trace.
#[derive(Default)]
pub struct EngineRegistry {
    inner: RwLock<Indexes>,
}

impl EngineRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an engine under its name, shortcut and categories.
    pub fn register(&self, engine: AnyEngine) -> Result<()> {
        let name = engine.name().to_string();
        let shortcut = engine.shortcut().to_string();
        let categories = engine.config().categories.clone();

        let mut inner = self.inner.write();
        if inner.by_name.contains_key(&name) {
            return Err(SearchError::DuplicateEngine(name));
        }
        if !shortcut.is_empty() {
            if let Some(owner) = inner.by_shortcut.get(&shortcut) {
                return Err(SearchError::DuplicateShortcut {
                    shortcut,
                    engine: owner.clone(),
                });
            }
            inner.by_shortcut.insert(shortcut, name.clone());
        }
        for category in categories {
            let names = inner.by_category.entry(category).or_default();
            if !names.contains(&name) {
                names.push(name.clone());
            }
        }
        inner.order.push(name.clone());
        inner.by_name.insert(name.clone(), engine);
        debug!("Registered engine {}", name);
        Ok(())
    }

    /// Removes an engine from every index. Returns the engine if it existed.
    pub fn unregister(&self, name: &str) -> Option<AnyEngine> {
        let mut inner = self.inner.write();
        let engine = inner.by_name.remove(name)?;
        inner.order.retain(|n| n != name);
        inner.by_shortcut.retain(|_, owner| owner != name);
        inner.by_category.retain(|_, names| {
            names.retain(|n| n != name);
            !names.is_empty()
        });
        debug!("Unregistered engine {}", name);
        Some(engine)
    }

    /// Looks up an engine by name.
    pub fn get(&self, name: &str) -> Option<AnyEngine> {
        self.inner.read().by_name.get(name).cloned()
    }

    /// Looks up an engine by shortcut.
    pub fn get_by_shortcut(&self, shortcut: &str) -> Option<AnyEngine> {
        let inner = self.inner.read();
        inner
            .by_shortcut
            .get(shortcut)
            .and_then(|name| inner.by_name.get(name))
            .cloned()
    }

    /// Returns every engine declaring a category, in registration order.
    pub fn get_by_category(&self, category: EngineCategory) -> Vec<AnyEngine> {
        let inner = self.inner.read();
        inner
            .by_category
            .get(&category)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| inner.by_name.get(name).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns every engine in registration order.
    pub fn all(&self) -> Vec<AnyEngine> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|name| inner.by_name.get(name).cloned())
            .collect()
    }

    /// Returns the names of every registered engine in registration order.
    pub fn names(&self) -> Vec<String> {
        self.inner.read().order.clone()
    }

    /// Returns the number of registered engines.
    pub fn len(&self) -> usize {
        self.inner.read().by_name.len()
    }

    /// Returns true if no engine is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engine, EngineConfig, EngineResults, OfflineEngine, RequestParams};
    use async_trait::async_trait;

    struct NullEngine {
        config: EngineConfig,
    }

    impl NullEngine {
        fn new(name: &str, shortcut: &str, categories: Vec<EngineCategory>) -> AnyEngine {
            let mut config = EngineConfig::new(name, shortcut);
            config.categories = categories;
            AnyEngine::offline(Self { config })
        }
    }

    impl Engine for NullEngine {
        fn config(&self) -> &EngineConfig {
            &self.config
        }
    }

    #[async_trait]
    impl OfflineEngine for NullEngine {
        async fn search(&self, _query: &str, _params: &RequestParams) -> Result<EngineResults> {
            Ok(EngineResults::new())
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = EngineRegistry::new();
        registry
            .register(NullEngine::new("alpha", "a", vec![EngineCategory::General]))
            .unwrap();
        registry
            .register(NullEngine::new(
                "beta",
                "",
                vec![EngineCategory::General, EngineCategory::Science],
            ))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("alpha").map(|e| e.name().to_string()), Some("alpha".into()));
        assert_eq!(
            registry.get_by_shortcut("a").map(|e| e.name().to_string()),
            Some("alpha".into())
        );
        assert!(registry.get_by_shortcut("").is_none());
        assert_eq!(registry.get_by_category(EngineCategory::General).len(), 2);
        assert_eq!(registry.get_by_category(EngineCategory::Science).len(), 1);
        assert!(registry.get_by_category(EngineCategory::Images).is_empty());
        assert_eq!(registry.names(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_register_duplicate_name_leaves_state_unchanged() {
        let registry = EngineRegistry::new();
        registry
            .register(NullEngine::new("alpha", "a", vec![EngineCategory::General]))
            .unwrap();

        let err = registry
            .register(NullEngine::new("alpha", "other", vec![EngineCategory::Images]))
            .unwrap_err();
        assert!(matches!(err, SearchError::DuplicateEngine(ref n) if n == "alpha"));
        assert!(registry.get_by_shortcut("other").is_none());
        assert!(registry.get_by_category(EngineCategory::Images).is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_duplicate_shortcut_leaves_state_unchanged() {
        let registry = EngineRegistry::new();
        registry
            .register(NullEngine::new("alpha", "x", vec![EngineCategory::General]))
            .unwrap();

        let err = registry
            .register(NullEngine::new("beta", "x", vec![EngineCategory::News]))
            .unwrap_err();
        match err {
            SearchError::DuplicateShortcut { shortcut, engine } => {
                assert_eq!(shortcut, "x");
                assert_eq!(engine, "alpha");
            }
            other => panic!("Unexpected error: {}", other),
        }
        assert!(registry.get("beta").is_none());
        assert!(registry.get_by_category(EngineCategory::News).is_empty());
        assert_eq!(registry.names(), vec!["alpha"]);
    }

    #[test]
    fn test_empty_shortcuts_do_not_conflict() {
        let registry = EngineRegistry::new();
        registry
            .register(NullEngine::new("alpha", "", vec![EngineCategory::General]))
            .unwrap();
        registry
            .register(NullEngine::new("beta", "", vec![EngineCategory::General]))
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unregister_removes_from_all_indexes() {
        let registry = EngineRegistry::new();
        registry
            .register(NullEngine::new("alpha", "a", vec![EngineCategory::General]))
            .unwrap();

        assert!(registry.unregister("alpha").is_some());
        assert!(registry.get("alpha").is_none());
        assert!(registry.get_by_shortcut("a").is_none());
        assert!(registry.get_by_category(EngineCategory::General).is_empty());
        assert!(registry.is_empty());
        assert!(registry.unregister("alpha").is_none());

        // Name and shortcut are free again.
        registry
            .register(NullEngine::new("alpha", "a", vec![EngineCategory::General]))
            .unwrap();
    }

    #[test]
    fn test_concurrent_reads_and_writes() {
        let registry = std::sync::Arc::new(EngineRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry
                        .register(NullEngine::new(
                            &format!("engine{}", i),
                            &format!("e{}", i),
                            vec![EngineCategory::General],
                        ))
                        .unwrap();
                    registry.get_by_category(EngineCategory::General).len()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap() >= 1);
        }
        assert_eq!(registry.len(), 8);
    }
}
