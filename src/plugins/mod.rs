//! Plugin pipeline.
//!
//! Plugins expose up to three hooks:
//!
//! - [`PreSearchPlugin`] may veto a search before any engine is queried.
//! - [`PostSearchPlugin`] may add answers or results once engines returned.
//! - [`OnResultPlugin`] runs per merged result and may rewrite or drop it.
//!
//! Within a stage plugins run in registration order.

mod calculator;
mod hostname;
mod oa_doi_rewrite;
mod query_blocker;
mod self_info;
mod time_zone;
mod tracker_url_remover;
mod unit_converter;

pub use calculator::CalculatorPlugin;
pub(crate) use calculator::format_number;
pub use hostname::{HostnameBlockerPlugin, HostnameReplacerPlugin};
pub use oa_doi_rewrite::OaDoiRewritePlugin;
pub use query_blocker::QueryBlockerPlugin;
pub use self_info::SelfInfoPlugin;
pub use time_zone::TimezonePlugin;
pub use tracker_url_remover::TrackerUrlRemoverPlugin;
pub use unit_converter::UnitConverterPlugin;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::container::ResultContainer;
use crate::{Result, SearchError, SearchQuery, SearchResult};

/// Plugin metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Unique plugin id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Trigger keywords, informational only.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Whether the plugin is enabled when registered.
    pub default_on: bool,
}

impl PluginInfo {
    pub(crate) fn new(id: &str, name: &str, description: &str, default_on: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            keywords: Vec::new(),
            default_on,
        }
    }

    pub(crate) fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }
}

/// What a plugin sees about the running search.
#[derive(Debug, Clone)]
pub struct SearchContext {
    /// The search with resolved defaults.
    pub query: SearchQuery,
}

impl SearchContext {
    /// Creates a context for a query.
    pub fn new(query: SearchQuery) -> Self {
        Self { query }
    }

    /// Returns the query text.
    pub fn text(&self) -> &str {
        &self.query.query
    }
}

/// Base plugin contract. Capabilities are discovered through the `as_*`
/// accessors; a plugin overrides the ones it implements.
pub trait Plugin: Send + Sync {
    /// Returns the plugin metadata.
    fn info(&self) -> &PluginInfo;

    /// Returns the plugin id.
    fn id(&self) -> &str {
        &self.info().id
    }

    fn as_pre_search(&self) -> Option<&dyn PreSearchPlugin> {
        None
    }

    fn as_post_search(&self) -> Option<&dyn PostSearchPlugin> {
        None
    }

    fn as_on_result(&self) -> Option<&dyn OnResultPlugin> {
        None
    }
}

/// Runs before engines are queried.
pub trait PreSearchPlugin: Send + Sync {
    /// Returns false to stop the search.
    fn pre_search(&self, ctx: &SearchContext) -> bool;
}

/// Runs after engines returned, before the container closes.
pub trait PostSearchPlugin: Send + Sync {
    fn post_search(&self, ctx: &SearchContext, container: &ResultContainer);
}

/// Runs once per merged result.
pub trait OnResultPlugin: Send + Sync {
    /// Returns false to remove the result.
    fn on_result(&self, ctx: &SearchContext, result: &mut SearchResult) -> bool;
}

#[derive(Default)]
struct Entries {
    plugins: Vec<Arc<dyn Plugin>>,
    enabled: HashMap<String, bool>,
}

/// Ordered set of plugins with runtime enable flags.
#[derive(Default)]
pub struct PluginPipeline {
    inner: RwLock<Entries>,
}

impl PluginPipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pipeline with every built-in plugin registered.
    pub fn with_defaults() -> Self {
        let pipeline = Self::new();
        let builtins: Vec<Arc<dyn Plugin>> = vec![
            Arc::new(QueryBlockerPlugin::new(Vec::<String>::new())),
            Arc::new(TrackerUrlRemoverPlugin::new()),
            Arc::new(HostnameBlockerPlugin::new(Vec::<String>::new())),
            Arc::new(HostnameReplacerPlugin::new(HashMap::new())),
            Arc::new(OaDoiRewritePlugin::new()),
            Arc::new(SelfInfoPlugin::new()),
            Arc::new(CalculatorPlugin::new()),
            Arc::new(UnitConverterPlugin::new()),
            Arc::new(TimezonePlugin::new()),
        ];
        for plugin in builtins {
            // Ids above are distinct, so registration into a fresh pipeline cannot fail.
            let _ = pipeline.register(plugin);
        }
        pipeline
    }

    /// Appends a plugin. Fails if the id is taken.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Result<()> {
        let info = plugin.info().clone();
        let mut inner = self.inner.write();
        if inner.enabled.contains_key(&info.id) {
            return Err(SearchError::DuplicatePlugin(info.id));
        }
        inner.enabled.insert(info.id.clone(), info.default_on);
        inner.plugins.push(plugin);
        debug!("Registered plugin {}", info.id);
        Ok(())
    }

    /// Replaces a registered plugin in place, keeping its position and flag.
    pub fn replace(&self, plugin: Arc<dyn Plugin>) -> Result<()> {
        let mut inner = self.inner.write();
        let id = plugin.id().to_string();
        let slot = inner
            .plugins
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| SearchError::Config(format!("unknown plugin '{}'", id)))?;
        inner.plugins[slot] = plugin;
        Ok(())
    }

    /// Enables a plugin. Returns false if it is not registered.
    pub fn enable(&self, id: &str) -> bool {
        self.set_enabled(id, true)
    }

    /// Disables a plugin. Returns false if it is not registered.
    pub fn disable(&self, id: &str) -> bool {
        self.set_enabled(id, false)
    }

    fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        match self.inner.write().enabled.get_mut(id) {
            Some(flag) => {
                *flag = enabled;
                true
            }
            None => false,
        }
    }

    /// Returns whether a plugin is globally enabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.inner.read().enabled.get(id).copied().unwrap_or(false)
    }

    /// Lists every plugin with its current flag.
    pub fn list(&self) -> Vec<(PluginInfo, bool)> {
        let inner = self.inner.read();
        inner
            .plugins
            .iter()
            .map(|p| {
                let enabled = inner.enabled.get(p.id()).copied().unwrap_or(false);
                (p.info().clone(), enabled)
            })
            .collect()
    }

    /// Returns the number of registered plugins.
    pub fn len(&self) -> usize {
        self.inner.read().plugins.len()
    }

    /// Returns true if no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plugins active for one request: globally enabled or forced on, and
    /// not forced off.
    fn active(&self, query: &SearchQuery) -> Vec<Arc<dyn Plugin>> {
        let inner = self.inner.read();
        inner
            .plugins
            .iter()
            .filter(|p| {
                let id = p.id();
                if query.disabled_plugins.iter().any(|d| d == id) {
                    return false;
                }
                query.enabled_plugins.iter().any(|e| e == id)
                    || inner.enabled.get(id).copied().unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Runs pre-search hooks. Returns false as soon as one vetoes.
    pub fn pre_search(&self, ctx: &SearchContext) -> bool {
        for plugin in self.active(&ctx.query) {
            if let Some(hook) = plugin.as_pre_search() {
                if !hook.pre_search(ctx) {
                    info!("Search for {:?} stopped by plugin {}", ctx.text(), plugin.id());
                    return false;
                }
            }
        }
        true
    }

    /// Runs post-search hooks.
    pub fn post_search(&self, ctx: &SearchContext, container: &ResultContainer) {
        for plugin in self.active(&ctx.query) {
            if let Some(hook) = plugin.as_post_search() {
                hook.post_search(ctx, container);
            }
        }
    }

    /// Runs per-result hooks and drops vetoed results, keeping order.
    pub fn on_results(&self, ctx: &SearchContext, results: Vec<SearchResult>) -> Vec<SearchResult> {
        let hooks: Vec<_> = self
            .active(&ctx.query)
            .into_iter()
            .filter(|p| p.as_on_result().is_some())
            .collect();
        if hooks.is_empty() {
            return results;
        }

        results
            .into_iter()
            .filter_map(|mut result| {
                for plugin in &hooks {
                    if let Some(hook) = plugin.as_on_result() {
                        if !hook.on_result(ctx, &mut result) {
                            debug!("Result {} removed by plugin {}", result.url, plugin.id());
                            return None;
                        }
                    }
                }
                Some(result)
            })
            .collect()
    }
}

impl std::fmt::Debug for PluginPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.list().into_iter().map(|(info, _)| info.id).collect();
        f.debug_struct("PluginPipeline").field("plugins", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::Answer;

    struct Veto {
        info: PluginInfo,
        calls: AtomicUsize,
    }

    impl Veto {
        fn new(id: &str, default_on: bool) -> Self {
            Self {
                info: PluginInfo::new(id, id, "test veto", default_on),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Plugin for Veto {
        fn info(&self) -> &PluginInfo {
            &self.info
        }
        fn as_pre_search(&self) -> Option<&dyn PreSearchPlugin> {
            Some(self)
        }
    }

    impl PreSearchPlugin for Veto {
        fn pre_search(&self, _ctx: &SearchContext) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    struct DropHost {
        info: PluginInfo,
        host: &'static str,
    }

    impl Plugin for DropHost {
        fn info(&self) -> &PluginInfo {
            &self.info
        }
        fn as_on_result(&self) -> Option<&dyn OnResultPlugin> {
            Some(self)
        }
    }

    impl OnResultPlugin for DropHost {
        fn on_result(&self, _ctx: &SearchContext, result: &mut SearchResult) -> bool {
            !result.url.contains(self.host)
        }
    }

    struct Greeter {
        info: PluginInfo,
    }

    impl Plugin for Greeter {
        fn info(&self) -> &PluginInfo {
            &self.info
        }
        fn as_post_search(&self) -> Option<&dyn PostSearchPlugin> {
            Some(self)
        }
    }

    impl PostSearchPlugin for Greeter {
        fn post_search(&self, ctx: &SearchContext, container: &ResultContainer) {
            container.add_answers([Answer::new(format!("hello {}", ctx.text()))]);
        }
    }

    fn ctx(query: SearchQuery) -> SearchContext {
        SearchContext::new(query)
    }

    #[test]
    fn test_register_duplicate_id_fails() {
        let pipeline = PluginPipeline::new();
        pipeline.register(Arc::new(Veto::new("veto", true))).unwrap();
        let err = pipeline.register(Arc::new(Veto::new("veto", false))).unwrap_err();
        assert!(matches!(err, SearchError::DuplicatePlugin(ref id) if id == "veto"));
        assert_eq!(pipeline.len(), 1);
        assert!(pipeline.is_enabled("veto"));
    }

    #[test]
    fn test_with_defaults_flags() {
        let pipeline = PluginPipeline::with_defaults();
        assert_eq!(pipeline.len(), 9);
        assert!(pipeline.is_enabled("tracker_url_remover"));
        assert!(!pipeline.is_enabled("time_zone"));
        assert!(!pipeline.is_enabled("calculator"));
        assert!(!pipeline.is_enabled("hostname_blocker"));
        assert!(!pipeline.is_enabled("missing"));
    }

    #[test]
    fn test_pre_search_veto_short_circuits() {
        let pipeline = PluginPipeline::new();
        let first = Arc::new(Veto::new("first", true));
        let second = Arc::new(Veto::new("second", true));
        pipeline.register(first.clone()).unwrap();
        pipeline.register(second.clone()).unwrap();

        assert!(!pipeline.pre_search(&ctx(SearchQuery::new("q"))));
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disabled_plugin_is_skipped() {
        let pipeline = PluginPipeline::new();
        pipeline.register(Arc::new(Veto::new("veto", true))).unwrap();
        assert!(pipeline.disable("veto"));
        assert!(pipeline.pre_search(&ctx(SearchQuery::new("q"))));
        assert!(pipeline.enable("veto"));
        assert!(!pipeline.pre_search(&ctx(SearchQuery::new("q"))));
        assert!(!pipeline.enable("unknown"));
    }

    #[test]
    fn test_request_overrides() {
        let pipeline = PluginPipeline::new();
        pipeline.register(Arc::new(Veto::new("veto", false))).unwrap();

        assert!(pipeline.pre_search(&ctx(SearchQuery::new("q"))));
        assert!(!pipeline.pre_search(&ctx(SearchQuery::new("q").enable_plugin("veto"))));

        pipeline.enable("veto");
        assert!(pipeline.pre_search(&ctx(SearchQuery::new("q").disable_plugin("veto"))));
        // Overrides never touch the global flag.
        assert!(pipeline.is_enabled("veto"));
    }

    #[test]
    fn test_on_results_removes_vetoed() {
        let pipeline = PluginPipeline::new();
        pipeline
            .register(Arc::new(DropHost {
                info: PluginInfo::new("drop", "drop", "", true),
                host: "spam.com",
            }))
            .unwrap();

        let results = vec![
            SearchResult::new("https://a.com", "a", ""),
            SearchResult::new("https://spam.com/x", "spam", ""),
            SearchResult::new("https://b.com", "b", ""),
        ];
        let kept = pipeline.on_results(&ctx(SearchQuery::new("q")), results);
        let urls: Vec<_> = kept.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com", "https://b.com"]);
    }

    #[test]
    fn test_post_search_adds_answers() {
        let pipeline = PluginPipeline::new();
        pipeline
            .register(Arc::new(Greeter {
                info: PluginInfo::new("greeter", "greeter", "", true),
            }))
            .unwrap();
        let container = ResultContainer::new();
        pipeline.post_search(&ctx(SearchQuery::new("world")), &container);
        assert_eq!(container.answers()[0].answer, "hello world");
    }

    #[test]
    fn test_replace_keeps_position() {
        let pipeline = PluginPipeline::with_defaults();
        pipeline
            .replace(Arc::new(HostnameBlockerPlugin::new(vec!["spam.com"])))
            .unwrap();
        let ids: Vec<_> = pipeline.list().into_iter().map(|(i, _)| i.id).collect();
        assert_eq!(ids[2], "hostname_blocker");
        assert!(pipeline.replace(Arc::new(Veto::new("nope", true))).is_err());
    }
}
