//! Search orchestration.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::answerers::AnswererRegistry;
use crate::container::ResultContainer;
use crate::parser::{ParsedQuery, QueryParser};
use crate::plugins::{PluginPipeline, SearchContext};
use crate::processor::{Processor, SuspendedStatus};
use crate::registry::EngineRegistry;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::{
    AnyEngine, Config, EngineCategory, Result, SearchError, SearchQuery, SearchResponse,
};

/// Slack given to the shared scope so an engine's own request timeout, which
/// suspends the engine, always fires before the scope gives up on it.
const DEADLINE_GRACE: Duration = Duration::from_millis(250);

/// Meta search engine that orchestrates searches across multiple engines.
///
/// Owns the engine registry, one [`Processor`] per engine, the plugin
/// pipeline and the answerers. Every search runs its engines concurrently
/// under one shared deadline.
pub struct MetaSearch {
    config: Config,
    registry: EngineRegistry,
    processors: RwLock<HashMap<String, Arc<Processor>>>,
    transport: Arc<dyn HttpTransport>,
    plugins: PluginPipeline,
    answerers: AnswererRegistry,
}

/// One engine picked for a request, with the category it serves.
struct Dispatch {
    processor: Arc<Processor>,
    category: EngineCategory,
}

impl MetaSearch {
    /// Creates a search instance with default configuration, built-in plugins
    /// and answerers, and no engines.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            registry: EngineRegistry::new(),
            processors: RwLock::new(HashMap::new()),
            transport: Arc::new(ReqwestTransport::new()),
            plugins: PluginPipeline::with_defaults(),
            answerers: AnswererRegistry::with_defaults(),
        }
    }

    /// Creates a search instance with a validated configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Replaces the HTTP transport used by online engines.
    ///
    /// Processors of already registered engines are rebuilt, which also
    /// clears their suspension state.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        let rebuilt = self
            .registry
            .all()
            .into_iter()
            .map(|engine| {
                let name = engine.name().to_string();
                (name, Arc::new(self.make_processor(engine)))
            })
            .collect();
        *self.processors.write() = rebuilt;
        self
    }

    /// Replaces the plugin pipeline.
    pub fn with_plugins(mut self, plugins: PluginPipeline) -> Self {
        self.plugins = plugins;
        self
    }

    /// Replaces the answerers.
    pub fn with_answerers(mut self, answerers: AnswererRegistry) -> Self {
        self.answerers = answerers;
        self
    }

    fn make_processor(&self, engine: AnyEngine) -> Processor {
        Processor::new(
            engine,
            Arc::clone(&self.transport),
            self.config.suspend_cooldown(),
        )
    }

    /// Registers an engine. Fails on a duplicate name or shortcut.
    pub fn register_engine(&self, engine: AnyEngine) -> Result<()> {
        self.registry.register(engine.clone())?;
        let name = engine.name().to_string();
        let processor = Arc::new(self.make_processor(engine));
        self.processors.write().insert(name, processor);
        Ok(())
    }

    /// Removes an engine and its processor.
    pub fn unregister_engine(&self, name: &str) -> Option<AnyEngine> {
        self.processors.write().remove(name);
        self.registry.unregister(name)
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the engine registry.
    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// Returns the plugin pipeline.
    pub fn plugins(&self) -> &PluginPipeline {
        &self.plugins
    }

    /// Returns the answerers.
    pub fn answerers(&self) -> &AnswererRegistry {
        &self.answerers
    }

    /// Returns the number of registered engines.
    pub fn engine_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns every registered engine in registration order.
    pub fn engines(&self) -> Vec<AnyEngine> {
        self.registry.all()
    }

    /// Returns the circuit-breaker state of an engine.
    pub fn engine_status(&self, name: &str) -> Option<SuspendedStatus> {
        self.processors.read().get(name).map(|p| p.status())
    }

    /// Parses bangs and locale tags against the registered engines.
    pub fn parse_query(&self, text: &str) -> ParsedQuery {
        QueryParser::new(&self.registry).parse(text)
    }

    /// Performs a search across the selected engines.
    pub async fn search(&self, query: SearchQuery) -> Result<SearchResponse> {
        self.search_with_cancel(query, CancellationToken::new()).await
    }

    /// Performs a search that stops early when `cancel` fires.
    ///
    /// Cancelling before the search starts returns [`SearchError::Cancelled`].
    /// Cancelling while engines run yields a partial response built from the
    /// engines that already finished; the others are reported unresponsive.
    pub async fn search_with_cancel(
        &self,
        query: SearchQuery,
        cancel: CancellationToken,
    ) -> Result<SearchResponse> {
        if query.query.trim().is_empty() {
            return Err(SearchError::InvalidQuery("Query cannot be empty".into()));
        }
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        let start = Instant::now();
        let query = self.with_defaults(query);
        let page = query.page.unwrap_or(1);
        let page_size = query.page_size.unwrap_or(self.config.page_size);

        let dispatch = self.resolve(&query);
        let weights = dispatch
            .iter()
            .map(|d| (d.processor.name().to_string(), d.processor.engine().config().weight))
            .collect();
        let container = ResultContainer::with_weights(weights);

        // A vetoed search does not reach the answerers either.
        let ctx = SearchContext::new(query);
        if !self.plugins.pre_search(&ctx) {
            let mut response = SearchResponse::empty(ctx.text(), page, page_size);
            response.duration_ms = start.elapsed().as_millis() as u64;
            return Ok(response);
        }
        container.add_answers(self.answerers.ask(ctx.text()));

        let paging = dispatch
            .iter()
            .any(|d| d.processor.engine().config().paging);
        if dispatch.is_empty() {
            debug!("No engines resolved for {:?}", ctx.text());
        } else {
            let deadline = self.config.effective_timeout(ctx.query.timeout);
            info!(
                "Searching {:?} on {} engines (deadline {:?})",
                ctx.text(),
                dispatch.len(),
                deadline
            );
            self.fan_out(&ctx.query, dispatch, deadline, &container, &cancel)
                .await;
        }

        self.plugins.post_search(&ctx, &container);
        let ranked = self.plugins.on_results(&ctx, container.ordered_results());

        // Engines already served page `page`; the merged set is the page.
        let results = ranked;
        let has_more = paging && !results.is_empty();

        Ok(SearchResponse {
            query: ctx.text().to_string(),
            number_of_results: container.number_of_results(),
            results,
            suggestions: container.suggestions(),
            corrections: container.corrections(),
            answers: container.answers(),
            infoboxes: container.infoboxes(),
            timings: container.timings(),
            unresponsive: container.unresponsive(),
            page,
            page_size,
            has_more,
            paging,
            engine_data: container.engine_data(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Fills unset options from the configuration.
    fn with_defaults(&self, mut query: SearchQuery) -> SearchQuery {
        query.page = Some(query.page.unwrap_or(1).max(1));
        query.page_size = Some(query.page_size.unwrap_or(self.config.page_size).max(1));
        if query.language.is_none() {
            query.language = Some(self.config.language.clone());
        }
        if query.locale.is_none() {
            query.locale = self.config.locale.clone();
        }
        if query.safesearch.is_none() {
            query.safesearch = Some(self.config.safesearch);
        }
        if query.categories.is_empty() && query.engines.is_empty() {
            query.categories = self.config.categories.clone();
        }
        query
    }

    /// Picks the processors for a request.
    ///
    /// Explicit engine names win over categories; unknown or disabled names
    /// are skipped. Category selection takes the union of enabled engines in
    /// registration order, each serving the first requested category it has.
    fn resolve(&self, query: &SearchQuery) -> Vec<Dispatch> {
        let processors = self.processors.read();
        let mut seen = HashSet::new();
        let mut dispatch = Vec::new();

        if !query.engines.is_empty() {
            for name in &query.engines {
                let Some(engine) = self.registry.get(name) else {
                    debug!("Unknown engine {} requested", name);
                    continue;
                };
                if !engine.config().enabled || !seen.insert(name.clone()) {
                    continue;
                }
                let categories = &engine.config().categories;
                let category = query
                    .categories
                    .iter()
                    .find(|c| categories.contains(c))
                    .or_else(|| categories.first())
                    .copied()
                    .unwrap_or_default();
                if let Some(processor) = processors.get(name) {
                    dispatch.push(Dispatch {
                        processor: Arc::clone(processor),
                        category,
                    });
                }
            }
            return dispatch;
        }

        for &category in &query.categories {
            for engine in self.registry.get_by_category(category) {
                let name = engine.name();
                if !engine.config().enabled || seen.contains(name) {
                    continue;
                }
                if let Some(processor) = processors.get(name) {
                    seen.insert(name.to_string());
                    dispatch.push(Dispatch {
                        processor: Arc::clone(processor),
                        category,
                    });
                }
            }
        }
        dispatch
    }

    /// Queries every dispatched engine concurrently under one deadline.
    ///
    /// An engine writes into the container only once its call completed, so
    /// engines cut off by the deadline or by `cancel` contribute nothing.
    async fn fan_out(
        &self,
        query: &SearchQuery,
        dispatch: Vec<Dispatch>,
        deadline: Duration,
        container: &ResultContainer,
        cancel: &CancellationToken,
    ) {
        let pending: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let mut tasks = Vec::new();

        for Dispatch { processor, category } in dispatch {
            let name = processor.name().to_string();
            if processor.is_suspended() {
                let reason = processor.suspended_reason().unwrap_or_default();
                debug!("Skipping suspended engine {}: {}", name, reason);
                container.add_unresponsive(&name, reason, true);
                continue;
            }
            let Some(params) = processor.get_params(query, category, deadline) else {
                continue;
            };

            pending.lock().push(name.clone());
            let pending = &pending;
            tasks.push(async move {
                let started = Instant::now();
                let outcome = processor.search(params).await;
                let elapsed = started.elapsed();
                pending.lock().retain(|n| n != &name);

                match outcome {
                    Ok(Some(batch)) => {
                        debug!(
                            "Engine {} returned {} results in {:?}",
                            name,
                            batch.results.len(),
                            elapsed
                        );
                        container.add_timing(&name, elapsed, batch.results.len());
                        container.extend(&name, batch);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Engine {} failed: {}", name, e);
                        let reason = match e {
                            SearchError::Timeout => "timeout".to_string(),
                            other => other.to_string(),
                        };
                        container.add_timing(&name, elapsed, 0);
                        container.add_unresponsive(&name, reason, processor.is_suspended());
                    }
                }
            });
        }

        if tasks.is_empty() {
            return;
        }

        let run = async {
            match self.config.max_concurrency {
                Some(limit) => {
                    stream::iter(tasks)
                        .buffer_unordered(limit.max(1))
                        .collect::<Vec<()>>()
                        .await;
                }
                None => {
                    join_all(tasks).await;
                }
            }
        };

        let cut_off = tokio::select! {
            _ = cancel.cancelled() => Some("cancelled"),
            finished = timeout(deadline + DEADLINE_GRACE, run) => finished.err().map(|_| "timeout"),
        };

        if let Some(reason) = cut_off {
            let unfinished = std::mem::take(&mut *pending.lock());
            warn!("Search {}; {} engines unfinished", reason, unfinished.len());
            for name in unfinished {
                container.add_unresponsive(&name, reason, false);
            }
        }
    }
}

impl Default for MetaSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetaSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaSearch")
            .field("config", &self.config)
            .field("engines", &self.registry.names())
            .finish()
    }
}
