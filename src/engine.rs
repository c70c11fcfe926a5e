//! Search engine capability contract and configuration.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::transport::{HttpMethod, HttpResponse};
use crate::{Answer, Infobox, Result, SafeSearch, SearchResult, TimeRange};

/// Categories for search engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineCategory {
    #[default]
    General,
    Web,
    Images,
    Videos,
    News,
    Music,
    Files,
    It,
    Science,
    Social,
    Maps,
    Other,
}

impl EngineCategory {
    /// All categories, in declaration order.
    pub const ALL: [EngineCategory; 12] = [
        Self::General,
        Self::Web,
        Self::Images,
        Self::Videos,
        Self::News,
        Self::Music,
        Self::Files,
        Self::It,
        Self::Science,
        Self::Social,
        Self::Maps,
        Self::Other,
    ];

    /// Returns the lowercase category name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Web => "web",
            Self::Images => "images",
            Self::Videos => "videos",
            Self::News => "news",
            Self::Music => "music",
            Self::Files => "files",
            Self::It => "it",
            Self::Science => "science",
            Self::Social => "social",
            Self::Maps => "maps",
            Self::Other => "other",
        }
    }

    /// Parses a category from its name or bang shortcut.
    pub fn from_shortcut(token: &str) -> Option<Self> {
        let token = token.to_ascii_lowercase();
        let category = match token.as_str() {
            "general" => Self::General,
            "web" => Self::Web,
            "images" | "image" | "img" => Self::Images,
            "videos" | "video" | "vid" => Self::Videos,
            "news" => Self::News,
            "music" => Self::Music,
            "files" | "file" => Self::Files,
            "it" => Self::It,
            "science" | "sci" => Self::Science,
            "social" => Self::Social,
            "maps" | "map" => Self::Maps,
            "other" => Self::Other,
            _ => return None,
        };
        Some(category)
    }
}

/// Configuration for a search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Unique engine name.
    pub name: String,
    /// Optional unique bang shortcut (e.g., "ddg" for `!ddg`). Empty means none.
    #[serde(default)]
    pub shortcut: String,
    /// Categories this engine belongs to.
    #[serde(default = "default_categories")]
    pub categories: Vec<EngineCategory>,
    /// Weight for ranking (higher = more influence).
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Whether the engine is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Whether pagination is supported.
    #[serde(default)]
    pub paging: bool,
    /// Maximum supported page (0 = unbounded).
    #[serde(default)]
    pub max_page: u32,
    /// Whether time range filtering is supported.
    #[serde(default)]
    pub time_range: bool,
    /// Whether safe search filtering is supported.
    #[serde(default)]
    pub safesearch: bool,
}

fn default_categories() -> Vec<EngineCategory> {
    vec![EngineCategory::General]
}

fn default_weight() -> f64 {
    1.0
}

fn default_timeout() -> u64 {
    5
}

fn default_enabled() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            shortcut: String::new(),
            categories: default_categories(),
            weight: 1.0,
            timeout: 5,
            enabled: true,
            paging: false,
            max_page: 0,
            time_range: false,
            safesearch: false,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with the given name and shortcut.
    pub fn new(name: impl Into<String>, shortcut: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shortcut: shortcut.into(),
            ..Default::default()
        }
    }

    /// Returns the engine timeout as a duration.
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Language and region mappings for an engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineTraits {
    /// Locale value standing for "all locales" in the engine's own vocabulary.
    pub all_locale: Option<String>,
    /// Locale or language tag to engine language code.
    pub languages: HashMap<String, String>,
    /// Locale tag to engine region code.
    pub regions: HashMap<String, String>,
}

impl EngineTraits {
    /// Returns the engine language for a locale, trying the bare language
    /// part when the full tag is unknown.
    pub fn language<'a>(&'a self, locale: &str, fallback: &'a str) -> &'a str {
        if locale.is_empty() || locale == "all" {
            return fallback;
        }
        if let Some(lang) = self.languages.get(locale) {
            return lang;
        }
        let prefix = locale.split('-').next().unwrap_or(locale);
        self.languages
            .get(prefix)
            .map(String::as_str)
            .unwrap_or(fallback)
    }

    /// Returns the engine region for a locale.
    pub fn region<'a>(&'a self, locale: &str, fallback: &'a str) -> &'a str {
        if locale.is_empty() || locale == "all" {
            return self.all_locale.as_deref().unwrap_or(fallback);
        }
        self.regions
            .get(locale)
            .map(String::as_str)
            .unwrap_or(fallback)
    }
}

/// Parameters for one request against one engine.
///
/// The processor fills the request fields; an online engine then fills the
/// outgoing HTTP shape (`method`, `url`, headers, ...). Leaving `url` empty
/// means the engine declines the request.
#[derive(Debug, Clone)]
pub struct RequestParams {
    /// Query text.
    pub query: String,
    /// Target category.
    pub category: EngineCategory,
    /// Page number (1-indexed).
    pub page: u32,
    /// Results wanted per page. Engines with a fixed page size ignore it.
    pub page_size: usize,
    /// Safe search level.
    pub safesearch: SafeSearch,
    /// Time range filter.
    pub time_range: Option<TimeRange>,
    /// Language code.
    pub language: String,
    /// Locale tag.
    pub locale: String,
    /// Request deadline for this engine.
    pub timeout: Duration,
    /// Continuation state from a previous page.
    pub engine_data: HashMap<String, String>,

    /// HTTP method.
    pub method: HttpMethod,
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Request cookies.
    pub cookies: BTreeMap<String, String>,
    /// Form fields, sent url-encoded for POST requests.
    pub form: Vec<(String, String)>,
    /// Raw request body.
    pub body: Option<String>,
    /// Treat non-2xx statuses as transport failures.
    pub raise_for_status: bool,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: EngineCategory::General,
            page: 1,
            page_size: 10,
            safesearch: SafeSearch::Off,
            time_range: None,
            language: "all".to_string(),
            locale: String::new(),
            timeout: Duration::from_secs(5),
            engine_data: HashMap::new(),
            method: HttpMethod::Get,
            url: String::new(),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            form: Vec::new(),
            body: None,
            raise_for_status: true,
        }
    }
}

impl RequestParams {
    /// Sets a header.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets a cookie.
    pub fn cookie(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Appends a form field.
    pub fn form_field(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.form.push((name.into(), value.into()));
        self
    }

    /// Returns a form field value.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Structured output of one engine request.
#[derive(Debug, Clone, Default)]
pub struct EngineResults {
    /// Results in the engine's rank order.
    pub results: Vec<SearchResult>,
    /// Query suggestions.
    pub suggestions: Vec<String>,
    /// Spelling corrections.
    pub corrections: Vec<String>,
    /// Direct answers.
    pub answers: Vec<Answer>,
    /// Knowledge panels.
    pub infoboxes: Vec<Infobox>,
    /// Opaque state for requesting the next page.
    pub engine_data: HashMap<String, String>,
    /// Engine's own estimate of the total number of results.
    pub number_of_results: Option<u64>,
}

impl EngineResults {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a result.
    pub fn add(&mut self, result: SearchResult) {
        self.results.push(result);
    }

    /// Adds a suggestion.
    pub fn add_suggestion(&mut self, suggestion: impl Into<String>) {
        self.suggestions.push(suggestion.into());
    }

    /// Adds a correction.
    pub fn add_correction(&mut self, correction: impl Into<String>) {
        self.corrections.push(correction.into());
    }

    /// Adds an answer.
    pub fn add_answer(&mut self, answer: Answer) {
        self.answers.push(answer);
    }

    /// Adds an infobox.
    pub fn add_infobox(&mut self, infobox: Infobox) {
        self.infoboxes.push(infobox);
    }

    /// Records engine-specific continuation state.
    pub fn set_engine_data(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.engine_data.insert(key.into(), value.into());
    }

    /// Returns true when the batch carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
            && self.suggestions.is_empty()
            && self.corrections.is_empty()
            && self.answers.is_empty()
            && self.infoboxes.is_empty()
    }
}

/// Metadata every engine exposes.
pub trait Engine: Send + Sync {
    /// Returns the engine configuration.
    fn config(&self) -> &EngineConfig;

    /// Returns language/region mappings, if the engine has any.
    fn traits(&self) -> Option<&EngineTraits> {
        None
    }

    /// Returns the engine name.
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Returns the engine shortcut.
    fn shortcut(&self) -> &str {
        &self.config().shortcut
    }

    /// Returns the engine weight.
    fn weight(&self) -> f64 {
        self.config().weight
    }

    /// Returns whether the engine is enabled.
    fn is_enabled(&self) -> bool {
        self.config().enabled
    }
}

/// An engine backed by an upstream HTTP service.
pub trait OnlineEngine: Engine {
    /// Fills the outgoing request. Leaving `params.url` empty skips the engine.
    fn request(&self, query: &str, params: &mut RequestParams) -> Result<()>;

    /// Parses the upstream response.
    fn response(&self, response: &HttpResponse, params: &RequestParams) -> Result<EngineResults>;
}

/// An engine computed locally, with no network step.
#[async_trait]
pub trait OfflineEngine: Engine {
    /// Computes results for the query.
    async fn search(&self, query: &str, params: &RequestParams) -> Result<EngineResults>;
}

/// The kind of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Online,
    Offline,
}

/// A registered engine of either kind.
#[derive(Clone)]
pub enum AnyEngine {
    Online(Arc<dyn OnlineEngine>),
    Offline(Arc<dyn OfflineEngine>),
}

impl AnyEngine {
    /// Wraps an online engine.
    pub fn online<E: OnlineEngine + 'static>(engine: E) -> Self {
        Self::Online(Arc::new(engine))
    }

    /// Wraps an offline engine.
    pub fn offline<E: OfflineEngine + 'static>(engine: E) -> Self {
        Self::Offline(Arc::new(engine))
    }

    /// Returns the engine kind.
    pub fn kind(&self) -> EngineKind {
        match self {
            Self::Online(_) => EngineKind::Online,
            Self::Offline(_) => EngineKind::Offline,
        }
    }

    /// Returns the engine metadata.
    pub fn engine(&self) -> &dyn Engine {
        match self {
            Self::Online(engine) => engine.as_ref(),
            Self::Offline(engine) => engine.as_ref(),
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        self.engine().config()
    }

    /// Returns the engine name.
    pub fn name(&self) -> &str {
        &self.config().name
    }

    /// Returns the engine shortcut.
    pub fn shortcut(&self) -> &str {
        &self.config().shortcut
    }
}

impl std::fmt::Debug for AnyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyEngine")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticEngine {
        config: EngineConfig,
    }

    #[async_trait]
    impl OfflineEngine for StaticEngine {
        async fn search(&self, query: &str, _params: &RequestParams) -> Result<EngineResults> {
            let mut results = EngineResults::new();
            results.add(SearchResult::new(
                format!("https://example.com/{}", query),
                query,
                "",
            ));
            Ok(results)
        }
    }

    impl Engine for StaticEngine {
        fn config(&self) -> &EngineConfig {
            &self.config
        }
    }

    #[test]
    fn test_engine_category_default() {
        let default: EngineCategory = Default::default();
        assert_eq!(default, EngineCategory::General);
        assert_eq!(EngineCategory::ALL.len(), 12);
    }

    #[test]
    fn test_engine_category_shortcuts() {
        assert_eq!(EngineCategory::from_shortcut("images"), Some(EngineCategory::Images));
        assert_eq!(EngineCategory::from_shortcut("IMG"), Some(EngineCategory::Images));
        assert_eq!(EngineCategory::from_shortcut("map"), Some(EngineCategory::Maps));
        assert_eq!(EngineCategory::from_shortcut("nope"), None);
        for category in EngineCategory::ALL {
            assert_eq!(EngineCategory::from_shortcut(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_engine_category_serialization() {
        let json = serde_json::to_string(&EngineCategory::Images).unwrap();
        assert_eq!(json, "\"images\"");
        let category: EngineCategory = serde_json::from_str("\"it\"").unwrap();
        assert_eq!(category, EngineCategory::It);
    }

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.name, "");
        assert_eq!(config.shortcut, "");
        assert_eq!(config.categories, vec![EngineCategory::General]);
        assert_eq!(config.weight, 1.0);
        assert_eq!(config.timeout, 5);
        assert_eq!(config.timeout_duration(), Duration::from_secs(5));
        assert!(config.enabled);
        assert!(!config.paging);
        assert_eq!(config.max_page, 0);
        assert!(!config.time_range);
        assert!(!config.safesearch);
    }

    #[test]
    fn test_engine_config_deserialization() {
        let json = r#"{"name":"Test","shortcut":"t","paging":true,"max_page":10}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.name, "Test");
        assert_eq!(config.shortcut, "t");
        assert_eq!(config.categories, vec![EngineCategory::General]);
        assert_eq!(config.weight, 1.0);
        assert!(config.enabled);
        assert!(config.paging);
        assert_eq!(config.max_page, 10);
    }

    #[test]
    fn test_engine_traits_language_lookup() {
        let mut traits = EngineTraits::default();
        traits.languages.insert("de".to_string(), "german".to_string());
        traits.languages.insert("pt-BR".to_string(), "brazilian".to_string());

        assert_eq!(traits.language("pt-BR", "en"), "brazilian");
        assert_eq!(traits.language("de-AT", "en"), "german");
        assert_eq!(traits.language("fr-FR", "en"), "en");
        assert_eq!(traits.language("all", "en"), "en");
    }

    #[test]
    fn test_engine_traits_region_lookup() {
        let mut traits = EngineTraits {
            all_locale: Some("wt-wt".to_string()),
            ..Default::default()
        };
        traits.regions.insert("de-DE".to_string(), "de-de".to_string());

        assert_eq!(traits.region("de-DE", "us-en"), "de-de");
        assert_eq!(traits.region("", "us-en"), "wt-wt");
        assert_eq!(traits.region("fr-FR", "us-en"), "us-en");
    }

    #[test]
    fn test_request_params_helpers() {
        let mut params = RequestParams::default();
        params
            .header("Accept", "text/html")
            .cookie("kl", "wt-wt")
            .form_field("q", "rust");
        assert_eq!(params.headers.get("Accept").map(String::as_str), Some("text/html"));
        assert_eq!(params.cookies.get("kl").map(String::as_str), Some("wt-wt"));
        assert_eq!(params.form_value("q"), Some("rust"));
        assert_eq!(params.form_value("s"), None);
        assert!(params.raise_for_status);
        assert_eq!(params.method, HttpMethod::Get);
    }

    #[test]
    fn test_engine_results_is_empty() {
        let mut results = EngineResults::new();
        assert!(results.is_empty());
        results.set_engine_data("next", "abc");
        assert!(results.is_empty());
        results.add_suggestion("rust lang");
        assert!(!results.is_empty());
    }

    #[tokio::test]
    async fn test_any_engine_offline() {
        let engine = AnyEngine::offline(StaticEngine {
            config: EngineConfig::new("static", "st"),
        });
        assert_eq!(engine.kind(), EngineKind::Offline);
        assert_eq!(engine.name(), "static");
        assert_eq!(engine.shortcut(), "st");
        assert!(format!("{:?}", engine).contains("static"));

        if let AnyEngine::Offline(inner) = &engine {
            let results = inner.search("rust", &RequestParams::default()).await.unwrap();
            assert_eq!(results.results.len(), 1);
            assert_eq!(results.results[0].url, "https://example.com/rust");
        } else {
            panic!("Expected offline engine");
        }
    }
}
