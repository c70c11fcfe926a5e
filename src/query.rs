//! Search query representation.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::EngineCategory;

/// Safe search level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    /// No filtering.
    #[default]
    Off = 0,
    /// Moderate filtering.
    Moderate = 1,
    /// Strict filtering.
    Strict = 2,
}

/// Time range filter for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    /// Parses a time range name or its one-letter shortcut.
    pub fn from_shortcut(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "day" | "d" => Some(Self::Day),
            "week" | "w" => Some(Self::Week),
            "month" | "m" => Some(Self::Month),
            "year" | "y" => Some(Self::Year),
            _ => None,
        }
    }

    /// Returns the lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

/// Metadata about the client issuing a search, used by plugins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client IP address as seen by the server.
    pub ip: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

/// A search query with all request options.
///
/// Options left as `None` (or empty) are filled from [`Config`](crate::Config)
/// defaults by the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The search terms.
    pub query: String,
    /// Target categories.
    #[serde(default)]
    pub categories: Vec<EngineCategory>,
    /// Specific engines to use (by name); overrides category selection.
    #[serde(default)]
    pub engines: Vec<String>,
    /// Language (e.g., "en").
    pub language: Option<String>,
    /// Locale (e.g., "en-US").
    pub locale: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Number of results per page.
    pub page_size: Option<usize>,
    /// Time range filter.
    pub time_range: Option<TimeRange>,
    /// Safe search level.
    pub safesearch: Option<SafeSearch>,
    /// Per-request timeout override.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "duration_ms")]
    pub timeout: Option<Duration>,
    /// Plugins to force on for this request.
    #[serde(default)]
    pub enabled_plugins: Vec<String>,
    /// Plugins to force off for this request.
    #[serde(default)]
    pub disabled_plugins: Vec<String>,
    /// Opaque per-engine continuation state from a prior page.
    #[serde(default)]
    pub engine_data: HashMap<String, HashMap<String, String>>,
    /// Client metadata.
    #[serde(default)]
    pub client: ClientInfo,
}

impl SearchQuery {
    /// Creates a new search query with the given terms.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Sets the categories to search.
    pub fn with_categories(mut self, categories: Vec<EngineCategory>) -> Self {
        self.categories = categories;
        self
    }

    /// Sets specific engines to use.
    pub fn with_engines(mut self, engines: Vec<String>) -> Self {
        self.engines = engines;
        self
    }

    /// Sets the language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the locale.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Sets the page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the time range filter.
    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// Sets the safe search level.
    pub fn with_safesearch(mut self, level: SafeSearch) -> Self {
        self.safesearch = Some(level);
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Forces a plugin on for this request.
    pub fn enable_plugin(mut self, id: impl Into<String>) -> Self {
        self.enabled_plugins.push(id.into());
        self
    }

    /// Forces a plugin off for this request.
    pub fn disable_plugin(mut self, id: impl Into<String>) -> Self {
        self.disabled_plugins.push(id.into());
        self
    }

    /// Sets the continuation state echoed back from a previous response.
    pub fn with_engine_data(mut self, data: HashMap<String, HashMap<String, String>>) -> Self {
        self.engine_data = data;
        self
    }

    /// Sets the client metadata.
    pub fn with_client(mut self, client: ClientInfo) -> Self {
        self.client = client;
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_new() {
        let query = SearchQuery::new("test query");
        assert_eq!(query.query, "test query");
        assert!(query.categories.is_empty());
        assert!(query.engines.is_empty());
        assert!(query.page.is_none());
        assert!(query.page_size.is_none());
        assert!(query.safesearch.is_none());
        assert!(query.time_range.is_none());
        assert!(query.timeout.is_none());
    }

    #[test]
    fn test_search_query_builder_chain() {
        let query = SearchQuery::new("rust programming")
            .with_categories(vec![EngineCategory::General])
            .with_language("en")
            .with_locale("en-US")
            .with_safesearch(SafeSearch::Moderate)
            .with_page(2)
            .with_page_size(20)
            .with_time_range(TimeRange::Month)
            .with_engines(vec!["wikipedia".to_string()])
            .with_timeout(Duration::from_millis(1500))
            .enable_plugin("calculator")
            .disable_plugin("tracker_url_remover");

        assert_eq!(query.query, "rust programming");
        assert_eq!(query.language.as_deref(), Some("en"));
        assert_eq!(query.locale.as_deref(), Some("en-US"));
        assert_eq!(query.safesearch, Some(SafeSearch::Moderate));
        assert_eq!(query.page, Some(2));
        assert_eq!(query.page_size, Some(20));
        assert_eq!(query.time_range, Some(TimeRange::Month));
        assert_eq!(query.engines, vec!["wikipedia"]);
        assert_eq!(query.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(query.enabled_plugins, vec!["calculator"]);
        assert_eq!(query.disabled_plugins, vec!["tracker_url_remover"]);
    }

    #[test]
    fn test_safe_search_values() {
        assert_eq!(SafeSearch::Off as u8, 0);
        assert_eq!(SafeSearch::Moderate as u8, 1);
        assert_eq!(SafeSearch::Strict as u8, 2);
        assert!(SafeSearch::Strict > SafeSearch::Moderate);
        assert_eq!(SafeSearch::default(), SafeSearch::Off);
    }

    #[test]
    fn test_time_range_from_shortcut() {
        assert_eq!(TimeRange::from_shortcut("day"), Some(TimeRange::Day));
        assert_eq!(TimeRange::from_shortcut("W"), Some(TimeRange::Week));
        assert_eq!(TimeRange::from_shortcut("m"), Some(TimeRange::Month));
        assert_eq!(TimeRange::from_shortcut("year"), Some(TimeRange::Year));
        assert_eq!(TimeRange::from_shortcut("decade"), None);
        assert_eq!(TimeRange::Week.as_str(), "week");
    }

    #[test]
    fn test_search_query_serialization_round_trip() {
        let query = SearchQuery::new("test")
            .with_page(3)
            .with_timeout(Duration::from_millis(250));
        let json = serde_json::to_string(&query).unwrap();
        assert!(json.contains("\"query\":\"test\""));
        assert!(json.contains("\"timeout\":250"));

        let back: SearchQuery = serde_json::from_str(&json).unwrap();
        assert_eq!(back.page, Some(3));
        assert_eq!(back.timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_search_query_deserialization_minimal() {
        let json = r#"{"query":"test","safesearch":"strict","time_range":"week"}"#;
        let query: SearchQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.query, "test");
        assert_eq!(query.safesearch, Some(SafeSearch::Strict));
        assert_eq!(query.time_range, Some(TimeRange::Week));
        assert!(query.timeout.is_none());
        assert!(query.engine_data.is_empty());
    }
}
