//! Wikipedia search engine implementation.

use serde::Deserialize;

use crate::transport::HttpResponse;
use crate::{
    Engine, EngineCategory, EngineConfig, EngineResults, EngineTraits, Infobox, OnlineEngine,
    RequestParams, Result, SearchError, SearchResult,
};

/// Upper bound of `srlimit` for anonymous clients.
const MAX_LIMIT: usize = 50;

/// Wikipedia search engine using the MediaWiki API.
pub struct Wikipedia {
    config: EngineConfig,
    traits: EngineTraits,
    language: String,
}

impl Wikipedia {
    /// Creates a new Wikipedia engine.
    pub fn new() -> Self {
        let mut traits = EngineTraits::default();
        for (locale, lang) in [
            ("en-US", "en"),
            ("en-GB", "en"),
            ("de-DE", "de"),
            ("fr-FR", "fr"),
            ("es-ES", "es"),
            ("it-IT", "it"),
            ("ja-JP", "ja"),
            ("zh-CN", "zh"),
            ("zh-TW", "zh"),
            ("pt-BR", "pt"),
        ] {
            traits.languages.insert(locale.to_string(), lang.to_string());
        }

        Self {
            config: EngineConfig {
                name: "wikipedia".to_string(),
                shortcut: "wp".to_string(),
                categories: vec![EngineCategory::General],
                weight: 1.2,
                timeout: 5,
                enabled: true,
                paging: true,
                max_page: 5,
                time_range: false,
                safesearch: false,
            },
            traits,
            language: "en".to_string(),
        }
    }

    /// Sets the fallback Wikipedia language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    fn wiki_language<'a>(&'a self, params: &'a RequestParams) -> &'a str {
        if !params.language.is_empty() && params.language != "all" {
            return &params.language;
        }
        self.traits.language(&params.locale, &self.language)
    }
}

impl Default for Wikipedia {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct WikiResponse {
    query: Option<WikiQuery>,
}

#[derive(Deserialize)]
struct WikiQuery {
    #[serde(default)]
    searchinfo: Option<WikiSearchInfo>,
    search: Vec<WikiSearchResult>,
}

#[derive(Deserialize)]
struct WikiSearchInfo {
    #[serde(default)]
    totalhits: Option<u64>,
    #[serde(default)]
    suggestion: Option<String>,
}

#[derive(Deserialize)]
struct WikiSearchResult {
    title: String,
    snippet: String,
    #[serde(default)]
    timestamp: Option<String>,
}

impl Engine for Wikipedia {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn traits(&self) -> Option<&EngineTraits> {
        Some(&self.traits)
    }
}

impl OnlineEngine for Wikipedia {
    fn request(&self, query: &str, params: &mut RequestParams) -> Result<()> {
        let limit = params.page_size.clamp(1, MAX_LIMIT);
        let offset = (params.page.max(1) as usize - 1) * limit;
        params.url = format!(
            "https://{}.wikipedia.org/w/api.php?action=query&list=search&srsearch={}&format=json&srlimit={}&sroffset={}&srinfo=totalhits|suggestion&srprop=snippet|timestamp",
            self.wiki_language(params),
            urlencoding::encode(query),
            limit,
            offset
        );
        params.header("User-Agent", "Mozilla/5.0 (compatible; a3s-metasearch/0.1)");
        params.header("Accept", "application/json");
        Ok(())
    }

    fn response(&self, response: &HttpResponse, params: &RequestParams) -> Result<EngineResults> {
        let wiki: WikiResponse = serde_json::from_str(&response.body)
            .map_err(|e| SearchError::Parse(format!("Wikipedia: {}", e)))?;

        let mut results = EngineResults::new();
        let Some(query) = wiki.query else {
            return Ok(results);
        };

        let lang = self.wiki_language(params);
        if let Some(info) = query.searchinfo {
            results.number_of_results = info.totalhits;
            if let Some(suggestion) = info.suggestion.filter(|s| !s.is_empty()) {
                results.add_suggestion(suggestion);
            }
        }

        for item in query.search {
            let url = format!(
                "https://{}.wikipedia.org/wiki/{}",
                lang,
                urlencoding::encode(&item.title.replace(' ', "_"))
            );
            let content = strip_html_tags(&item.snippet);

            if params.page <= 1
                && results.infoboxes.is_empty()
                && item.title.eq_ignore_ascii_case(params.query.trim())
            {
                results.add_infobox(
                    Infobox::new(&item.title)
                        .with_id(&url)
                        .with_content(&content)
                        .with_url("Wikipedia", &url),
                );
            }

            let mut result = SearchResult::new(url, item.title, content);
            if let Some(at) = item
                .timestamp
                .as_deref()
                .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok())
            {
                result = result.with_published_at(at.with_timezone(&chrono::Utc));
            }
            results.add(result);
        }

        Ok(results)
    }
}

fn strip_html_tags(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result.replace("&quot;", "\"").replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(query: &str, page: u32) -> RequestParams {
        RequestParams {
            query: query.to_string(),
            page,
            ..Default::default()
        }
    }

    #[test]
    fn test_wikipedia_new() {
        let engine = Wikipedia::new();
        assert_eq!(engine.config.name, "wikipedia");
        assert_eq!(engine.config.shortcut, "wp");
        assert_eq!(engine.config.weight, 1.2);
        assert!(engine.config.paging);
        assert_eq!(engine.language, "en");
    }

    #[test]
    fn test_wikipedia_with_config() {
        let custom_config = EngineConfig {
            name: "Custom Wiki".to_string(),
            weight: 2.0,
            ..Default::default()
        };
        let engine = Wikipedia::new().with_config(custom_config);
        assert_eq!(engine.name(), "Custom Wiki");
        assert_eq!(engine.weight(), 2.0);
    }

    #[test]
    fn test_request_url() {
        let engine = Wikipedia::new();
        let mut params = params("rust lang", 3);
        engine.request("rust lang", &mut params).unwrap();
        assert!(params.url.starts_with("https://en.wikipedia.org/w/api.php?"));
        assert!(params.url.contains("srsearch=rust%20lang"));
        assert!(params.url.contains("srlimit=10"));
        assert!(params.url.contains("sroffset=20"));

        let mut params = RequestParams {
            page_size: 500,
            ..self::params("rust", 2)
        };
        engine.request("rust", &mut params).unwrap();
        assert!(params.url.contains("srlimit=50"));
        assert!(params.url.contains("sroffset=50"));
        assert!(params.headers.contains_key("User-Agent"));
    }

    #[test]
    fn test_request_language_from_locale() {
        let engine = Wikipedia::new().with_language("zh");
        let mut params = params("rust", 1);
        engine.request("rust", &mut params).unwrap();
        assert!(params.url.starts_with("https://zh.wikipedia.org/"));

        params.locale = "de-DE".to_string();
        engine.request("rust", &mut params).unwrap();
        assert!(params.url.starts_with("https://de.wikipedia.org/"));

        params.language = "fr".to_string();
        engine.request("rust", &mut params).unwrap();
        assert!(params.url.starts_with("https://fr.wikipedia.org/"));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "query": {
                "searchinfo": {"totalhits": 4321, "suggestion": "rusty"},
                "search": [
                    {"title": "Rust", "snippet": "<span class=\"searchmatch\">Rust</span> is an iron oxide", "timestamp": "2024-01-02T03:04:05Z"},
                    {"title": "Rust (programming language)", "snippet": "A language", "pageid": 12345}
                ]
            }
        }"#;
        let engine = Wikipedia::new();
        let results = engine
            .response(&HttpResponse::new(200, body), &params("rust", 1))
            .unwrap();

        assert_eq!(results.number_of_results, Some(4321));
        assert_eq!(results.suggestions, vec!["rusty"]);
        assert_eq!(results.results.len(), 2);
        assert_eq!(results.results[0].url, "https://en.wikipedia.org/wiki/Rust");
        assert_eq!(results.results[0].content, "Rust is an iron oxide");
        assert!(results.results[0].published_at.is_some());
        assert_eq!(
            results.results[1].url,
            "https://en.wikipedia.org/wiki/Rust_%28programming_language%29"
        );

        assert_eq!(results.infoboxes.len(), 1);
        assert_eq!(results.infoboxes[0].title, "Rust");
    }

    #[test]
    fn test_response_without_query() {
        let engine = Wikipedia::new();
        let results = engine
            .response(&HttpResponse::new(200, "{}"), &params("rust", 1))
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_response_invalid_json() {
        let engine = Wikipedia::new();
        let err = engine
            .response(&HttpResponse::new(200, "<html>"), &params("rust", 1))
            .unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));
    }

    #[test]
    fn test_strip_html_tags_simple() {
        assert_eq!(strip_html_tags("<b>bold</b> text"), "bold text");
    }

    #[test]
    fn test_strip_html_tags_nested() {
        assert_eq!(strip_html_tags("<div><span>nested</span></div>"), "nested");
    }

    #[test]
    fn test_strip_html_tags_only_tags() {
        assert_eq!(strip_html_tags("<br><hr>"), "");
    }

    #[test]
    fn test_strip_html_tags_with_attributes() {
        assert_eq!(strip_html_tags(r#"<a href="url">link</a>"#), "link");
    }

    #[test]
    fn test_strip_html_tags_entities() {
        assert_eq!(strip_html_tags("&quot;Rust&quot; &amp; Cargo"), "\"Rust\" & Cargo");
    }

    #[test]
    fn test_strip_html_tags_unclosed_tag() {
        assert_eq!(strip_html_tags("Hello <b>world"), "Hello world");
    }
}
