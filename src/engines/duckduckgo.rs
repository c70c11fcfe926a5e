//! DuckDuckGo search engine implementation.

use std::sync::Arc;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::cache::{Cache, MemoryCache};
use crate::transport::{HttpMethod, HttpResponse};
use crate::{
    Answer, Engine, EngineCategory, EngineConfig, EngineResults, EngineTraits, OnlineEngine,
    RequestParams, Result, SearchError, SearchResult, TimeRange,
};

const HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const ALL_REGIONS: &str = "wt-wt";
const VQD_TTL: Duration = Duration::from_secs(3600);
const MAX_QUERY_LEN: usize = 499;

/// DuckDuckGo search engine over the HTML endpoint.
pub struct DuckDuckGo {
    config: EngineConfig,
    traits: EngineTraits,
    cache: Arc<dyn Cache>,
}

impl DuckDuckGo {
    /// Creates a new DuckDuckGo engine with a private cache.
    pub fn new() -> Self {
        Self::with_cache(Arc::new(MemoryCache::new()))
    }

    /// Creates a new DuckDuckGo engine sharing a cache.
    pub fn with_cache(cache: Arc<dyn Cache>) -> Self {
        let mut traits = EngineTraits {
            all_locale: Some(ALL_REGIONS.to_string()),
            ..Default::default()
        };
        for (locale, region) in [
            ("en-US", "us-en"),
            ("en-GB", "uk-en"),
            ("de-DE", "de-de"),
            ("fr-FR", "fr-fr"),
            ("es-ES", "es-es"),
            ("it-IT", "it-it"),
            ("ja-JP", "jp-jp"),
            ("ko-KR", "kr-kr"),
            ("zh-CN", "cn-zh"),
            ("ru-RU", "ru-ru"),
        ] {
            traits.regions.insert(locale.to_string(), region.to_string());
        }

        Self {
            config: EngineConfig {
                name: "duckduckgo".to_string(),
                shortcut: "ddg".to_string(),
                categories: vec![EngineCategory::General, EngineCategory::Web],
                weight: 1.0,
                timeout: 10,
                enabled: true,
                paging: true,
                max_page: 0,
                time_range: true,
                safesearch: false,
            },
            traits,
            cache,
        }
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    fn region<'a>(&'a self, params: &RequestParams) -> &'a str {
        self.traits.region(&params.locale, ALL_REGIONS)
    }

    fn vqd_key(&self, query: &str, region: &str) -> String {
        self.cache.secret_hash(&format!("{}//{}", query, region))
    }

    fn cached_vqd(&self, query: &str, region: &str) -> Option<String> {
        self.cache.get(&self.vqd_key(query, region))
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

fn time_range_code(range: TimeRange) -> &'static str {
    match range {
        TimeRange::Day => "d",
        TimeRange::Week => "w",
        TimeRange::Month => "m",
        TimeRange::Year => "y",
    }
}

/// Form offset of a result page: page 2 starts at 10, later pages add 15.
fn page_offset(page: u32) -> u32 {
    match page {
        0 | 1 => 0,
        n => 10 + (n - 2) * 15,
    }
}

impl Engine for DuckDuckGo {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn traits(&self) -> Option<&EngineTraits> {
        Some(&self.traits)
    }
}

impl OnlineEngine for DuckDuckGo {
    fn request(&self, query: &str, params: &mut RequestParams) -> Result<()> {
        if query.len() > MAX_QUERY_LEN {
            return Err(SearchError::InvalidQuery(format!(
                "DuckDuckGo accepts at most {} characters",
                MAX_QUERY_LEN
            )));
        }

        let region = self.region(params).to_string();
        params.method = HttpMethod::Post;
        params.url = HTML_ENDPOINT.to_string();
        params.form_field("q", query);

        if params.page <= 1 {
            params.form_field("b", "");
        } else {
            let vqd = params
                .engine_data
                .get("vqd")
                .cloned()
                .or_else(|| self.cached_vqd(query, &region))
                .ok_or_else(|| {
                    SearchError::Other("DuckDuckGo pagination requires a vqd token".to_string())
                })?;
            let offset = page_offset(params.page);
            params
                .form_field("s", offset.to_string())
                .form_field("nextParams", "")
                .form_field("v", "l")
                .form_field("o", "json")
                .form_field("dc", (offset + 1).to_string())
                .form_field("api", "d.js")
                .form_field("vqd", vqd);
        }

        let kl = if region == ALL_REGIONS { "" } else { region.as_str() };
        params.form_field("kl", kl);
        let df = params.time_range.map(time_range_code).unwrap_or("");
        params.form_field("df", df);

        params
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Referer", HTML_ENDPOINT)
            .header(
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
            )
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "same-origin")
            .header("Sec-Fetch-User", "?1");

        params.cookie("kl", region);
        if !df.is_empty() {
            params.cookie("df", df);
        }
        Ok(())
    }

    fn response(&self, response: &HttpResponse, params: &RequestParams) -> Result<EngineResults> {
        let body = response.body.as_str();
        if body.contains("challenge-form") || body.contains("Unfortunately, bots") {
            return Err(SearchError::Parse("DuckDuckGo CAPTCHA detected".to_string()));
        }

        let document = Html::parse_document(body);
        let mut results = EngineResults::new();

        if let Some(vqd) = extract_vqd(&document)? {
            let query = params.form_value("q").unwrap_or(params.query.as_str());
            let region = self.region(params);
            self.cache.set(&self.vqd_key(query, region), vqd.clone(), VQD_TTL);
            results.set_engine_data("vqd", vqd);
        }

        for result in parse_results(&document)? {
            results.add(result);
        }

        let zero_click = selector("#zero_click_abstract")?;
        if let Some(abstract_elem) = document.select(&zero_click).next() {
            let text = element_text(abstract_elem);
            if !text.is_empty()
                && !text.contains("Your IP address")
                && !text.contains("Your user agent")
                && !text.contains("URL Decoded")
            {
                results.add_answer(Answer::new(text));
            }
        }

        debug!("DuckDuckGo returned {} results", results.results.len());
        Ok(results)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("Failed to parse selector: {:?}", e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_vqd(document: &Html) -> Result<Option<String>> {
    let input = selector(r#"input[name="vqd"]"#)?;
    Ok(document
        .select(&input)
        .filter_map(|e| e.value().attr("value"))
        .find(|v| !v.is_empty())
        .map(str::to_string))
}

fn parse_results(document: &Html) -> Result<Vec<SearchResult>> {
    let result_selector = selector("#links > div.web-result")?;
    let link_selector = selector("h2 a")?;
    let snippet_selector = selector("a.result__snippet")?;

    let mut results = Vec::new();
    for element in document.select(&result_selector) {
        if element.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(link) = element.select(&link_selector).next() else {
            continue;
        };
        let href = link.value().attr("href").unwrap_or_default();
        let url = if href.starts_with("//duckduckgo.com/l/") {
            extract_redirect_url(href)
        } else if href.starts_with("http") {
            Some(href.to_string())
        } else {
            None
        };
        let Some(url) = url else {
            continue;
        };

        let title = element_text(link);
        if title.is_empty() {
            continue;
        }
        let content = element
            .select(&snippet_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();
        results.push(SearchResult::new(url, title, content));
    }
    Ok(results)
}

fn extract_redirect_url(href: &str) -> Option<String> {
    let parsed = url::Url::parse(&format!("https:{}", href)).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
