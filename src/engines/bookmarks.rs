//! Offline engine searching a local bookmark collection.

use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{
    Engine, EngineCategory, EngineConfig, EngineResults, OfflineEngine, RequestParams, Result,
    SearchError, SearchResult,
};

/// A saved link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Bookmark {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Number of query terms found, or zero unless every term matches.
    fn score(&self, terms: &[String]) -> usize {
        let title = self.title.to_lowercase();
        let description = self.description.to_lowercase();
        let url = self.url.to_lowercase();

        let mut hits = 0;
        for term in terms {
            let in_title = title.contains(term.as_str());
            let in_tags = self.tags.iter().any(|t| t.eq_ignore_ascii_case(term));
            let in_rest = description.contains(term.as_str()) || url.contains(term.as_str());
            if !(in_title || in_tags || in_rest) {
                return 0;
            }
            // Title and tag hits count double.
            hits += if in_title || in_tags { 2 } else { 1 };
        }
        hits
    }
}

/// Searches bookmarks held in memory.
pub struct Bookmarks {
    config: EngineConfig,
    entries: RwLock<Vec<Bookmark>>,
}

impl Bookmarks {
    pub fn new(entries: Vec<Bookmark>) -> Self {
        Self {
            config: EngineConfig {
                name: "bookmarks".to_string(),
                shortcut: "bm".to_string(),
                categories: vec![EngineCategory::General],
                weight: 1.0,
                timeout: 1,
                enabled: true,
                paging: true,
                max_page: 0,
                time_range: false,
                safesearch: true,
            },
            entries: RwLock::new(entries),
        }
    }

    /// Loads bookmarks from a JSON array file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SearchError::Config(format!("{}: {}", path.display(), e)))?;
        let entries: Vec<Bookmark> = serde_json::from_str(&text)
            .map_err(|e| SearchError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(entries))
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn add(&self, bookmark: Bookmark) {
        self.entries.write().push(bookmark);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Engine for Bookmarks {
    fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[async_trait]
impl OfflineEngine for Bookmarks {
    async fn search(&self, query: &str, params: &RequestParams) -> Result<EngineResults> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let mut results = EngineResults::new();
        if terms.is_empty() {
            return Ok(results);
        }

        let mut matches: Vec<(usize, Bookmark)> = {
            let entries = self.entries.read();
            entries
                .iter()
                .map(|b| (b.score(&terms), b))
                .filter(|(score, _)| *score > 0)
                .map(|(score, b)| (score, b.clone()))
                .collect()
        };
        // Stable: equal scores keep insertion order.
        matches.sort_by(|a, b| b.0.cmp(&a.0));

        results.number_of_results = Some(matches.len() as u64);
        let page_size = params.page_size.max(1);
        let start = (params.page.max(1) as usize - 1) * page_size;
        for (_, bookmark) in matches.into_iter().skip(start).take(page_size) {
            results.add(
                SearchResult::new(bookmark.url, bookmark.title, bookmark.description)
                    .with_category(params.category),
            );
        }
        Ok(results)
    }
}
