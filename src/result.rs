//! Search result types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::EngineCategory;

/// Result priority for ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultPriority {
    /// Every occurrence counts fully, regardless of position.
    High,
    /// Occurrences decay harmonically with position.
    #[default]
    Normal,
    /// Always scores zero.
    Low,
}

/// A single search result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result URL.
    pub url: String,
    /// Parsed form of `url`, filled during normalization.
    #[serde(skip)]
    pub parsed_url: Option<Url>,
    /// Result title.
    pub title: String,
    /// Result description/snippet.
    pub content: String,
    /// Result category.
    #[serde(default)]
    pub category: EngineCategory,
    /// Engines that returned this result.
    #[serde(default)]
    pub engines: BTreeSet<String>,
    /// Positions in each engine's results.
    #[serde(default)]
    pub positions: Vec<u32>,
    /// Calculated score for ranking.
    #[serde(default)]
    pub score: f64,
    /// Ranking priority.
    #[serde(default)]
    pub priority: ResultPriority,
    /// Identity hash over the normalized host and path.
    #[serde(skip)]
    pub hash: u64,
    /// Provider-reported publish time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    /// Thumbnail URL (for images/videos).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Full image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_src: Option<String>,
    /// Video duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Latitude for map results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude for map results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// File size for file results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesize: Option<String>,
    /// DOI for academic results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    /// ISSN for academic results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    /// ISBN for book results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// Authors for academic results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    /// Publisher or journal name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

impl SearchResult {
    /// Creates a new search result.
    pub fn new(url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Sets the category.
    pub fn with_category(mut self, category: EngineCategory) -> Self {
        self.category = category;
        self
    }

    /// Sets the ranking priority.
    pub fn with_priority(mut self, priority: ResultPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Adds an engine that returned this result.
    pub fn with_engine(mut self, engine: impl Into<String>, position: u32) -> Self {
        self.engines.insert(engine.into());
        self.positions.push(position);
        self
    }

    /// Sets the thumbnail URL.
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Sets the published time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Sets the DOI.
    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    /// Parses `url` if that has not happened yet and recomputes the identity hash.
    pub fn normalize(&mut self) {
        if self.parsed_url.is_none() {
            self.parsed_url = parse_lenient(&self.url);
        }
        self.hash = stable_hash64(&self.normalized_url());
    }

    /// Returns the identity key: lowercase host (without `www.`) and path,
    /// excluding scheme, query string, fragment and trailing slash. Path case
    /// is kept.
    pub fn normalized_url(&self) -> String {
        let (host, path) = match &self.parsed_url {
            Some(parsed) => (
                parsed.host_str().unwrap_or_default().to_lowercase(),
                parsed.path().to_string(),
            ),
            None => {
                let url = self
                    .url
                    .trim_start_matches("https://")
                    .trim_start_matches("http://");
                let end = url.find(['?', '#']).unwrap_or(url.len());
                let url = &url[..end];
                let split = url.find('/').unwrap_or(url.len());
                (url[..split].to_lowercase(), url[split..].to_string())
            }
        };
        let host = host.strip_prefix("www.").unwrap_or(&host);
        format!("{}{}", host, path).trim_end_matches('/').to_string()
    }

    /// Returns true if the result URL uses https.
    pub fn is_secure(&self) -> bool {
        match &self.parsed_url {
            Some(parsed) => parsed.scheme() == "https",
            None => self.url.starts_with("https://"),
        }
    }

    /// Returns the host of the result URL.
    pub fn host(&self) -> Option<&str> {
        self.parsed_url.as_ref().and_then(|u| u.host_str())
    }

    /// Replaces the URL and its parsed form together.
    pub fn set_url(&mut self, url: Url) {
        self.url = url.to_string();
        self.parsed_url = Some(url);
    }

    /// Merges a duplicate of this result (same identity hash) into it.
    ///
    /// Prefers longer title and content and a secure scheme, fills empty
    /// optional fields, and unions the contributing engines.
    pub fn merge(&mut self, other: SearchResult, engine: &str, position: u32) {
        self.engines.insert(engine.to_string());
        self.engines.extend(other.engines.iter().cloned());
        self.positions.push(position);

        let other_secure = other.is_secure();
        if other.title.len() > self.title.len() {
            self.title = other.title;
        }
        if other.content.len() > self.content.len() {
            self.content = other.content;
        }
        if !self.is_secure() && other_secure {
            self.url = other.url;
            self.parsed_url = other.parsed_url;
        }
        if other.priority == ResultPriority::High {
            self.priority = ResultPriority::High;
        }

        fill(&mut self.published_at, other.published_at);
        fill(&mut self.thumbnail, other.thumbnail);
        fill(&mut self.img_src, other.img_src);
        fill(&mut self.duration, other.duration);
        fill(&mut self.latitude, other.latitude);
        fill(&mut self.longitude, other.longitude);
        fill(&mut self.filesize, other.filesize);
        fill(&mut self.doi, other.doi);
        fill(&mut self.issn, other.issn);
        fill(&mut self.isbn, other.isbn);
        fill(&mut self.publisher, other.publisher);
        if self.authors.is_empty() {
            self.authors = other.authors;
        }
    }
}

fn fill<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if slot.is_none() {
        *slot = incoming;
    }
}

fn parse_lenient(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .or_else(|_| Url::parse(&format!("http://{}", raw.trim_start_matches("//"))))
        .ok()
        .filter(|u| u.host_str().is_some())
}

/// Computes a stable 64-bit FNV-1a hash of `value`.
pub fn stable_hash64(value: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x00000100000001b3;

    let mut hash = FNV_OFFSET;
    for byte in value.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A short instant answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text.
    pub answer: String,
    /// Optional source URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Answer {
    /// Creates an answer without a URL.
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            url: None,
        }
    }

    /// Sets the source URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A link shown in an infobox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoboxUrl {
    pub title: String,
    pub url: String,
}

/// A labelled value shown in an infobox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoboxAttribute {
    pub label: String,
    pub value: String,
}

/// A structured knowledge panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Infobox {
    /// Stable id; infoboxes sharing a non-empty id are merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub urls: Vec<InfoboxUrl>,
    #[serde(default)]
    pub attributes: Vec<InfoboxAttribute>,
    /// Engine that first contributed this infobox.
    #[serde(default)]
    pub engine: String,
    /// Every engine that contributed.
    #[serde(default)]
    pub engines: BTreeSet<String>,
}

impl Infobox {
    /// Creates an infobox with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Sets the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Adds a link.
    pub fn with_url(mut self, title: impl Into<String>, url: impl Into<String>) -> Self {
        self.urls.push(InfoboxUrl {
            title: title.into(),
            url: url.into(),
        });
        self
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(InfoboxAttribute {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    /// Returns the merge key, if any.
    pub fn merge_key(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Merges another infobox with the same id into this one.
    pub fn merge(&mut self, other: Infobox) {
        if other.content.len() > self.content.len() {
            self.content = other.content;
        }
        if self.title.is_empty() {
            self.title = other.title;
        }
        fill(&mut self.image, other.image);
        for url in other.urls {
            if !self.urls.iter().any(|u| u.url == url.url) {
                self.urls.push(url);
            }
        }
        for attribute in other.attributes {
            if !self.attributes.iter().any(|a| a.label == attribute.label) {
                self.attributes.push(attribute);
            }
        }
        if !other.engine.is_empty() {
            self.engines.insert(other.engine);
        }
        self.engines.extend(other.engines);
    }
}
