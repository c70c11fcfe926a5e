//! Extraction of `!bang` and `:locale` directives from free-text queries.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::registry::EngineRegistry;
use crate::{EngineCategory, SearchQuery, TimeRange};

/// Marker of a bang token.
pub const BANG_MARKER: char = '!';
/// Marker of a locale token.
pub const LOCALE_MARKER: char = ':';

/// Structured output of [`QueryParser::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Query text with recognized directives removed and whitespace collapsed.
    pub query: String,
    /// Engines selected by bang, by registered name.
    pub engines: Vec<String>,
    /// Categories selected by bang.
    pub categories: Vec<EngineCategory>,
    /// Time range selected by bang. The last one wins.
    pub time_range: Option<TimeRange>,
    /// Locale tag such as `en` or `de-DE`, or `all`.
    pub locale: Option<String>,
    /// Bang words that matched nothing. They stay in the query text.
    pub unknown_bangs: Vec<String>,
}

impl ParsedQuery {
    /// Returns true if the query selected engines or categories.
    pub fn has_target(&self) -> bool {
        !self.engines.is_empty() || !self.categories.is_empty()
    }

    /// Applies the directives onto a search request.
    pub fn apply(self, mut query: SearchQuery) -> SearchQuery {
        query.query = self.query;
        for engine in self.engines {
            if !query.engines.contains(&engine) {
                query.engines.push(engine);
            }
        }
        for category in self.categories {
            if !query.categories.contains(&category) {
                query.categories.push(category);
            }
        }
        if self.time_range.is_some() {
            query.time_range = self.time_range;
        }
        if let Some(locale) = self.locale {
            let language = locale.split('-').next().unwrap_or(&locale).to_string();
            query.language = Some(language);
            query.locale = Some(locale);
        }
        query
    }
}

/// Parses query directives against the engines of a registry.
pub struct QueryParser<'a> {
    registry: &'a EngineRegistry,
    locale: Regex,
}

impl<'a> QueryParser<'a> {
    pub fn new(registry: &'a EngineRegistry) -> Self {
        Self {
            registry,
            locale: Regex::new(r"^:([a-zA-Z]{2,3})(?:-([a-zA-Z]{2}))?$")
                .expect("Invalid locale pattern"),
        }
    }

    /// Splits a raw query into directives and remaining text.
    pub fn parse(&self, text: &str) -> ParsedQuery {
        let mut parsed = ParsedQuery::default();
        let mut words = Vec::new();

        for token in text.split_whitespace() {
            if let Some(word) = token.strip_prefix(BANG_MARKER).filter(|w| !w.is_empty()) {
                if self.apply_bang(word, &mut parsed) {
                    continue;
                }
                parsed.unknown_bangs.push(word.to_string());
            } else if token.starts_with(LOCALE_MARKER) {
                if let Some(locale) = self.parse_locale(token) {
                    parsed.locale = Some(locale);
                    continue;
                }
            }
            words.push(token);
        }

        parsed.query = words.join(" ");
        parsed
    }

    fn apply_bang(&self, word: &str, parsed: &mut ParsedQuery) -> bool {
        let lowered = word.to_lowercase();

        let engine = self
            .registry
            .get_by_shortcut(word)
            .or_else(|| self.registry.get_by_shortcut(&lowered))
            .or_else(|| self.registry.get(word))
            .or_else(|| {
                self.registry
                    .all()
                    .into_iter()
                    .find(|e| e.name().eq_ignore_ascii_case(word))
            });
        if let Some(engine) = engine {
            let name = engine.name().to_string();
            if !parsed.engines.contains(&name) {
                parsed.engines.push(name);
            }
            return true;
        }

        if let Some(category) = EngineCategory::from_shortcut(&lowered) {
            if !parsed.categories.contains(&category) {
                parsed.categories.push(category);
            }
            return true;
        }

        if let Some(range) = TimeRange::from_shortcut(&lowered) {
            parsed.time_range = Some(range);
            return true;
        }

        false
    }

    fn parse_locale(&self, token: &str) -> Option<String> {
        if token.eq_ignore_ascii_case(":all") {
            return Some("all".to_string());
        }
        let caps = self.locale.captures(token)?;
        let language = caps[1].to_lowercase();
        Some(match caps.get(2) {
            Some(region) => format!("{}-{}", language, region.as_str().to_uppercase()),
            None => language,
        })
    }
}
