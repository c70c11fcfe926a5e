//! Search response returned by the orchestrator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Answer, Infobox, SearchResult};

/// How long one engine took to answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineTiming {
    /// Engine name.
    pub engine: String,
    /// Wall time of the engine call in milliseconds.
    pub duration_ms: u64,
    /// Number of results the engine contributed.
    pub results: usize,
}

/// An engine that produced nothing for this request, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresponsiveEngine {
    /// Engine name.
    pub engine: String,
    /// Human-readable reason.
    pub reason: String,
    /// Whether the engine was skipped because it is suspended.
    #[serde(default)]
    pub suspended: bool,
}

/// Aggregated and ranked search output for one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query text that was searched.
    pub query: String,
    /// Estimated total number of available results.
    pub number_of_results: u64,
    /// Ranked results merged from every engine's copy of the requested page.
    pub results: Vec<SearchResult>,
    /// Query suggestions.
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Spelling corrections.
    #[serde(default)]
    pub corrections: Vec<String>,
    /// Instant answers.
    #[serde(default)]
    pub answers: Vec<Answer>,
    /// Knowledge panels.
    #[serde(default)]
    pub infoboxes: Vec<Infobox>,
    /// Per-engine timings.
    #[serde(default)]
    pub timings: Vec<EngineTiming>,
    /// Engines that failed, timed out or were suspended.
    #[serde(default)]
    pub unresponsive: Vec<UnresponsiveEngine>,
    /// Current page (1-indexed).
    pub page: u32,
    /// Results per page requested from each paging engine.
    pub page_size: usize,
    /// Whether another page is likely available.
    pub has_more: bool,
    /// Whether any queried engine supports paging.
    pub paging: bool,
    /// Continuation state per engine, to send back with the next page request.
    #[serde(default)]
    pub engine_data: HashMap<String, HashMap<String, String>>,
    /// Total search time in milliseconds.
    pub duration_ms: u64,
}

impl SearchResponse {
    /// Creates an empty response for a query.
    pub fn empty(query: impl Into<String>, page: u32, page_size: usize) -> Self {
        Self {
            query: query.into(),
            page,
            page_size,
            ..Default::default()
        }
    }

    /// Returns the number of results on this page.
    pub fn count(&self) -> usize {
        self.results.len()
    }

    /// Returns true if the page carries no results and no answers.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.answers.is_empty() && self.infoboxes.is_empty()
    }

    /// Returns the diagnostic entry for an engine, if any.
    pub fn unresponsive_engine(&self, engine: &str) -> Option<&UnresponsiveEngine> {
        self.unresponsive.iter().find(|u| u.engine == engine)
    }
}
