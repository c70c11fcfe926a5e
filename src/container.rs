//! Concurrent result aggregation, deduplication and ranking.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::response::{EngineTiming, UnresponsiveEngine};
use crate::{Answer, EngineResults, Infobox, ResultPriority, SearchResult};

#[derive(Debug, Default)]
struct State {
    closed: bool,
    results: Vec<SearchResult>,
    by_hash: HashMap<u64, usize>,
    suggestions: Vec<String>,
    corrections: Vec<String>,
    answers: Vec<Answer>,
    infoboxes: Vec<Infobox>,
    engine_data: HashMap<String, HashMap<String, String>>,
    reported_totals: Vec<u64>,
    timings: Vec<EngineTiming>,
    unresponsive: Vec<UnresponsiveEngine>,
}

/// Aggregation buffer shared by every engine task of one search.
///
/// All state sits behind one mutex, so a merge is atomic to readers. The
/// first read closes the container; after that it is immutable and further
/// writes are dropped.
#[derive(Debug, Default)]
pub struct ResultContainer {
    weights: HashMap<String, f64>,
    state: Mutex<State>,
}

impl ResultContainer {
    /// Creates an empty container where every engine weighs 1.0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty container with per-engine weights.
    pub fn with_weights(weights: HashMap<String, f64>) -> Self {
        Self {
            weights,
            state: Mutex::default(),
        }
    }

    /// Merges one engine's output into the container.
    pub fn extend(&self, engine: &str, batch: EngineResults) {
        let mut state = self.state.lock();
        if state.closed {
            warn!("Ignoring results from {} after close", engine);
            return;
        }

        if let Some(total) = batch.number_of_results {
            state.reported_totals.push(total);
        }

        for (index, mut result) in batch.results.into_iter().enumerate() {
            let position = (index + 1) as u32;
            if result.parsed_url.is_none() || result.hash == 0 {
                result.normalize();
            }
            match state.by_hash.get(&result.hash).copied() {
                Some(slot) => state.results[slot].merge(result, engine, position),
                None => {
                    result.engines.insert(engine.to_string());
                    result.positions.push(position);
                    let slot = state.results.len();
                    state.by_hash.insert(result.hash, slot);
                    state.results.push(result);
                }
            }
        }

        for suggestion in batch.suggestions {
            if !state.suggestions.contains(&suggestion) {
                state.suggestions.push(suggestion);
            }
        }
        for correction in batch.corrections {
            if !state.corrections.contains(&correction) {
                state.corrections.push(correction);
            }
        }
        state.answers.extend(batch.answers);

        for mut infobox in batch.infoboxes {
            if infobox.engine.is_empty() {
                infobox.engine = engine.to_string();
            }
            infobox.engines.insert(engine.to_string());
            let existing = infobox.merge_key().and_then(|key| {
                state
                    .infoboxes
                    .iter()
                    .position(|i| i.merge_key() == Some(key))
            });
            match existing {
                Some(index) => state.infoboxes[index].merge(infobox),
                None => state.infoboxes.push(infobox),
            }
        }

        if !batch.engine_data.is_empty() {
            state
                .engine_data
                .entry(engine.to_string())
                .or_default()
                .extend(batch.engine_data);
        }
    }

    /// Appends answers computed outside any engine.
    pub fn add_answers(&self, answers: impl IntoIterator<Item = Answer>) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.answers.extend(answers);
    }

    /// Records how long an engine took.
    pub fn add_timing(&self, engine: &str, elapsed: Duration, results: usize) {
        self.state.lock().timings.push(EngineTiming {
            engine: engine.to_string(),
            duration_ms: elapsed.as_millis() as u64,
            results,
        });
    }

    /// Records an engine that produced nothing.
    pub fn add_unresponsive(&self, engine: &str, reason: impl Into<String>, suspended: bool) {
        self.state.lock().unresponsive.push(UnresponsiveEngine {
            engine: engine.to_string(),
            reason: reason.into(),
            suspended,
        });
    }

    /// Computes final scores and orders the results. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        self.close_locked(&mut state);
    }

    fn close_locked(&self, state: &mut State) {
        if state.closed {
            return;
        }
        state.closed = true;

        for result in &mut state.results {
            result.score = self.score(result);
        }
        state.results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.url.cmp(&b.url))
        });
        state.by_hash.clear();

        debug!(
            "Closed container with {} results from {} engines",
            state.results.len(),
            state.timings.len()
        );
    }

    /// Weighted score: `weight = Π engine_weight × |engines|`, summed per
    /// position according to priority.
    fn score(&self, result: &SearchResult) -> f64 {
        let mut weight = 1.0;
        for engine in &result.engines {
            weight *= self.weights.get(engine).copied().unwrap_or(1.0);
        }
        weight *= result.engines.len() as f64;

        match result.priority {
            ResultPriority::Low => 0.0,
            ResultPriority::High => weight * result.positions.len() as f64,
            ResultPriority::Normal => result
                .positions
                .iter()
                .map(|&position| weight / f64::from(position.max(1)))
                .sum(),
        }
    }

    /// Returns true once the container has been closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Returns the results sorted by descending score.
    pub fn ordered_results(&self) -> Vec<SearchResult> {
        let mut state = self.state.lock();
        self.close_locked(&mut state);
        state.results.clone()
    }

    /// Estimated total available results: the average of engine-reported
    /// totals, or zero if that is below what was actually collected.
    pub fn number_of_results(&self) -> u64 {
        let mut state = self.state.lock();
        self.close_locked(&mut state);
        if state.reported_totals.is_empty() {
            return 0;
        }
        let sum: u64 = state.reported_totals.iter().sum();
        let average = sum / state.reported_totals.len() as u64;
        if average < state.results.len() as u64 {
            0
        } else {
            average
        }
    }

    /// Returns the deduplicated suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        let mut state = self.state.lock();
        self.close_locked(&mut state);
        state.suggestions.clone()
    }

    /// Returns the deduplicated corrections.
    pub fn corrections(&self) -> Vec<String> {
        let mut state = self.state.lock();
        self.close_locked(&mut state);
        state.corrections.clone()
    }

    /// Returns every answer in arrival order.
    pub fn answers(&self) -> Vec<Answer> {
        let mut state = self.state.lock();
        self.close_locked(&mut state);
        state.answers.clone()
    }

    /// Returns the merged infoboxes.
    pub fn infoboxes(&self) -> Vec<Infobox> {
        let mut state = self.state.lock();
        self.close_locked(&mut state);
        state.infoboxes.clone()
    }

    /// Returns continuation state per engine.
    pub fn engine_data(&self) -> HashMap<String, HashMap<String, String>> {
        let mut state = self.state.lock();
        self.close_locked(&mut state);
        state.engine_data.clone()
    }

    /// Returns per-engine timings.
    pub fn timings(&self) -> Vec<EngineTiming> {
        let mut state = self.state.lock();
        self.close_locked(&mut state);
        state.timings.clone()
    }

    /// Returns unresponsive-engine diagnostics.
    pub fn unresponsive(&self) -> Vec<UnresponsiveEngine> {
        let mut state = self.state.lock();
        self.close_locked(&mut state);
        state.unresponsive.clone()
    }
}
