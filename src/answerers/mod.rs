//! Keyword-triggered instant answers.
//!
//! Answerers are pure functions of the query text and run independently of
//! any engine. Dispatch first asks every answerer registered under a word of
//! the query, then gives every remaining answerer a chance, so each one runs
//! at most once per query.

mod color;
mod datetime;
mod hash;
mod random;
mod statistics;

pub use color::ColorAnswerer;
pub use datetime::DateTimeAnswerer;
pub use hash::HashAnswerer;
pub use random::RandomAnswerer;
pub use statistics::StatisticsAnswerer;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Answer;

/// Answerer metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswererInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Query words that trigger the answerer.
    pub keywords: Vec<String>,
    /// Sample queries.
    pub examples: Vec<String>,
}

impl AnswererInfo {
    pub(crate) fn new(
        id: &str,
        name: &str,
        description: &str,
        keywords: &[&str],
        examples: &[&str],
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            examples: examples.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// An instant-answer provider.
pub trait Answerer: Send + Sync {
    /// Returns the answerer metadata.
    fn info(&self) -> &AnswererInfo;

    /// Returns the trigger keywords.
    fn keywords(&self) -> &[String] {
        &self.info().keywords
    }

    /// Answers the raw query. An empty vector means "not for me".
    fn answer(&self, query: &str) -> Vec<Answer>;
}

#[derive(Default)]
struct Entries {
    answerers: Vec<Arc<dyn Answerer>>,
    by_keyword: HashMap<String, Vec<usize>>,
}

/// Registered answerers with a keyword index.
#[derive(Default)]
pub struct AnswererRegistry {
    inner: RwLock<Entries>,
}

impl AnswererRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in answerer.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(RandomAnswerer::new()));
        registry.register(Arc::new(HashAnswerer::new()));
        registry.register(Arc::new(DateTimeAnswerer::new()));
        registry.register(Arc::new(StatisticsAnswerer::new()));
        registry.register(Arc::new(ColorAnswerer::new()));
        registry
    }

    /// Adds an answerer and indexes its keywords.
    pub fn register(&self, answerer: Arc<dyn Answerer>) {
        let mut inner = self.inner.write();
        let index = inner.answerers.len();
        for keyword in answerer.keywords() {
            inner
                .by_keyword
                .entry(keyword.to_lowercase())
                .or_default()
                .push(index);
        }
        debug!("Registered answerer {}", answerer.info().id);
        inner.answerers.push(answerer);
    }

    /// Collects answers for a query.
    pub fn ask(&self, query: &str) -> Vec<Answer> {
        let inner = self.inner.read();
        let mut asked = HashSet::new();
        let mut answers = Vec::new();

        let lowered = query.to_lowercase();
        for word in lowered.split_whitespace() {
            let Some(indexes) = inner.by_keyword.get(word) else {
                continue;
            };
            for &index in indexes {
                if asked.insert(index) {
                    answers.extend(inner.answerers[index].answer(query));
                }
            }
        }

        for (index, answerer) in inner.answerers.iter().enumerate() {
            if asked.insert(index) {
                answers.extend(answerer.answer(query));
            }
        }

        answers
    }

    /// Lists every answerer.
    pub fn list(&self) -> Vec<AnswererInfo> {
        self.inner
            .read()
            .answerers
            .iter()
            .map(|a| a.info().clone())
            .collect()
    }

    /// Returns the number of answerers.
    pub fn len(&self) -> usize {
        self.inner.read().answerers.len()
    }

    /// Returns true if no answerer is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for AnswererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.list().into_iter().map(|i| i.id).collect();
        f.debug_struct("AnswererRegistry").field("answerers", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        info: AnswererInfo,
        calls: AtomicUsize,
        reply: Option<&'static str>,
    }

    impl Counting {
        fn new(id: &str, keywords: &[&str], reply: Option<&'static str>) -> Self {
            Self {
                info: AnswererInfo::new(id, id, "", keywords, &[]),
                calls: AtomicUsize::new(0),
                reply,
            }
        }
    }

    impl Answerer for Counting {
        fn info(&self) -> &AnswererInfo {
            &self.info
        }

        fn answer(&self, _query: &str) -> Vec<Answer> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.map(Answer::new).into_iter().collect()
        }
    }

    #[test]
    fn test_each_answerer_runs_once_per_query() {
        let registry = AnswererRegistry::new();
        let multi = Arc::new(Counting::new("multi", &["foo", "bar"], Some("hit")));
        let other = Arc::new(Counting::new("other", &["baz"], None));
        registry.register(multi.clone());
        registry.register(other.clone());

        let answers = registry.ask("foo bar FOO");
        assert_eq!(answers, vec![Answer::new("hit")]);
        assert_eq!(multi.calls.load(Ordering::SeqCst), 1);
        // Non-matching answerers still get their final chance.
        assert_eq!(other.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pattern_answerers_without_keyword_hit() {
        let registry = AnswererRegistry::new();
        registry.register(Arc::new(Counting::new("pattern", &[], Some("matched"))));
        assert_eq!(registry.ask("anything at all").len(), 1);
    }

    #[test]
    fn test_with_defaults() {
        let registry = AnswererRegistry::with_defaults();
        assert_eq!(registry.len(), 5);
        let ids: Vec<_> = registry.list().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["random", "hash", "datetime", "statistics", "color"]);
        assert!(registry.ask("rust programming language").is_empty());
    }

    #[test]
    fn test_defaults_answer_known_queries() {
        let registry = AnswererRegistry::with_defaults();
        let answers = registry.ask("md5 hello");
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer, "MD5: 5d41402abc4b2a76b9719d911017c592");

        let answers = registry.ask("sum 1 2 3");
        assert_eq!(answers[0].answer, "sum(1 2 3) = 6");
    }
}
