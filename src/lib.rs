//! # a3s-metasearch
//!
//! An embeddable metasearch aggregation engine inspired by SearXNG.
//!
//! This library fans a query out to many search engines at once and folds
//! their answers into one ranked response, with support for:
//!
//! - Concurrent engine execution under a shared deadline
//! - Per-engine circuit breaking with a fixed cooldown
//! - Result deduplication, merging and weighted ranking
//! - Plugins that veto searches, add answers or rewrite results
//! - Keyword-triggered instant answers
//! - `!bang` and `:locale` query syntax
//!
//! ## Example
//!
//! ```rust,no_run
//! use a3s_metasearch::{AnyEngine, MetaSearch, SearchQuery, engines::Wikipedia};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let search = MetaSearch::new();
//!     search.register_engine(AnyEngine::online(Wikipedia::new()))?;
//!
//!     let query = search.parse_query("!wp rust").apply(SearchQuery::default());
//!     let response = search.search(query).await?;
//!
//!     for result in &response.results {
//!         println!("{}: {}", result.title, result.url);
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod container;
mod engine;
mod error;
mod parser;
mod processor;
mod query;
mod registry;
mod response;
mod result;
mod search;
mod transport;

pub mod answerers;
pub mod cache;
pub mod engines;
pub mod plugins;

pub use config::Config;
pub use container::ResultContainer;
pub use engine::{
    AnyEngine, Engine, EngineCategory, EngineConfig, EngineKind, EngineResults, EngineTraits,
    OfflineEngine, OnlineEngine, RequestParams,
};
pub use error::{Result, SearchError};
pub use parser::{ParsedQuery, QueryParser};
pub use processor::{Processor, SuspendedStatus};
pub use query::{ClientInfo, SafeSearch, SearchQuery, TimeRange};
pub use registry::EngineRegistry;
pub use response::{EngineTiming, SearchResponse, UnresponsiveEngine};
pub use result::{
    stable_hash64, Answer, Infobox, InfoboxAttribute, InfoboxUrl, ResultPriority, SearchResult,
};
pub use search::MetaSearch;
pub use transport::{HttpMethod, HttpResponse, HttpTransport, ReqwestTransport};
