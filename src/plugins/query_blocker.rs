//! Stops searches whose query matches a blocked pattern.

use regex::Regex;
use tracing::warn;

use super::{Plugin, PluginInfo, PreSearchPlugin, SearchContext};

pub struct QueryBlockerPlugin {
    info: PluginInfo,
    patterns: Vec<Regex>,
}

impl QueryBlockerPlugin {
    /// Creates a blocker from regex patterns. Invalid patterns are logged and
    /// skipped.
    pub fn new<S: AsRef<str>>(patterns: Vec<S>) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match Regex::new(p.as_ref()) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Ignoring invalid query block pattern {:?}: {}", p.as_ref(), e);
                    None
                }
            })
            .collect();
        Self {
            info: PluginInfo::new(
                "query_blocker",
                "Query Blocker",
                "Refuse searches matching configured patterns",
                false,
            ),
            patterns,
        }
    }
}

impl Plugin for QueryBlockerPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn as_pre_search(&self) -> Option<&dyn PreSearchPlugin> {
        Some(self)
    }
}

impl PreSearchPlugin for QueryBlockerPlugin {
    fn pre_search(&self, ctx: &SearchContext) -> bool {
        !self.patterns.iter().any(|p| p.is_match(ctx.text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SearchQuery;

    #[test]
    fn test_blocks_matching_queries() {
        let plugin = QueryBlockerPlugin::new(vec![r"(?i)\bcasino\b", "^torrent "]);
        let ctx = |q: &str| SearchContext::new(SearchQuery::new(q));
        assert!(!plugin.pre_search(&ctx("best Casino bonus")));
        assert!(!plugin.pre_search(&ctx("torrent linux iso")));
        assert!(plugin.pre_search(&ctx("linux torrent client")));
        assert!(plugin.pre_search(&ctx("rust")));
    }

    #[test]
    fn test_invalid_patterns_are_skipped() {
        let plugin = QueryBlockerPlugin::new(vec!["(unclosed", "ok"]);
        assert_eq!(plugin.patterns.len(), 1);
    }

    #[test]
    fn test_empty_blocker_allows_everything() {
        let plugin = QueryBlockerPlugin::new(Vec::<String>::new());
        assert!(plugin.pre_search(&SearchContext::new(SearchQuery::new("anything"))));
    }
}
