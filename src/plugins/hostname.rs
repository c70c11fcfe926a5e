//! Hostname based result filtering and rewriting.

use std::collections::{HashMap, HashSet};

use super::{OnResultPlugin, Plugin, PluginInfo, SearchContext};
use crate::SearchResult;

/// Drops results from blocked hosts.
pub struct HostnameBlockerPlugin {
    info: PluginInfo,
    hostnames: HashSet<String>,
}

impl HostnameBlockerPlugin {
    pub fn new<I, S>(hostnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            info: PluginInfo::new(
                "hostname_blocker",
                "Hostname Blocker",
                "Block results from specified hostnames",
                false,
            ),
            hostnames: hostnames
                .into_iter()
                .map(|h| h.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    fn is_blocked(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        if self.hostnames.contains(&host) {
            return true;
        }
        host.strip_prefix("www.")
            .is_some_and(|bare| self.hostnames.contains(bare))
    }
}

impl Plugin for HostnameBlockerPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn as_on_result(&self) -> Option<&dyn OnResultPlugin> {
        Some(self)
    }
}

impl OnResultPlugin for HostnameBlockerPlugin {
    fn on_result(&self, _ctx: &SearchContext, result: &mut SearchResult) -> bool {
        match result.host() {
            Some(host) => !self.is_blocked(host),
            None => true,
        }
    }
}

/// Rewrites result hosts through a replacement table.
pub struct HostnameReplacerPlugin {
    info: PluginInfo,
    replacements: HashMap<String, String>,
}

impl HostnameReplacerPlugin {
    pub fn new(replacements: HashMap<String, String>) -> Self {
        Self {
            info: PluginInfo::new(
                "hostname_replacer",
                "Hostname Replacer",
                "Replace hostnames in result URLs",
                false,
            ),
            replacements,
        }
    }
}

impl Plugin for HostnameReplacerPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn as_on_result(&self) -> Option<&dyn OnResultPlugin> {
        Some(self)
    }
}

impl OnResultPlugin for HostnameReplacerPlugin {
    fn on_result(&self, _ctx: &SearchContext, result: &mut SearchResult) -> bool {
        let Some(mut url) = result.parsed_url.clone() else {
            return true;
        };
        let Some(replacement) = url.host_str().and_then(|h| self.replacements.get(h)) else {
            return true;
        };
        if url.set_host(Some(replacement.as_str())).is_ok() {
            result.set_url(url);
        }
        true
    }
}
