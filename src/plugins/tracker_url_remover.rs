//! Strips tracking query parameters from result URLs.

use regex::Regex;

use super::{OnResultPlugin, Plugin, PluginInfo, SearchContext};
use crate::SearchResult;

const TRACKING_PARAMS: &str = r"^(?:utm_\w+|ga_\w+|fbclid|gclid|msclkid|mc_eid|dclid|yclid|_ga|_gl|__hsfp|__hssc|__hstc|_hsenc|hsCtaTracking|ref|ref_src|ref_url|s_kwcid)$";

/// Removes `utm_*`, click ids and similar parameters.
pub struct TrackerUrlRemoverPlugin {
    info: PluginInfo,
    pattern: Regex,
}

impl TrackerUrlRemoverPlugin {
    pub fn new() -> Self {
        Self {
            info: PluginInfo::new(
                "tracker_url_remover",
                "Tracker URL Remover",
                "Remove tracking parameters from result URLs",
                true,
            ),
            pattern: Regex::new(TRACKING_PARAMS).expect("Invalid tracking parameter pattern"),
        }
    }

    fn is_tracker(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }
}

impl Default for TrackerUrlRemoverPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for TrackerUrlRemoverPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn as_on_result(&self) -> Option<&dyn OnResultPlugin> {
        Some(self)
    }
}

impl OnResultPlugin for TrackerUrlRemoverPlugin {
    fn on_result(&self, _ctx: &SearchContext, result: &mut SearchResult) -> bool {
        let Some(mut url) = result.parsed_url.clone() else {
            return true;
        };
        if url.query().is_none() {
            return true;
        }

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let kept: Vec<&(String, String)> = pairs.iter().filter(|(k, _)| !self.is_tracker(k)).collect();
        if kept.len() == pairs.len() {
            return true;
        }

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
        result.set_url(url);
        true
    }
}
