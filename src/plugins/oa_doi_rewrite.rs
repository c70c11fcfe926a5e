//! Rewrites academic results to their DOI resolver URL.

use regex::Regex;
use url::Url;

use super::{OnResultPlugin, Plugin, PluginInfo, SearchContext};
use crate::SearchResult;

pub struct OaDoiRewritePlugin {
    info: PluginInfo,
    doi: Regex,
}

impl OaDoiRewritePlugin {
    pub fn new() -> Self {
        Self {
            info: PluginInfo::new(
                "oa_doi_rewrite",
                "Open Access DOI Rewrite",
                "Avoid paywalls by redirecting to open-access versions of publications",
                false,
            ),
            doi: Regex::new(r"10\.\d{4,}/[^\s?#&]+").expect("Invalid DOI pattern"),
        }
    }

    fn find_doi(&self, result: &SearchResult) -> Option<String> {
        if result.host() == Some("doi.org") {
            return None;
        }
        self.doi
            .find(&result.url)
            .map(|m| m.as_str().to_string())
            .or_else(|| result.doi.clone().filter(|d| !d.is_empty()))
    }
}

impl Default for OaDoiRewritePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for OaDoiRewritePlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn as_on_result(&self) -> Option<&dyn OnResultPlugin> {
        Some(self)
    }
}

impl OnResultPlugin for OaDoiRewritePlugin {
    fn on_result(&self, _ctx: &SearchContext, result: &mut SearchResult) -> bool {
        if let Some(doi) = self.find_doi(result) {
            if let Ok(url) = Url::parse(&format!("https://doi.org/{}", doi)) {
                if result.doi.is_none() {
                    result.doi = Some(doi);
                }
                result.set_url(url);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SearchQuery;

    fn apply(mut result: SearchResult) -> SearchResult {
        result.normalize();
        let plugin = OaDoiRewritePlugin::new();
        assert!(plugin.on_result(&SearchContext::new(SearchQuery::new("q")), &mut result));
        result
    }

    #[test]
    fn test_rewrites_doi_in_url() {
        let result = apply(SearchResult::new(
            "https://link.example.com/article/10.1007/s00134-020-06294-x?via=search",
            "paper",
            "",
        ));
        assert_eq!(result.url, "https://doi.org/10.1007/s00134-020-06294-x");
        assert_eq!(result.doi.as_deref(), Some("10.1007/s00134-020-06294-x"));
    }

    #[test]
    fn test_uses_doi_field() {
        let result = apply(
            SearchResult::new("https://journal.example.com/paper/42", "paper", "")
                .with_doi("10.1000/182"),
        );
        assert_eq!(result.url, "https://doi.org/10.1000/182");
    }

    #[test]
    fn test_leaves_other_urls_alone() {
        let result = apply(SearchResult::new("https://example.com/blog", "post", ""));
        assert_eq!(result.url, "https://example.com/blog");
        let result = apply(SearchResult::new("https://doi.org/10.1000/182", "paper", ""));
        assert_eq!(result.url, "https://doi.org/10.1000/182");
    }
}
