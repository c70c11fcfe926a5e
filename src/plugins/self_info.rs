//! Answers "ip" and "user-agent" queries from the client metadata.

use super::{Plugin, PluginInfo, PostSearchPlugin, SearchContext};
use crate::container::ResultContainer;
use crate::Answer;

pub struct SelfInfoPlugin {
    info: PluginInfo,
}

impl SelfInfoPlugin {
    pub fn new() -> Self {
        Self {
            info: PluginInfo::new(
                "self_info",
                "Self Information",
                "Displays your IP if the query is 'ip' and your user agent if the query is 'user-agent'",
                false,
            )
            .with_keywords(&["ip", "user-agent", "user agent", "my ip", "what is my ip"]),
        }
    }
}

impl Default for SelfInfoPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SelfInfoPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn as_post_search(&self) -> Option<&dyn PostSearchPlugin> {
        Some(self)
    }
}

impl PostSearchPlugin for SelfInfoPlugin {
    fn post_search(&self, ctx: &SearchContext, container: &ResultContainer) {
        let client = &ctx.query.client;
        let answer = match ctx.text().trim().to_lowercase().as_str() {
            "ip" | "my ip" | "myip" | "what is my ip" => client
                .ip
                .as_ref()
                .map(|ip| format!("Your IP is: {}", ip)),
            "user-agent" | "user agent" | "useragent" | "my user agent" => client
                .user_agent
                .as_ref()
                .map(|ua| format!("Your user-agent is: {}", ua)),
            _ => None,
        };
        if let Some(answer) = answer {
            container.add_answers([Answer::new(answer)]);
        }
    }
}
