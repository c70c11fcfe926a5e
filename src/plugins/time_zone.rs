//! Current time in another city or zone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::{Plugin, PluginInfo, PostSearchPlugin, SearchContext};
use crate::container::ResultContainer;
use crate::Answer;

/// Query prefixes, longest first so "time in" wins over "time".
const PREFIXES: &[&str] = &["time in ", "clock in ", "time ", "clock ", "now ", "timezone "];

const CITIES: &[(&str, Tz)] = &[
    ("new york", Tz::America__New_York),
    ("los angeles", Tz::America__Los_Angeles),
    ("san francisco", Tz::America__Los_Angeles),
    ("chicago", Tz::America__Chicago),
    ("toronto", Tz::America__Toronto),
    ("vancouver", Tz::America__Vancouver),
    ("sao paulo", Tz::America__Sao_Paulo),
    ("london", Tz::Europe__London),
    ("paris", Tz::Europe__Paris),
    ("berlin", Tz::Europe__Berlin),
    ("madrid", Tz::Europe__Madrid),
    ("moscow", Tz::Europe__Moscow),
    ("dubai", Tz::Asia__Dubai),
    ("mumbai", Tz::Asia__Kolkata),
    ("delhi", Tz::Asia__Kolkata),
    ("singapore", Tz::Asia__Singapore),
    ("hong kong", Tz::Asia__Hong_Kong),
    ("beijing", Tz::Asia__Shanghai),
    ("shanghai", Tz::Asia__Shanghai),
    ("tokyo", Tz::Asia__Tokyo),
    ("seoul", Tz::Asia__Seoul),
    ("sydney", Tz::Australia__Sydney),
    ("auckland", Tz::Pacific__Auckland),
    ("utc", Tz::UTC),
    ("gmt", Tz::UTC),
];

pub struct TimezonePlugin {
    info: PluginInfo,
}

impl TimezonePlugin {
    pub fn new() -> Self {
        Self {
            info: PluginInfo::new(
                "time_zone",
                "Timezones",
                "Display the current time on different time zones",
                false,
            )
            .with_keywords(&["time", "timezone", "now", "clock", "timezones"]),
        }
    }

    /// Resolves "time in tokyo" or "time Europe/Paris" to a display name and zone.
    fn locate(query: &str) -> Option<(String, Tz)> {
        let query = query.trim();
        let lower = query.to_lowercase();
        let prefix = PREFIXES.iter().find(|p| lower.starts_with(*p))?;
        let location = query.get(prefix.len()..)?.trim();
        if location.is_empty() {
            return None;
        }

        let key = location.to_lowercase();
        if let Some((_, tz)) = CITIES.iter().find(|(city, _)| *city == key) {
            return Some((location.to_string(), *tz));
        }
        location
            .parse::<Tz>()
            .ok()
            .map(|tz| (location.to_string(), tz))
    }

    /// Formats the answer for `query` as of `now`.
    pub fn answer_at(&self, query: &str, now: DateTime<Utc>) -> Option<String> {
        let (location, tz) = Self::locate(query)?;
        let local = now.with_timezone(&tz);
        Some(format!(
            "Current time in {}: {} ({}, {})",
            location,
            local.format("%H:%M, %A %-d %B %Y"),
            tz.name(),
            local.format("%Z")
        ))
    }
}

impl Default for TimezonePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for TimezonePlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn as_post_search(&self) -> Option<&dyn PostSearchPlugin> {
        Some(self)
    }
}

impl PostSearchPlugin for TimezonePlugin {
    fn post_search(&self, ctx: &SearchContext, container: &ResultContainer) {
        if let Some(answer) = self.answer_at(ctx.text(), Utc::now()) {
            container.add_answers([Answer::new(answer)]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summer() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_city_lookup_follows_daylight_saving() {
        let plugin = TimezonePlugin::new();
        assert_eq!(
            plugin.answer_at("time in London", summer()).as_deref(),
            Some("Current time in London: 13:00, Monday 1 July 2024 (Europe/London, BST)")
        );

        let winter = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let answer = plugin.answer_at("time in london", winter).unwrap();
        assert!(answer.contains("12:00, Monday 15 January 2024"));
        assert!(answer.ends_with("GMT)"));
    }

    #[test]
    fn test_prefixes_and_cities() {
        let plugin = TimezonePlugin::new();
        let tokyo = plugin.answer_at("clock tokyo", summer()).unwrap();
        assert!(tokyo.contains("21:00"));
        assert!(tokyo.contains("Asia/Tokyo"));

        let new_york = plugin.answer_at("TIME IN New York", summer()).unwrap();
        assert!(new_york.starts_with("Current time in New York: 08:00"));

        let utc = plugin.answer_at("now utc", summer()).unwrap();
        assert!(utc.contains("12:00"));
    }

    #[test]
    fn test_zone_names_are_accepted() {
        let plugin = TimezonePlugin::new();
        let paris = plugin.answer_at("timezone Europe/Paris", summer()).unwrap();
        assert!(paris.contains("14:00"));
        assert!(paris.contains("(Europe/Paris, CEST)"));
    }

    #[test]
    fn test_unknown_or_missing_location() {
        let plugin = TimezonePlugin::new();
        assert!(plugin.answer_at("time in atlantis", summer()).is_none());
        assert!(plugin.answer_at("time", summer()).is_none());
        assert!(plugin.answer_at("time in ", summer()).is_none());
        assert!(plugin.answer_at("what time is it", summer()).is_none());
    }

    #[test]
    fn test_post_search_adds_answer() {
        let container = ResultContainer::new();
        let ctx = SearchContext::new(crate::SearchQuery::new("time in sydney"));
        TimezonePlugin::new().post_search(&ctx, &container);
        let answers = container.answers();
        assert_eq!(answers.len(), 1);
        assert!(answers[0].answer.contains("Australia/Sydney"));
    }
}
