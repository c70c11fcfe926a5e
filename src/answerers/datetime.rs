//! Current date and time.

use chrono::{DateTime, Local, TimeZone};

use super::{Answerer, AnswererInfo};
use crate::Answer;

const TRIGGERS: &[&str] = &["time", "date", "today", "now"];

pub struct DateTimeAnswerer {
    info: AnswererInfo,
}

impl DateTimeAnswerer {
    pub fn new() -> Self {
        Self {
            info: AnswererInfo::new(
                "datetime",
                "Date & Time",
                "Show current date and time",
                TRIGGERS,
                &["what time is it", "current date", "today"],
            ),
        }
    }

    fn is_triggered(query: &str) -> bool {
        query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| TRIGGERS.contains(&word))
    }
}

impl Default for DateTimeAnswerer {
    fn default() -> Self {
        Self::new()
    }
}

fn format_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%A, %B %-d, %Y %-I:%M %p").to_string()
}

impl Answerer for DateTimeAnswerer {
    fn info(&self) -> &AnswererInfo {
        &self.info
    }

    fn answer(&self, query: &str) -> Vec<Answer> {
        if !Self::is_triggered(query) {
            return Vec::new();
        }
        vec![Answer::new(format_datetime(&Local::now()))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_datetime() {
        let at = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(format_datetime(&at), "Monday, January 2, 2006 3:04 PM");
    }

    #[test]
    fn test_triggers_on_whole_words() {
        assert!(DateTimeAnswerer::is_triggered("what time is it"));
        assert!(DateTimeAnswerer::is_triggered("Current DATE"));
        assert!(DateTimeAnswerer::is_triggered("today"));
        assert!(!DateTimeAnswerer::is_triggered("timeline of rust"));
        assert!(!DateTimeAnswerer::is_triggered("update rust"));
    }

    #[test]
    fn test_answer() {
        let answerer = DateTimeAnswerer::new();
        assert_eq!(answerer.answer("time now").len(), 1);
        assert!(answerer.answer("rust").is_empty());
    }
}
