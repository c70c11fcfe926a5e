//! Random numbers, strings, UUIDs and passwords.

use rand::Rng;
use regex::Regex;

use super::{Answerer, AnswererInfo};
use crate::Answer;

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const PASSWORD_CHARS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

const MAX_STRING_LEN: usize = 1000;
const MAX_PASSWORD_LEN: usize = 100;
const DEFAULT_PASSWORD_LEN: usize = 20;

/// Generates random values from the thread-local CSPRNG.
pub struct RandomAnswerer {
    info: AnswererInfo,
    number: Regex,
    string: Regex,
    uuid: Regex,
    password: Regex,
}

impl RandomAnswerer {
    pub fn new() -> Self {
        Self {
            info: AnswererInfo::new(
                "random",
                "Random Generator",
                "Generate random numbers and strings",
                &["random", "uuid", "password"],
                &["random number 1 100", "random string 16", "uuid", "password 20"],
            ),
            number: Regex::new(r"(?i)^random\s+number\s+(\d+)\s+(\d+)$")
                .expect("Invalid random number pattern"),
            string: Regex::new(r"(?i)^random\s+string\s+(\d+)$")
                .expect("Invalid random string pattern"),
            uuid: Regex::new(r"(?i)^uuid$").expect("Invalid uuid pattern"),
            password: Regex::new(r"(?i)^password\s*(\d*)$").expect("Invalid password pattern"),
        }
    }

    fn generate(&self, query: &str) -> Option<String> {
        if let Some(caps) = self.number.captures(query) {
            let min: u64 = caps[1].parse().ok()?;
            let max: u64 = caps[2].parse().ok()?;
            if min >= max {
                return None;
            }
            return Some(rand::rng().random_range(min..=max).to_string());
        }
        if let Some(caps) = self.string.captures(query) {
            let len = caps[1].parse::<usize>().ok()?.min(MAX_STRING_LEN);
            return Some(random_chars(ALPHANUMERIC, len));
        }
        if self.uuid.is_match(query) {
            return Some(uuid::Uuid::new_v4().to_string());
        }
        if let Some(caps) = self.password.captures(query) {
            let len = match &caps[1] {
                "" => DEFAULT_PASSWORD_LEN,
                n => n.parse::<usize>().ok()?.min(MAX_PASSWORD_LEN),
            };
            return Some(random_chars(PASSWORD_CHARS, len));
        }
        None
    }
}

impl Default for RandomAnswerer {
    fn default() -> Self {
        Self::new()
    }
}

fn random_chars(charset: &[u8], len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| charset[rng.random_range(0..charset.len())] as char)
        .collect()
}

impl Answerer for RandomAnswerer {
    fn info(&self) -> &AnswererInfo {
        &self.info
    }

    fn answer(&self, query: &str) -> Vec<Answer> {
        self.generate(query.trim())
            .filter(|value| !value.is_empty())
            .map(Answer::new)
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(query: &str) -> Option<String> {
        RandomAnswerer::new()
            .answer(query)
            .into_iter()
            .next()
            .map(|a| a.answer)
    }

    #[test]
    fn test_random_number_in_range() {
        for _ in 0..50 {
            let n: u64 = one("random number 5 10").unwrap().parse().unwrap();
            assert!((5..=10).contains(&n));
        }
        assert!(one("random number 10 5").is_none());
        assert!(one("random number 3 3").is_none());
    }

    #[test]
    fn test_random_string_length_and_charset() {
        let s = one("Random String 16").unwrap();
        assert_eq!(s.len(), 16);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(one("random string 5000").unwrap().len(), MAX_STRING_LEN);
        assert!(one("random string 0").is_none());
    }

    #[test]
    fn test_uuid_is_v4() {
        let id = one("uuid").unwrap();
        let parsed = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_password_lengths() {
        assert_eq!(one("password").unwrap().len(), DEFAULT_PASSWORD_LEN);
        assert_eq!(one("password 8").unwrap().len(), 8);
        assert_eq!(one("password 500").unwrap().len(), MAX_PASSWORD_LEN);
        assert!(one("password 8")
            .unwrap()
            .bytes()
            .all(|b| PASSWORD_CHARS.contains(&b)));
    }

    #[test]
    fn test_unrelated_query() {
        assert!(one("random facts about rust").is_none());
        assert!(one("uuid generator online").is_none());
    }
}
