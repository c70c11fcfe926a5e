//! Message digests of arbitrary text.

use md5::Md5;
use regex::Regex;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use super::{Answerer, AnswererInfo};
use crate::Answer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Blake3,
}

impl Algorithm {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "md5" => Some(Self::Md5),
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            "blake3" => Some(Self::Blake3),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
            Self::Blake3 => "BLAKE3",
        }
    }

    fn digest_hex(self, input: &[u8]) -> String {
        match self {
            Self::Md5 => hex::encode(Md5::digest(input)),
            Self::Sha1 => hex::encode(Sha1::digest(input)),
            Self::Sha256 => hex::encode(Sha256::digest(input)),
            Self::Sha512 => hex::encode(Sha512::digest(input)),
            Self::Blake3 => blake3::hash(input).to_hex().to_string(),
        }
    }
}

pub struct HashAnswerer {
    info: AnswererInfo,
    pattern: Regex,
}

impl HashAnswerer {
    pub fn new() -> Self {
        Self {
            info: AnswererInfo::new(
                "hash",
                "Hash Calculator",
                "Calculate hashes of strings",
                &["md5", "sha1", "sha256", "sha512", "blake3", "hash"],
                &["md5 hello", "sha256 hello world"],
            ),
            pattern: Regex::new(r"(?i)^(md5|sha1|sha256|sha512|blake3)\s+(.+)$")
                .expect("Invalid hash pattern"),
        }
    }
}

impl Default for HashAnswerer {
    fn default() -> Self {
        Self::new()
    }
}

impl Answerer for HashAnswerer {
    fn info(&self) -> &AnswererInfo {
        &self.info
    }

    fn answer(&self, query: &str) -> Vec<Answer> {
        let Some(caps) = self.pattern.captures(query.trim()) else {
            return Vec::new();
        };
        let Some(algorithm) = Algorithm::from_name(&caps[1]) else {
            return Vec::new();
        };
        let digest = algorithm.digest_hex(caps[2].as_bytes());
        vec![Answer::new(format!("{}: {}", algorithm.label(), digest))]
    }
}
