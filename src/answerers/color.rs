//! RGB and hex color conversion.

use regex::Regex;

use super::{Answerer, AnswererInfo};
use crate::Answer;

pub struct ColorAnswerer {
    info: AnswererInfo,
    hex: Regex,
    rgb: Regex,
}

impl ColorAnswerer {
    pub fn new() -> Self {
        Self {
            info: AnswererInfo::new(
                "color",
                "Color Converter",
                "Convert between color formats (RGB, HEX)",
                &["rgb", "hex", "color", "#"],
                &["#ff5500", "rgb 255 85 0", "hex 255 128 64"],
            ),
            hex: Regex::new(r"^#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$")
                .expect("Invalid hex color pattern"),
            rgb: Regex::new(r"(?i)^(?:rgb|hex)\s+(\d{1,3})\s+(\d{1,3})\s+(\d{1,3})$")
                .expect("Invalid rgb color pattern"),
        }
    }

    fn convert(&self, query: &str) -> Option<String> {
        if let Some(caps) = self.hex.captures(query) {
            let r = u8::from_str_radix(&caps[1], 16).ok()?;
            let g = u8::from_str_radix(&caps[2], 16).ok()?;
            let b = u8::from_str_radix(&caps[3], 16).ok()?;
            return Some(format!("#{:02X}{:02X}{:02X} = RGB({}, {}, {})", r, g, b, r, g, b));
        }
        if let Some(caps) = self.rgb.captures(query) {
            let r: u8 = caps[1].parse().ok()?;
            let g: u8 = caps[2].parse().ok()?;
            let b: u8 = caps[3].parse().ok()?;
            return Some(format!("RGB({}, {}, {}) = #{:02X}{:02X}{:02X}", r, g, b, r, g, b));
        }
        None
    }
}

impl Default for ColorAnswerer {
    fn default() -> Self {
        Self::new()
    }
}

impl Answerer for ColorAnswerer {
    fn info(&self) -> &AnswererInfo {
        &self.info
    }

    fn answer(&self, query: &str) -> Vec<Answer> {
        self.convert(query.trim())
            .map(Answer::new)
            .into_iter()
            .collect()
    }
}
