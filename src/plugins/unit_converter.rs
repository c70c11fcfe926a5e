//! `<n> <unit> in <unit>` conversions.

use std::collections::HashMap;

use regex::Regex;

use super::calculator::format_number;
use super::{Plugin, PluginInfo, PostSearchPlugin, SearchContext};
use crate::container::ResultContainer;
use crate::Answer;

const FACTORS: &[(&str, &[(&str, f64)])] = &[
    // length
    ("m", &[("km", 0.001), ("cm", 100.0), ("mm", 1000.0), ("mi", 0.000621371), ("ft", 3.28084), ("in", 39.3701), ("yd", 1.09361)]),
    ("km", &[("m", 1000.0), ("mi", 0.621371), ("ft", 3280.84)]),
    ("mi", &[("km", 1.60934), ("m", 1609.34), ("ft", 5280.0)]),
    ("ft", &[("m", 0.3048), ("in", 12.0), ("cm", 30.48), ("yd", 0.333333)]),
    ("in", &[("cm", 2.54), ("mm", 25.4), ("ft", 0.0833333)]),
    ("cm", &[("m", 0.01), ("in", 0.393701), ("mm", 10.0)]),
    ("mm", &[("cm", 0.1), ("m", 0.001), ("in", 0.0393701)]),
    ("yd", &[("m", 0.9144), ("ft", 3.0)]),
    // mass
    ("kg", &[("g", 1000.0), ("lb", 2.20462), ("oz", 35.274)]),
    ("g", &[("kg", 0.001), ("mg", 1000.0), ("oz", 0.035274)]),
    ("lb", &[("kg", 0.453592), ("oz", 16.0), ("g", 453.592)]),
    ("oz", &[("g", 28.3495), ("lb", 0.0625)]),
    ("mg", &[("g", 0.001)]),
    // volume
    ("l", &[("ml", 1000.0), ("gal", 0.264172), ("qt", 1.05669)]),
    ("ml", &[("l", 0.001)]),
    ("gal", &[("l", 3.78541), ("qt", 4.0)]),
    ("qt", &[("l", 0.946353), ("gal", 0.25)]),
    // time
    ("s", &[("ms", 1000.0), ("min", 0.0166667), ("h", 0.000277778)]),
    ("min", &[("s", 60.0), ("h", 0.0166667)]),
    ("h", &[("min", 60.0), ("s", 3600.0), ("d", 0.0416667)]),
    ("d", &[("h", 24.0), ("min", 1440.0), ("s", 86400.0)]),
    ("ms", &[("s", 0.001)]),
];

pub struct UnitConverterPlugin {
    info: PluginInfo,
    pattern: Regex,
    factors: HashMap<&'static str, HashMap<&'static str, f64>>,
}

impl UnitConverterPlugin {
    pub fn new() -> Self {
        let factors = FACTORS
            .iter()
            .map(|(from, targets)| (*from, targets.iter().copied().collect()))
            .collect();
        Self {
            info: PluginInfo::new(
                "unit_converter",
                "Unit Converter",
                "Convert between units of length, mass, volume, time and temperature",
                false,
            )
            .with_keywords(&["in", "to", "as"]),
            pattern: Regex::new(r"(?i)^(-?[\d.]+)\s*(\w+)\s+(?:in|to|as)\s+(\w+)$")
                .expect("Invalid unit conversion pattern"),
            factors,
        }
    }

    /// Converts the query if it has the `<n> <unit> in <unit>` shape.
    pub fn convert(&self, query: &str) -> Option<String> {
        let caps = self.pattern.captures(query.trim())?;
        let value: f64 = caps[1].parse().ok()?;
        let from = caps[2].to_lowercase();
        let to = caps[3].to_lowercase();

        if let Some(answer) = convert_temperature(value, &from, &to) {
            return Some(answer);
        }

        let factor = self.factors.get(from.as_str())?.get(to.as_str())?;
        Some(format!(
            "{} {} = {} {}",
            format_number(value),
            from,
            format_number(value * factor),
            to
        ))
    }
}

impl Default for UnitConverterPlugin {
    fn default() -> Self {
        Self::new()
    }
}

fn convert_temperature(value: f64, from: &str, to: &str) -> Option<String> {
    let celsius = match from {
        "c" | "celsius" => value,
        "f" | "fahrenheit" => (value - 32.0) * 5.0 / 9.0,
        "k" | "kelvin" => value - 273.15,
        _ => return None,
    };
    let (converted, symbol) = match to {
        "c" | "celsius" => (celsius, "°C"),
        "f" | "fahrenheit" => (celsius * 9.0 / 5.0 + 32.0, "°F"),
        "k" | "kelvin" => (celsius + 273.15, "K"),
        _ => return None,
    };
    Some(format!(
        "{} → {} {}",
        format_number(value),
        format_number(converted),
        symbol
    ))
}

impl Plugin for UnitConverterPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn as_post_search(&self) -> Option<&dyn PostSearchPlugin> {
        Some(self)
    }
}

impl PostSearchPlugin for UnitConverterPlugin {
    fn post_search(&self, ctx: &SearchContext, container: &ResultContainer) {
        if let Some(answer) = self.convert(ctx.text()) {
            container.add_answers([Answer::new(answer)]);
        }
    }
}
