//! Statistics over number lists.

use regex::Regex;

use super::{Answerer, AnswererInfo};
use crate::plugins::format_number;
use crate::Answer;

pub struct StatisticsAnswerer {
    info: AnswererInfo,
    pattern: Regex,
}

impl StatisticsAnswerer {
    pub fn new() -> Self {
        Self {
            info: AnswererInfo::new(
                "statistics",
                "Statistics Calculator",
                "Calculate statistics on number lists",
                &["min", "max", "avg", "average", "sum", "prod", "product", "range", "mean"],
                &[
                    "min 5 3 9 1 7",
                    "max 10 20 15",
                    "avg 1 2 3 4 5",
                    "sum 10 20 30",
                    "prod 2 3 4",
                    "range 5 10 15 20",
                ],
            ),
            pattern: Regex::new(r"(?i)^(min|max|avg|average|mean|sum|prod|product|range)\s+(.+)$")
                .expect("Invalid statistics pattern"),
        }
    }
}

impl Default for StatisticsAnswerer {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_numbers(text: &str) -> Vec<f64> {
    text.split_whitespace()
        .map(|part| part.trim_matches([',', ';']))
        .filter_map(|part| part.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .collect()
}

/// Computes a named statistic over a non-empty list.
fn compute(name: &str, nums: &[f64]) -> Option<(&'static str, f64)> {
    let min = nums.iter().copied().fold(f64::INFINITY, f64::min);
    let max = nums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = nums.iter().sum();
    let result = match name {
        "min" => ("min", min),
        "max" => ("max", max),
        "avg" | "average" | "mean" => ("avg", sum / nums.len() as f64),
        "sum" => ("sum", sum),
        "prod" | "product" => ("prod", nums.iter().product()),
        "range" => ("range", max - min),
        _ => return None,
    };
    Some(result)
}

impl Answerer for StatisticsAnswerer {
    fn info(&self) -> &AnswererInfo {
        &self.info
    }

    fn answer(&self, query: &str) -> Vec<Answer> {
        let Some(caps) = self.pattern.captures(query.trim()) else {
            return Vec::new();
        };
        let operands = &caps[2];
        let nums = parse_numbers(operands);
        if nums.is_empty() {
            return Vec::new();
        }
        match compute(&caps[1].to_lowercase(), &nums) {
            Some((name, value)) => vec![Answer::new(format!(
                "{}({}) = {}",
                name,
                operands,
                format_number(value)
            ))],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(query: &str) -> Option<String> {
        StatisticsAnswerer::new()
            .answer(query)
            .into_iter()
            .next()
            .map(|a| a.answer)
    }

    #[test]
    fn test_statistics() {
        assert_eq!(answer("min 5 3 9 1 7").as_deref(), Some("min(5 3 9 1 7) = 1"));
        assert_eq!(answer("max 10 20 15").as_deref(), Some("max(10 20 15) = 20"));
        assert_eq!(answer("avg 1 2 3 4").as_deref(), Some("avg(1 2 3 4) = 2.5"));
        assert_eq!(answer("Mean 1 2").as_deref(), Some("avg(1 2) = 1.5"));
        assert_eq!(answer("sum 10, 20, 30").as_deref(), Some("sum(10, 20, 30) = 60"));
        assert_eq!(answer("product 2 3 4").as_deref(), Some("prod(2 3 4) = 24"));
        assert_eq!(answer("range 5 10 15 20").as_deref(), Some("range(5 10 15 20) = 15"));
        assert_eq!(answer("avg 1 2 4").as_deref(), Some("avg(1 2 4) = 2.333333"));
    }

    #[test]
    fn test_ignores_non_numeric() {
        assert!(answer("max power").is_none());
        assert!(answer("sum").is_none());
        assert_eq!(answer("sum 1 two 3").as_deref(), Some("sum(1 two 3) = 4"));
    }
}
