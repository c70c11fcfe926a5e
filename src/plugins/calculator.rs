//! Arithmetic expression evaluation.

use regex::Regex;

use super::{Plugin, PluginInfo, PostSearchPlugin, SearchContext};
use crate::container::ResultContainer;
use crate::Answer;

pub struct CalculatorPlugin {
    info: PluginInfo,
    pattern: Regex,
}

impl CalculatorPlugin {
    pub fn new() -> Self {
        Self {
            info: PluginInfo::new(
                "calculator",
                "Calculator",
                "Parses and solves mathematical expressions",
                false,
            )
            .with_keywords(&["="]),
            pattern: Regex::new(r"^[\d\s+\-*/().^%]+$").expect("Invalid calculator pattern"),
        }
    }

    /// Evaluates the query if it is an arithmetic expression.
    pub fn calculate(&self, query: &str) -> Option<String> {
        let expr = query.trim().trim_end_matches('=').trim();
        if !self.pattern.is_match(expr) || !expr.contains(['+', '-', '*', '/', '^', '%']) {
            return None;
        }
        let value = evaluate(expr)?;
        Some(format!("{} = {}", expr, format_number(value)))
    }
}

impl Default for CalculatorPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for CalculatorPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn as_post_search(&self) -> Option<&dyn PostSearchPlugin> {
        Some(self)
    }
}

impl PostSearchPlugin for CalculatorPlugin {
    fn post_search(&self, ctx: &SearchContext, container: &ResultContainer) {
        if let Some(answer) = self.calculate(ctx.text()) {
            container.add_answers([Answer::new(answer)]);
        }
    }
}

/// Formats a number without a fractional part when it is integral,
/// otherwise with up to six decimals and trailing zeros trimmed.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let formatted = format!("{:.6}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Evaluates `+ - * / % ^`, parentheses and unary signs. Returns `None` on
/// malformed input or a non-finite result.
fn evaluate(expr: &str) -> Option<f64> {
    let mut parser = ExprParser {
        tokens: expr.chars().collect(),
        pos: 0,
    };
    let value = parser.expr()?;
    parser.skip_whitespace();
    if parser.pos != parser.tokens.len() || !value.is_finite() {
        return None;
    }
    Some(value)
}

struct ExprParser {
    tokens: Vec<char>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<char> {
        self.tokens.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Some(value);
            }
        }
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.unary()?;
        loop {
            if self.eat('*') {
                value *= self.unary()?;
            } else if self.eat('/') {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return None;
                }
                value /= divisor;
            } else if self.eat('%') {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return None;
                }
                value %= divisor;
            } else {
                return Some(value);
            }
        }
    }

    fn unary(&mut self) -> Option<f64> {
        if self.eat('-') {
            return self.unary().map(|v| -v);
        }
        if self.eat('+') {
            return self.unary();
        }
        self.power()
    }

    // Right associative: 2^3^2 = 2^9.
    fn power(&mut self) -> Option<f64> {
        let base = self.primary()?;
        if self.eat('^') {
            let exponent = self.unary()?;
            return Some(base.powf(exponent));
        }
        Some(base)
    }

    fn primary(&mut self) -> Option<f64> {
        if self.eat('(') {
            let value = self.expr()?;
            return self.eat(')').then_some(value);
        }
        self.skip_whitespace();
        // Digits of one number must be contiguous.
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        self.tokens[start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .ok()
    }
}
