//! Check constraint interpreter.
//!
//! Only one expression shape is understood, the two-sided numeric bound the
//! database reports for range checks:
//!
//! ```text
//! ((field >= N) AND (field <= M))
//! ```
//!
//! `N` and `M` are non-negative integers and both sides must name the same
//! field. An optional leading `CHECK` keyword and extra wrapping parentheses
//! are tolerated. Every other expression parses to [`CheckExpr::Unrecognized`]
//! and evaluates as satisfied; the database remains the authority for it.

use tracing::trace;

use crate::value::{Record, Value};

/// A parsed check constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckExpr {
    /// `field` must lie within `min..=max`.
    Range {
        /// Constrained field.
        field: String,
        /// Inclusive lower bound.
        min: u64,
        /// Inclusive upper bound.
        max: u64,
    },
    /// Any expression outside the supported grammar.
    Unrecognized,
}

impl CheckExpr {
    /// Parse a raw constraint definition.
    pub fn parse(raw: &str) -> Self {
        let expr = tokenize(raw).and_then(|tokens| match_range(&tokens));
        if expr.is_none() {
            trace!(definition = raw, "check constraint outside supported grammar");
        }
        expr.unwrap_or(CheckExpr::Unrecognized)
    }

    /// The field this expression constrains, if recognized.
    pub fn field(&self) -> Option<&str> {
        match self {
            CheckExpr::Range { field, .. } => Some(field),
            CheckExpr::Unrecognized => None,
        }
    }

    /// Check if the expression was recognized.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, CheckExpr::Unrecognized)
    }

    /// Evaluate against a record.
    ///
    /// Returns `true` when the record satisfies the expression or when it
    /// cannot be judged: unrecognized shape, absent or null field, or a value
    /// with no numeric reading.
    pub fn evaluate(&self, record: &Record) -> bool {
        let CheckExpr::Range { field, min, max } = self else {
            return true;
        };

        let Some(value) = record.get(field).filter(|v| !v.is_null()) else {
            return true;
        };

        // Integers compare exactly; the f64 path is for fractional values.
        if let Some(n) = integer_reading(value) {
            return n >= i128::from(*min) && n <= i128::from(*max);
        }
        match value.as_f64() {
            Some(n) => n >= *min as f64 && n <= *max as f64,
            None => true,
        }
    }
}

fn integer_reading(value: &Value) -> Option<i128> {
    match value {
        Value::Int(i) => Some(i128::from(*i)),
        Value::String(s) => s.trim().parse::<i64>().ok().map(i128::from),
        _ => None,
    }
}

/// Check constraint evaluator.
pub struct CheckEvaluator;

impl CheckEvaluator {
    /// Evaluate a raw check definition against a record.
    ///
    /// Returns `true` if the constraint is satisfied or cannot be evaluated.
    pub fn evaluate(record: &Record, raw_definition: &str) -> bool {
        CheckExpr::parse(raw_definition).evaluate(record)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Ident(String),
    Number(u64),
    Ge,
    Le,
    And,
}

fn tokenize(raw: &str) -> Option<Vec<Token>> {
    let chars: Vec<char> = raw.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '>' | '<' => {
                if chars.get(i + 1) != Some(&'=') {
                    return None;
                }
                tokens.push(if c == '>' { Token::Ge } else { Token::Le });
                i += 2;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start..i].iter().collect();
                tokens.push(Token::Number(digits.parse().ok()?));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if word.eq_ignore_ascii_case("and") {
                    tokens.push(Token::And);
                } else {
                    tokens.push(Token::Ident(word));
                }
            }
            _ => return None,
        }
    }

    Some(tokens)
}

/// Match `[CHECK] (* (f >= N) AND (f <= M) )*`.
fn match_range(tokens: &[Token]) -> Option<CheckExpr> {
    let mut tokens = match tokens.first() {
        Some(Token::Ident(word)) if word.eq_ignore_ascii_case("check") => &tokens[1..],
        _ => tokens,
    };

    while is_wrapped(tokens) {
        tokens = &tokens[1..tokens.len() - 1];
    }

    match tokens {
        [Token::LParen, Token::Ident(lower_field), Token::Ge, Token::Number(min), Token::RParen, Token::And, Token::LParen, Token::Ident(upper_field), Token::Le, Token::Number(max), Token::RParen]
            if lower_field == upper_field =>
        {
            Some(CheckExpr::Range {
                field: lower_field.clone(),
                min: *min,
                max: *max,
            })
        }
        _ => None,
    }
}

/// True when the first token opens a paren that closes at the last token.
fn is_wrapped(tokens: &[Token]) -> bool {
    if tokens.len() < 2 || tokens[0] != Token::LParen {
        return false;
    }

    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth = match depth.checked_sub(1) {
                    Some(d) => d,
                    None => return false,
                };
                if depth == 0 {
                    return i == tokens.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}
