//! Boolean query parser
//!
//! Supports:
//! - `"exact phrase"` quoted phrases
//! - `+term` required, `-term` excluded
//! - `AND`, `OR`, `NOT` operator words before a term
//!
//! Unterminated quotes and stray operators degrade to literal text; parsing
//! never fails.

use crate::types::BooleanQuery;

/// Operator word waiting for the next term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "AND" => Some(Operator::And),
            "OR" => Some(Operator::Or),
            "NOT" => Some(Operator::Not),
            _ => None,
        }
    }
}

/// Parse a query string into required, optional, excluded and exact terms
pub fn parse_query(query: &str) -> BooleanQuery {
    let mut result = BooleanQuery::default();
    let remainder = extract_phrases(query, &mut result.exact);

    // Only the operator directly before a term classifies it
    let mut pending: Option<Operator> = None;

    for token in remainder.split_whitespace() {
        if let Some(op) = Operator::from_word(token) {
            pending = Some(op);
            continue;
        }

        if let Some(term) = token.strip_prefix('+') {
            if !term.is_empty() {
                result.required.push(term.to_string());
            }
            pending = None;
            continue;
        }

        if let Some(term) = token.strip_prefix('-') {
            if !term.is_empty() {
                result.excluded.push(term.to_string());
            }
            pending = None;
            continue;
        }

        match pending.take() {
            Some(Operator::And) => result.required.push(token.to_string()),
            Some(Operator::Not) => result.excluded.push(token.to_string()),
            Some(Operator::Or) | None => result.optional.push(token.to_string()),
        }
    }

    result
}

/// Pull `"..."` phrases into `exact` and return the text outside them
///
/// An opening quote without a partner is dropped and the rest of the input is
/// kept as ordinary text.
fn extract_phrases(query: &str, exact: &mut Vec<String>) -> String {
    let mut remainder = String::with_capacity(query.len());
    let mut rest = query;

    while let Some(open) = rest.find('"') {
        remainder.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        match after_open.find('"') {
            Some(close) => {
                let phrase = after_open[..close].trim();
                if !phrase.is_empty() {
                    exact.push(phrase.to_string());
                }
                // Keep tokens on either side of the phrase apart
                remainder.push(' ');
                rest = &after_open[close + 1..];
            }
            None => {
                remainder.push(' ');
                rest = after_open;
                break;
            }
        }
    }

    remainder.push_str(rest);
    remainder
}
