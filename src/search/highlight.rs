//! Match highlighting for presentation layers
//!
//! User terms are always passed through `regex::escape` before they reach
//! the regex compiler. A term that still fails to compile (size limits) is
//! dropped from highlighting and the rest proceed.

use std::ops::Range;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::query::parse_query;

/// Upper bound on the compiled pattern size
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Build one case-insensitive alternation matching any of `terms`
///
/// Longer terms are tried first so overlapping terms highlight the widest
/// span. Returns `None` when no usable term remains.
pub fn highlight_pattern<'a, I>(terms: I) -> Option<Regex>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut escaped: Vec<String> = Vec::new();
    for term in terms {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        let pattern = regex::escape(term);
        // Validate each term alone so one bad term cannot sink the rest
        match compile(&pattern) {
            Ok(_) => {
                if !escaped.contains(&pattern) {
                    escaped.push(pattern);
                }
            }
            Err(e) => debug!(term, error = %e, "skipping highlight term"),
        }
    }

    if escaped.is_empty() {
        return None;
    }

    escaped.sort_by(|a, b| b.len().cmp(&a.len()));

    match compile(&escaped.join("|")) {
        Ok(regex) => Some(regex),
        Err(e) => {
            debug!(error = %e, "combined highlight pattern rejected");
            None
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
}

/// Byte ranges in `text` matched by the query's positive terms
///
/// Excluded terms are never highlighted.
pub fn match_ranges(text: &str, query: &str) -> Vec<Range<usize>> {
    let parsed = parse_query(query);
    match highlight_pattern(parsed.positive_terms()) {
        Some(regex) => regex.find_iter(text).map(|m| m.range()).collect(),
        None => Vec::new(),
    }
}

/// Wrap every match of the query's positive terms in `open` / `close`
pub fn highlight(text: &str, query: &str, open: &str, close: &str) -> String {
    let ranges = match_ranges(text, query);
    if ranges.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + ranges.len() * (open.len() + close.len()));
    let mut cursor = 0;
    for range in ranges {
        out.push_str(&text[cursor..range.start]);
        out.push_str(open);
        out.push_str(&text[range.clone()]);
        out.push_str(close);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}
