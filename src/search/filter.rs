//! Multi-dimensional record filtering
//!
//! A record survives when it passes every stage in order:
//!
//! 1. type include-list
//! 2. type exclude-list
//! 3. tag intersection
//! 4. inclusive date range
//! 5. status / priority / sentiment include-lists
//! 6. relationship presence
//! 7. the boolean text query against the `search_in` field(s)
//!
//! Relative input order is preserved. Empty constraints are skipped, so the
//! default [`SearchFilter`] is the identity.

use tracing::debug;

use super::fuzzy::{fuzzy_match_words, DEFAULT_FUZZY_THRESHOLD};
use super::query::parse_query;
use crate::types::{BooleanQuery, MemoryRecord, SearchFilter, SearchIn};

/// Filter records with the default fuzzy threshold
pub fn filter_memories(
    records: &[MemoryRecord],
    filter: &SearchFilter,
    use_fuzzy: bool,
) -> Vec<MemoryRecord> {
    filter_memories_with_threshold(records, filter, use_fuzzy, DEFAULT_FUZZY_THRESHOLD)
}

/// Filter records, fuzzy-matching query terms at `threshold` when `use_fuzzy`
pub fn filter_memories_with_threshold(
    records: &[MemoryRecord],
    filter: &SearchFilter,
    use_fuzzy: bool,
    threshold: f64,
) -> Vec<MemoryRecord> {
    let query = parse_query(&filter.query);
    let matcher = TermMatcher {
        use_fuzzy,
        threshold,
    };

    let results: Vec<MemoryRecord> = records
        .iter()
        .filter(|r| passes_structural(r, filter))
        .filter(|r| query.is_empty() || matches_query(r, &query, filter.search_in, &matcher))
        .cloned()
        .collect();

    debug!(
        input = records.len(),
        output = results.len(),
        fuzzy = use_fuzzy,
        "filtered records"
    );

    results
}

/// Stages 1-6: every constraint that does not look at text
fn passes_structural(record: &MemoryRecord, filter: &SearchFilter) -> bool {
    if !filter.types.is_empty() && !filter.types.contains(&record.record_type) {
        return false;
    }

    if filter.exclude_types.contains(&record.record_type) {
        return false;
    }

    if !filter.tags.is_empty() && !record.tags.iter().any(|t| filter.tags.contains(t)) {
        return false;
    }

    if filter.date_from.is_some_and(|from| record.created_at < from) {
        return false;
    }
    if filter.date_to.is_some_and(|to| record.created_at > to) {
        return false;
    }

    if !in_list(filter.status.as_deref(), record.status.as_deref())
        || !in_list(filter.priority.as_deref(), record.priority.as_deref())
        || !in_list(filter.sentiment.as_deref(), record.sentiment.as_deref())
    {
        return false;
    }

    if let Some(wanted) = filter.has_relationships {
        if record.has_relationships() != wanted {
            return false;
        }
    }

    true
}

/// An absent or empty include-list accepts anything; otherwise the value must be listed
fn in_list(allowed: Option<&[String]>, value: Option<&str>) -> bool {
    match allowed {
        None => true,
        Some([]) => true,
        Some(allowed) => value.is_some_and(|v| allowed.iter().any(|a| a == v)),
    }
}

/// The lowercased text the query is matched against
pub fn searchable_text(record: &MemoryRecord, search_in: SearchIn) -> String {
    match search_in {
        SearchIn::Title => record.title.to_lowercase(),
        SearchIn::Content => record.content.to_lowercase(),
        SearchIn::All => {
            let mut text = String::with_capacity(
                record.title.len() + record.content.len() + record.tags.len() * 8 + 2,
            );
            text.push_str(&record.title);
            text.push('\n');
            text.push_str(&record.content);
            for tag in &record.tags {
                text.push('\n');
                text.push_str(tag);
            }
            text.to_lowercase()
        }
    }
}

struct TermMatcher {
    use_fuzzy: bool,
    threshold: f64,
}

impl TermMatcher {
    /// `text` is already lowercased
    fn matches(&self, term: &str, text: &str) -> bool {
        if self.use_fuzzy {
            fuzzy_match_words(term, text, self.threshold)
        } else {
            text.contains(&term.to_lowercase())
        }
    }
}

/// Stage 7: the boolean text query
fn matches_query(
    record: &MemoryRecord,
    query: &BooleanQuery,
    search_in: SearchIn,
    matcher: &TermMatcher,
) -> bool {
    let text = searchable_text(record, search_in);

    // Exclusions and phrases are always literal
    if query
        .excluded
        .iter()
        .any(|term| text.contains(&term.to_lowercase()))
    {
        return false;
    }

    if !query
        .exact
        .iter()
        .all(|phrase| text.contains(&phrase.to_lowercase()))
    {
        return false;
    }

    if !query.required.iter().all(|term| matcher.matches(term, &text)) {
        return false;
    }

    query.optional.is_empty() || query.optional.iter().any(|term| matcher.matches(term, &text))
}
