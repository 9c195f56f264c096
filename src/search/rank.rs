//! Result ranking
//!
//! Every sort key is a total order applied through a single stable sort, so
//! records with equal keys keep their input order and re-sorting is a no-op.
//!
//! Relevance is a heuristic integer score:
//! - exact title match, else title substring
//! - occurrences of the query in the content
//! - tags containing the query
//! - type label containing the query
//! - recency bonus for records from the last week / month

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::{MemoryRecord, SortKey, Timestamp, DAY_MS};

/// Tunable weights for the relevance score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceWeights {
    /// Title equals the query (ignoring case)
    pub title_exact: i64,
    /// Title contains the query; not added on an exact match
    pub title_contains: i64,
    /// Per occurrence of the query in the content
    pub content_occurrence: i64,
    /// Per tag containing the query
    pub tag_match: i64,
    /// Type label contains the query
    pub type_match: i64,
    /// Created less than `recent_days` ago
    pub recent: i64,
    /// Created less than `month_days` ago (and not within `recent_days`)
    pub this_month: i64,
    pub recent_days: i64,
    pub month_days: i64,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            title_exact: 100,
            title_contains: 50,
            content_occurrence: 5,
            tag_match: 10,
            type_match: 15,
            recent: 10,
            this_month: 5,
            recent_days: 7,
            month_days: 30,
        }
    }
}

/// Sorts records by any [`SortKey`]
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    weights: RelevanceWeights,
}

impl Ranker {
    /// Create a ranker with the default weights
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ranker with custom weights
    pub fn with_weights(weights: RelevanceWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RelevanceWeights {
        &self.weights
    }

    /// Relevance score of one record against a query
    ///
    /// The query is matched as a whole, ignoring case. A blank query scores
    /// only the recency bonus.
    pub fn score(&self, record: &MemoryRecord, query: &str, now: Timestamp) -> i64 {
        let w = &self.weights;
        let query = query.trim().to_lowercase();
        let mut score: i64 = 0;

        if !query.is_empty() {
            let title = record.title.to_lowercase();
            if title == query {
                score = score.saturating_add(w.title_exact);
            } else if title.contains(&query) {
                score = score.saturating_add(w.title_contains);
            }

            let occurrences = record.content.to_lowercase().matches(&query).count() as i64;
            score = score.saturating_add(occurrences.saturating_mul(w.content_occurrence));

            let tag_hits = record
                .tags
                .iter()
                .filter(|t| t.to_lowercase().contains(&query))
                .count() as i64;
            score = score.saturating_add(tag_hits.saturating_mul(w.tag_match));

            if record.record_type.to_lowercase().contains(&query) {
                score = score.saturating_add(w.type_match);
            }
        }

        // Saturate so far-off timestamps and huge windows cannot overflow
        let age = now.saturating_sub(record.created_at);
        if age < w.recent_days.saturating_mul(DAY_MS) {
            score = score.saturating_add(w.recent);
        } else if age < w.month_days.saturating_mul(DAY_MS) {
            score = score.saturating_add(w.this_month);
        }

        score
    }

    /// Sort a copy of `records` by `key`
    ///
    /// `Relevance` needs a non-blank `query`; without one it sorts newest first.
    pub fn sort(
        &self,
        records: &[MemoryRecord],
        key: SortKey,
        query: Option<&str>,
        now: Timestamp,
    ) -> Vec<MemoryRecord> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        match (key, query) {
            (SortKey::Relevance, Some(query)) => self.sort_by_relevance(records, query, now),
            (SortKey::Relevance, None) | (SortKey::DateDesc, _) => {
                sorted_by(records, |a, b| b.created_at.cmp(&a.created_at))
            }
            (SortKey::DateAsc, _) => sorted_by(records, |a, b| a.created_at.cmp(&b.created_at)),
            (SortKey::Title, _) => {
                let mut keyed: Vec<(String, &MemoryRecord)> = records
                    .iter()
                    .map(|r| (r.title.to_lowercase(), r))
                    .collect();
                keyed.sort_by(|(ka, a), (kb, b)| ka.cmp(kb).then_with(|| a.title.cmp(&b.title)));
                keyed.into_iter().map(|(_, r)| r.clone()).collect()
            }
            (SortKey::Type, _) => sorted_by(records, |a, b| {
                a.record_type
                    .cmp(&b.record_type)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
        }
    }

    fn sort_by_relevance(
        &self,
        records: &[MemoryRecord],
        query: &str,
        now: Timestamp,
    ) -> Vec<MemoryRecord> {
        let mut scored: Vec<(i64, &MemoryRecord)> = records
            .iter()
            .map(|r| (self.score(r, query, now), r))
            .collect();

        // Stable: ties keep input order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        if let Some((top, record)) = scored.first() {
            trace!(top_score = top, top_id = %record.id, "relevance ranking");
        }

        scored.into_iter().map(|(_, r)| r.clone()).collect()
    }
}

fn sorted_by<F>(records: &[MemoryRecord], compare: F) -> Vec<MemoryRecord>
where
    F: FnMut(&MemoryRecord, &MemoryRecord) -> Ordering,
{
    let mut sorted = records.to_vec();
    sorted.sort_by(compare);
    sorted
}

/// Sort records with the default weights
pub fn sort_memories(
    records: &[MemoryRecord],
    key: SortKey,
    query: Option<&str>,
    now: Timestamp,
) -> Vec<MemoryRecord> {
    Ranker::new().sort(records, key, query, now)
}

/// Relevance score with the default weights
pub fn relevance_score(record: &MemoryRecord, query: &str, now: Timestamp) -> i64 {
    Ranker::new().score(record, query, now)
}
