//! Search engine for Memoria
//!
//! Implements:
//! - Boolean query parsing (quoted phrases, `+`/`-`, AND/OR/NOT)
//! - Fuzzy/typo-tolerant term matching
//! - Multi-dimensional filtering
//! - Relevance, date, title and type ranking
//! - Grouping into ordered buckets
//! - Aggregate statistics
//! - Near-duplicate detection
//! - Escaped match highlighting
//!
//! Everything here is a pure function of its arguments. "Now" is always
//! passed in by the caller.

mod dedup;
mod filter;
mod fuzzy;
mod group;
mod highlight;
mod query;
mod rank;
mod stats;

pub use dedup::*;
pub use filter::*;
pub use fuzzy::*;
pub use group::*;
pub use highlight::*;
pub use query::*;
pub use rank::*;
pub use stats::*;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{MemoryRecord, SavedQuery, SearchRequest, Timestamp};

/// Configuration for matching thresholds and ranking weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum similarity for a fuzzy term match (0-1)
    pub fuzzy_threshold: f64,
    /// Minimum title similarity for duplicate clustering (0-1)
    pub duplicate_threshold: f64,
    /// Fuzzy-match required and optional query terms
    pub use_fuzzy: bool,
    /// Relevance score weights
    pub weights: RelevanceWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            use_fuzzy: false,
            weights: RelevanceWeights::default(),
        }
    }
}

impl SearchConfig {
    /// Copy with both thresholds clamped into `[0, 1]`
    pub fn normalized(mut self) -> Self {
        self.fuzzy_threshold = clamp_threshold(self.fuzzy_threshold);
        self.duplicate_threshold = if self.duplicate_threshold.is_nan() {
            DEFAULT_DUPLICATE_THRESHOLD
        } else {
            self.duplicate_threshold.clamp(0.0, 1.0)
        };
        self
    }
}

/// Output of the filter → rank → group pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchOutcome {
    /// Filtered records in ranked order
    pub results: Vec<MemoryRecord>,
    pub groups: GroupedResults,
    pub total: usize,
}

/// Run filter, rank and group over `records`
pub fn execute_search(
    records: &[MemoryRecord],
    request: &SearchRequest,
    now: Timestamp,
    config: &SearchConfig,
) -> SearchOutcome {
    execute_with_ranker(
        records,
        request,
        now,
        config,
        &Ranker::with_weights(config.weights.clone()),
    )
}

/// Run a saved query, honouring its own ranking weights when it has them
pub fn execute_saved_query(
    records: &[MemoryRecord],
    saved: &SavedQuery,
    now: Timestamp,
    config: &SearchConfig,
) -> SearchOutcome {
    let weights = saved
        .weights
        .clone()
        .unwrap_or_else(|| config.weights.clone());
    execute_with_ranker(
        records,
        &saved.request(),
        now,
        config,
        &Ranker::with_weights(weights),
    )
}

fn execute_with_ranker(
    records: &[MemoryRecord],
    request: &SearchRequest,
    now: Timestamp,
    config: &SearchConfig,
    ranker: &Ranker,
) -> SearchOutcome {
    let filtered = filter_memories_with_threshold(
        records,
        &request.filter,
        config.use_fuzzy,
        config.fuzzy_threshold,
    );
    // Rank on what the user asked for, not on operators or exclusions
    let scoring_query = parse_query(&request.filter.query).positive_text();
    let ranked = ranker.sort(&filtered, request.sort, Some(&scoring_query), now);
    let groups = group_memories(&ranked, request.group, now);

    debug!(
        records = records.len(),
        results = ranked.len(),
        groups = groups.len(),
        sort = request.sort.as_str(),
        group = request.group.as_str(),
        "search executed"
    );

    SearchOutcome {
        total: ranked.len(),
        results: ranked,
        groups,
    }
}
