//! Property-based tests for memoria
//!
//! These tests verify invariants that must hold for all inputs:
//! - Filtering with the default filter is the identity
//! - Sorting is idempotent and stable
//! - Time arithmetic never overflows
//! - Fuzzy similarity is reflexive and symmetric
//! - Grouping and clustering never lose or duplicate records
//! - Parsers never panic
//!
//! Run with: cargo test --test property_tests

use std::collections::HashSet;

use proptest::prelude::*;

use memoria::search::*;
use memoria::types::*;

const NOW: Timestamp = 1_749_988_800_000;

fn arb_record(index: usize) -> impl Strategy<Value = MemoryRecord> {
    (
        prop::sample::select(vec!["Note", "Task", "Goal", "Person"]),
        "[a-zA-Z ]{0,16}",
        "[a-z ]{0,40}",
        prop::collection::vec(prop::sample::select(vec!["work", "home", "idea", "urgent"]), 0..4),
        0i64..(400 * DAY_MS),
        prop::option::of(prop::sample::select(vec!["open", "done"])),
        prop::option::of(prop::collection::vec("[a-z]{1,4}", 0..3)),
    )
        .prop_map(
            move |(record_type, title, content, tags, age, status, related)| MemoryRecord {
                id: format!("r{:04}", index),
                record_type: record_type.to_string(),
                title,
                content,
                created_at: NOW - age,
                updated_at: None,
                tags: tags.into_iter().map(String::from).collect(),
                status: status.map(String::from),
                priority: None,
                sentiment: None,
                metadata: Default::default(),
                related_ids: related,
            },
        )
}

fn arb_records() -> impl Strategy<Value = Vec<MemoryRecord>> {
    (0usize..30).prop_flat_map(|n| (0..n).map(arb_record).collect::<Vec<_>>())
}

fn ids(records: &[MemoryRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

// ============================================================================
// FILTER TESTS
// ============================================================================

mod filter_tests {
    use super::*;

    proptest! {
        /// Invariant: the default filter keeps every record, in order
        #[test]
        fn default_filter_is_identity(records in arb_records(), fuzzy in any::<bool>()) {
            prop_assert_eq!(filter_memories(&records, &SearchFilter::default(), fuzzy), records);
        }

        /// Invariant: a type include-list only lets those types through
        #[test]
        fn type_filter_is_subset(
            records in arb_records(),
            types in prop::collection::vec(prop::sample::select(vec!["Note", "Task", "Goal"]), 1..3),
        ) {
            let filter = SearchFilter::with_types(types.iter().copied());
            let out = filter_memories(&records, &filter, false);
            prop_assert!(out.len() <= records.len());
            for record in &out {
                prop_assert!(types.contains(&record.record_type.as_str()));
            }
        }

        /// Invariant: filtered output is a subsequence of the input
        #[test]
        fn filter_preserves_order(records in arb_records(), query in "[a-z+\\- \"]{0,12}") {
            let out = filter_memories(&records, &SearchFilter::with_query(query), true);
            let mut remaining = records.iter();
            for record in &out {
                prop_assert!(remaining.any(|r| r.id == record.id));
            }
        }
    }
}

// ============================================================================
// SORT TESTS
// ============================================================================

mod sort_tests {
    use super::*;

    proptest! {
        /// Invariant: sorting an already sorted list changes nothing
        #[test]
        fn sort_is_idempotent(records in arb_records(), query in "[a-z]{0,3}") {
            for &key in SortKey::all() {
                let once = sort_memories(&records, key, Some(&query), NOW);
                let twice = sort_memories(&once, key, Some(&query), NOW);
                prop_assert_eq!(ids(&once), ids(&twice), "key {:?}", key);
            }
        }

        /// Invariant: records with equal timestamps keep their input order
        #[test]
        fn date_sort_is_stable(
            stamps in prop::collection::vec(0i64..4, 0..30),
        ) {
            let records: Vec<MemoryRecord> = stamps
                .iter()
                .enumerate()
                .map(|(i, &t)| MemoryRecord::new(format!("r{:04}", i), "Note", "t", t))
                .collect();

            for key in [SortKey::DateDesc, SortKey::DateAsc, SortKey::Type, SortKey::Title] {
                let sorted = sort_memories(&records, key, None, NOW);
                for pair in sorted.windows(2) {
                    if pair[0].created_at == pair[1].created_at {
                        prop_assert!(pair[0].id < pair[1].id, "key {:?}", key);
                    }
                }
            }
        }

        /// Invariant: records that tie on title, type or score keep their
        /// input order
        #[test]
        fn ties_keep_input_order(
            specs in prop::collection::vec(
                (
                    prop::sample::select(vec!["Plan", "plan", "Notes"]),
                    prop::sample::select(vec!["Note", "Task"]),
                    0i64..3,
                ),
                0..30,
            ),
            query in prop::sample::select(vec!["plan", "note", "zzz"]),
        ) {
            let records: Vec<MemoryRecord> = specs
                .iter()
                .enumerate()
                .map(|(i, &(title, record_type, age_step))| {
                    MemoryRecord::new(format!("r{:04}", i), record_type, title, NOW - age_step * 20 * DAY_MS)
                })
                .collect();
            let ranker = Ranker::new();

            for key in [SortKey::Title, SortKey::Type, SortKey::Relevance] {
                let sorted = sort_memories(&records, key, Some(query), NOW);
                for pair in sorted.windows(2) {
                    let (a, b) = (&pair[0], &pair[1]);
                    let tied = match key {
                        SortKey::Title => a.title == b.title,
                        SortKey::Type => a.record_type == b.record_type && a.created_at == b.created_at,
                        _ => ranker.score(a, query, NOW) == ranker.score(b, query, NOW),
                    };
                    if tied {
                        prop_assert!(a.id < b.id, "key {:?}: {} before {}", key, a.id, b.id);
                    }
                }
            }
        }

        /// Invariant: any timestamp and any `now` are handled without overflow
        #[test]
        fn extreme_timestamps_never_panic(
            stamps in prop::collection::vec(any::<i64>(), 0..20),
            now in any::<i64>(),
        ) {
            let records: Vec<MemoryRecord> = stamps
                .iter()
                .enumerate()
                .map(|(i, &t)| MemoryRecord::new(format!("r{:04}", i), "Note", "plan", t))
                .collect();

            let stats = calculate_stats(&records, now);
            prop_assert_eq!(stats.total, records.len());

            let groups = group_memories(&records, GroupKey::Date, now);
            let total: usize = groups.iter().map(|(_, members)| members.len()).sum();
            prop_assert_eq!(total, records.len());

            let sorted = sort_memories(&records, SortKey::Relevance, Some("plan"), now);
            prop_assert_eq!(sorted.len(), records.len());
        }

        /// Invariant: sorting is a permutation
        #[test]
        fn sort_keeps_every_record(records in arb_records()) {
            for &key in SortKey::all() {
                let mut sorted: Vec<String> = sort_memories(&records, key, Some("a"), NOW)
                    .into_iter()
                    .map(|r| r.id)
                    .collect();
                let mut original: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
                sorted.sort();
                original.sort();
                prop_assert_eq!(sorted, original);
            }
        }
    }
}

// ============================================================================
// FUZZY MATCH TESTS
// ============================================================================

mod fuzzy_tests {
    use super::*;

    proptest! {
        /// Invariant: every non-empty string matches itself
        #[test]
        fn fuzzy_is_reflexive(s in "\\PC{1,40}") {
            prop_assert!(fuzzy_match(&s, &s, DEFAULT_FUZZY_THRESHOLD));
        }

        /// Invariant: similarity does not depend on argument order
        #[test]
        fn similarity_is_symmetric(a in "\\PC{0,24}", b in "\\PC{0,24}") {
            prop_assert_eq!(similarity(&a, &b), similarity(&b, &a));
        }

        /// Invariant: similarity stays within [0, 1]
        #[test]
        fn similarity_is_bounded(a in "\\PC{0,24}", b in "\\PC{0,24}") {
            let s = similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        /// Invariant: out-of-range thresholds never panic
        #[test]
        fn any_threshold_is_accepted(a in "[a-z]{0,8}", b in "[a-z]{0,8}", t in any::<f64>()) {
            let _ = fuzzy_match(&a, &b, t);
        }
    }
}

// ============================================================================
// GROUPING AND CLUSTERING TESTS
// ============================================================================

mod group_tests {
    use super::*;

    proptest! {
        /// Invariant: a record with N distinct tags appears in exactly N tag
        /// buckets, untagged records land in "Untagged" once
        #[test]
        fn tag_grouping_multiplicity(records in arb_records()) {
            let groups = group_memories(&records, GroupKey::Tags, NOW);

            for record in &records {
                let appearances = groups
                    .iter()
                    .filter(|(_, members)| members.iter().any(|m| m.id == record.id))
                    .count();
                let distinct: HashSet<&String> = record.tags.iter().collect();
                let expected = distinct.len().max(1);
                prop_assert_eq!(appearances, expected, "record {}", record.id);
            }
        }

        /// Invariant: single-membership groupings partition the input
        #[test]
        fn grouping_partitions(records in arb_records()) {
            for key in [GroupKey::None, GroupKey::Type, GroupKey::Date, GroupKey::Status, GroupKey::Priority] {
                let groups = group_memories(&records, key, NOW);
                let total: usize = groups.iter().map(|(_, members)| members.len()).sum();
                prop_assert_eq!(total, records.len(), "key {:?}", key);
            }
        }

        /// Invariant: no record appears in two duplicate clusters
        #[test]
        fn clusters_are_disjoint(
            titles in prop::collection::vec("(meeting|report|plan)( [a-z]{0,3})?", 0..25),
            threshold in 0.0f64..=1.0,
        ) {
            let records: Vec<MemoryRecord> = titles
                .iter()
                .enumerate()
                .map(|(i, t)| MemoryRecord::new(i.to_string(), "Note", t.as_str(), 0))
                .collect();

            let mut seen = HashSet::new();
            for cluster in find_duplicates(&records, threshold) {
                prop_assert!(!cluster.members.is_empty());
                for id in cluster.ids() {
                    prop_assert!(seen.insert(id.to_string()), "{} in two clusters", id);
                }
            }
        }
    }
}

// ============================================================================
// PARSER TESTS
// ============================================================================

mod parser_tests {
    use super::*;

    proptest! {
        /// Invariant: parse_query never panics on any string input
        #[test]
        fn parse_never_panics(s in ".*") {
            let _ = parse_query(&s);
        }

        /// Invariant: operator words are never emitted as terms
        #[test]
        fn operators_never_terms(
            words in prop::collection::vec(
                prop::sample::select(vec!["AND", "OR", "NOT", "alpha", "+beta", "-gamma", "\"d e\""]),
                0..10,
            ),
        ) {
            let q = parse_query(&words.join(" "));
            for term in q.required.iter().chain(&q.optional).chain(&q.excluded) {
                prop_assert!(!matches!(term.as_str(), "AND" | "OR" | "NOT"));
            }
        }

        /// Invariant: highlighting with empty markers leaves text unchanged
        #[test]
        fn highlight_preserves_text(text in "\\PC{0,60}", query in "\\PC{0,20}") {
            prop_assert_eq!(highlight(&text, &query, "", ""), text);
        }
    }
}
