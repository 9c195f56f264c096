//! Near-duplicate detection
//!
//! Pairwise similarity of normalized titles against each cluster head. O(n²),
//! which is fine for personal-scale record sets.

use std::collections::HashSet;

use tracing::debug;

use super::fuzzy::{clamp_threshold, similarity};
use crate::types::{DuplicateCluster, MemoryRecord};

/// Default title similarity for two records to count as duplicates
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.85;

/// Lowercase, drop punctuation and collapse whitespace
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cluster records whose normalized titles are at least `threshold` similar
///
/// Scans in input order; the first unclaimed record becomes a head and
/// claims every later unclaimed match. A record is in at most one cluster
/// and records without matches are left out. Blank titles never match.
/// Containment alone is not a match: "plan" and "project plan" stay apart.
pub fn find_duplicates(records: &[MemoryRecord], threshold: f64) -> Vec<DuplicateCluster> {
    let titles: Vec<String> = records.iter().map(|r| normalize_title(&r.title)).collect();
    let threshold = clamp_threshold(threshold);
    let mut processed: HashSet<usize> = HashSet::new();
    let mut clusters = Vec::new();

    for i in 0..records.len() {
        if processed.contains(&i) || titles[i].is_empty() {
            continue;
        }

        let mut members = Vec::new();
        for j in (i + 1)..records.len() {
            if processed.contains(&j) || titles[j].is_empty() {
                continue;
            }
            if similarity(&titles[i], &titles[j]) >= threshold {
                processed.insert(j);
                members.push(records[j].clone());
            }
        }

        if !members.is_empty() {
            processed.insert(i);
            clusters.push(DuplicateCluster {
                head: records[i].clone(),
                members,
            });
        }
    }

    debug!(
        records = records.len(),
        clusters = clusters.len(),
        "duplicate scan complete"
    );

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(id: &str, title: &str) -> MemoryRecord {
        MemoryRecord::new(id, "Note", title, 0)
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Meeting: with   JOHN!! "), "meeting with john");
        assert_eq!(normalize_title("!!!"), "");
    }

    #[test]
    fn test_near_duplicate_titles_cluster() {
        let records = vec![
            titled("1", "Meeting with John"),
            titled("2", "Meeting with Jon"),
            titled("3", "Dentist appointment"),
        ];
        let clusters = find_duplicates(&records, DEFAULT_DUPLICATE_THRESHOLD);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].ids(), vec!["1", "2"]);
    }

    #[test]
    fn test_first_match_wins() {
        let records = vec![
            titled("a", "weekly review"),
            titled("b", "weekly reviews"),
            titled("c", "weekly review"),
            titled("d", "Grocery list"),
            titled("e", "grocery list."),
        ];
        let clusters = find_duplicates(&records, DEFAULT_DUPLICATE_THRESHOLD);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].ids(), vec!["a", "b", "c"]);
        assert_eq!(clusters[1].ids(), vec!["d", "e"]);

        let mut seen = HashSet::new();
        for cluster in &clusters {
            for id in cluster.ids() {
                assert!(seen.insert(id), "{} in two clusters", id);
            }
        }
    }

    #[test]
    fn test_contained_title_is_not_a_duplicate() {
        let forward = vec![titled("1", "Plan"), titled("2", "Project plan")];
        assert!(find_duplicates(&forward, DEFAULT_DUPLICATE_THRESHOLD).is_empty());

        let records = vec![
            titled("1", "Notes"),
            titled("2", "Meeting notes from Q3"),
            titled("3", "notes"),
        ];
        let clusters = find_duplicates(&records, DEFAULT_DUPLICATE_THRESHOLD);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].ids(), vec!["1", "3"]);

        let reversed: Vec<_> = forward.into_iter().rev().collect();
        assert!(find_duplicates(&reversed, DEFAULT_DUPLICATE_THRESHOLD).is_empty());
    }

    #[test]
    fn test_blank_titles_ignored() {
        let records = vec![titled("1", ""), titled("2", "???"), titled("3", "notes")];
        assert!(find_duplicates(&records, DEFAULT_DUPLICATE_THRESHOLD).is_empty());
    }

    #[test]
    fn test_threshold_clamped() {
        let records = vec![titled("1", "alpha"), titled("2", "omega")];
        assert!(find_duplicates(&records, 2.0).is_empty());
        assert_eq!(find_duplicates(&records, -1.0).len(), 1);
    }

    #[test]
    fn test_no_records() {
        assert!(find_duplicates(&[], DEFAULT_DUPLICATE_THRESHOLD).is_empty());
    }
}
