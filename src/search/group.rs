//! Grouping ranked results into named buckets
//!
//! Bucket order is deterministic: first-seen for value-based keys, a fixed
//! sequence for dates. Within a bucket records keep their ranked order.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::{GroupKey, MemoryRecord, Timestamp, DAY_MS};

pub const ALL_RESULTS: &str = "All Results";
pub const UNTAGGED: &str = "Untagged";
pub const NO_STATUS: &str = "No Status";
pub const NO_PRIORITY: &str = "No Priority";

/// Buckets in display order
///
/// Keeps an explicit key list next to the bucket map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedResults {
    order: Vec<String>,
    buckets: HashMap<String, Vec<MemoryRecord>>,
}

impl GroupedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to `bucket`, creating the bucket at the end if new
    pub fn push(&mut self, bucket: &str, record: MemoryRecord) {
        match self.buckets.get_mut(bucket) {
            Some(records) => records.push(record),
            None => {
                self.order.push(bucket.to_string());
                self.buckets.insert(bucket.to_string(), vec![record]);
            }
        }
    }

    pub fn get(&self, bucket: &str) -> Option<&[MemoryRecord]> {
        self.buckets.get(bucket).map(Vec::as_slice)
    }

    /// Bucket names in display order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// `(name, records)` pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[MemoryRecord])> {
        self.order
            .iter()
            .map(|k| (k.as_str(), self.buckets[k].as_slice()))
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Consume into ordered `(name, records)` pairs
    pub fn into_vec(mut self) -> Vec<(String, Vec<MemoryRecord>)> {
        self.order
            .into_iter()
            .map(|k| {
                let records = self.buckets.remove(&k).unwrap_or_default();
                (k, records)
            })
            .collect()
    }
}

impl Serialize for GroupedResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for (name, records) in self.iter() {
            map.serialize_entry(name, records)?;
        }
        map.end()
    }
}

/// Relative-date buckets, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateBucket {
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
    LastThreeMonths,
    ThisYear,
    /// Older records by calendar year (UTC), newest year first
    Year(Reverse<i32>),
}

impl DateBucket {
    /// Bucket for a record created at `created_at`, by time elapsed until `now`
    pub fn classify(created_at: Timestamp, now: Timestamp) -> Self {
        let age = now.saturating_sub(created_at);

        if age < DAY_MS {
            DateBucket::Today
        } else if age < 2 * DAY_MS {
            DateBucket::Yesterday
        } else if age < 7 * DAY_MS {
            DateBucket::ThisWeek
        } else if age < 30 * DAY_MS {
            DateBucket::ThisMonth
        } else if age < 90 * DAY_MS {
            DateBucket::LastThreeMonths
        } else if age < 365 * DAY_MS {
            DateBucket::ThisYear
        } else {
            DateBucket::Year(Reverse(calendar_year(created_at)))
        }
    }

    pub fn label(&self) -> String {
        match self {
            DateBucket::Today => "Today".to_string(),
            DateBucket::Yesterday => "Yesterday".to_string(),
            DateBucket::ThisWeek => "This Week".to_string(),
            DateBucket::ThisMonth => "This Month".to_string(),
            DateBucket::LastThreeMonths => "Last 3 Months".to_string(),
            DateBucket::ThisYear => "This Year".to_string(),
            DateBucket::Year(Reverse(year)) => year.to_string(),
        }
    }
}

/// UTC calendar year; timestamps beyond the calendar's range land in its first or last year
fn calendar_year(ts: Timestamp) -> i32 {
    match DateTime::from_timestamp_millis(ts) {
        Some(d) => d.year(),
        None if ts < 0 => NaiveDate::MIN.year(),
        None => NaiveDate::MAX.year(),
    }
}

/// Partition ranked records into buckets keyed by `group_key`
///
/// `now` anchors the `Date` buckets and is ignored otherwise. Empty input
/// yields no buckets.
pub fn group_memories(records: &[MemoryRecord], group_key: GroupKey, now: Timestamp) -> GroupedResults {
    let mut groups = GroupedResults::new();

    match group_key {
        GroupKey::None => {
            for record in records {
                groups.push(ALL_RESULTS, record.clone());
            }
        }
        GroupKey::Type => {
            for record in records {
                groups.push(&record.record_type, record.clone());
            }
        }
        GroupKey::Status => {
            for record in records {
                groups.push(record.status.as_deref().unwrap_or(NO_STATUS), record.clone());
            }
        }
        GroupKey::Priority => {
            for record in records {
                groups.push(
                    record.priority.as_deref().unwrap_or(NO_PRIORITY),
                    record.clone(),
                );
            }
        }
        GroupKey::Tags => {
            for record in records {
                if record.tags.is_empty() {
                    groups.push(UNTAGGED, record.clone());
                    continue;
                }
                // A repeated tag must not place the record twice in one bucket
                let mut seen: Vec<&str> = Vec::with_capacity(record.tags.len());
                for tag in &record.tags {
                    if !seen.contains(&tag.as_str()) {
                        seen.push(tag);
                        groups.push(tag, record.clone());
                    }
                }
            }
        }
        GroupKey::Date => {
            let mut classified: Vec<(DateBucket, &MemoryRecord)> = records
                .iter()
                .map(|r| (DateBucket::classify(r.created_at, now), r))
                .collect();
            // Stable, so ranked order survives inside each bucket
            classified.sort_by_key(|(bucket, _)| *bucket);
            for (bucket, record) in classified {
                groups.push(&bucket.label(), record.clone());
            }
        }
    }

    groups
}
