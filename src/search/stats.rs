//! Aggregate statistics over a record set
//!
//! Counts by type and tag, recent-activity windows, average creation rate,
//! the busiest calendar day and the date range, all in one pass. Every
//! time-relative figure is measured from the caller's `now`.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{MemoryRecord, Timestamp, DAY_MS};

/// Records created within trailing windows ending at `now`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub last_24_hours: usize,
    pub last_7_days: usize,
    pub last_30_days: usize,
    pub last_365_days: usize,
}

/// The calendar day (UTC) with the most records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveDay {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: usize,
}

/// Aggregate statistics for a record set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_tag: BTreeMap<String, usize>,
    pub recent: RecentActivity,
    /// Records per elapsed day since the oldest one, two decimals
    pub average_per_day: f64,
    pub most_active_day: Option<ActiveDay>,
    /// Earliest `created_at`, 0 when empty
    pub oldest_memory: Timestamp,
    /// Latest `created_at`, 0 when empty
    pub newest_memory: Timestamp,
}

/// Calculate statistics for `records` relative to `now`
pub fn calculate_stats(records: &[MemoryRecord], now: Timestamp) -> MemoryStats {
    if records.is_empty() {
        return MemoryStats::default();
    }

    let mut stats = MemoryStats {
        oldest_memory: Timestamp::MAX,
        newest_memory: Timestamp::MIN,
        ..Default::default()
    };
    // day -> (count, first-seen position)
    let mut days: HashMap<NaiveDate, (usize, usize)> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        stats.total += 1;
        *stats.by_type.entry(record.record_type.clone()).or_insert(0) += 1;
        for tag in &record.tags {
            *stats.by_tag.entry(tag.clone()).or_insert(0) += 1;
        }

        let age = now.saturating_sub(record.created_at);
        if age < DAY_MS {
            stats.recent.last_24_hours += 1;
        }
        if age < 7 * DAY_MS {
            stats.recent.last_7_days += 1;
        }
        if age < 30 * DAY_MS {
            stats.recent.last_30_days += 1;
        }
        if age < 365 * DAY_MS {
            stats.recent.last_365_days += 1;
        }

        stats.oldest_memory = stats.oldest_memory.min(record.created_at);
        stats.newest_memory = stats.newest_memory.max(record.created_at);

        if let Some(day) = calendar_day(record.created_at) {
            days.entry(day).or_insert((0, index)).0 += 1;
        }
    }

    let elapsed_days = (now.saturating_sub(stats.oldest_memory) / DAY_MS).max(1);
    stats.average_per_day = round2(stats.total as f64 / elapsed_days as f64);

    stats.most_active_day = days
        .into_iter()
        // Highest count, then earliest first appearance
        .min_by(|(_, (ca, ia)), (_, (cb, ib))| cb.cmp(ca).then(ia.cmp(ib)))
        .map(|(day, (count, _))| ActiveDay {
            date: day.format("%Y-%m-%d").to_string(),
            count,
        });

    stats
}

fn calendar_day(ts: Timestamp) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(ts).map(|d| d.date_naive())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2025-06-15T12:00:00Z
    const NOW: Timestamp = 1_749_988_800_000;
    const HOUR_MS: i64 = 60 * 60 * 1000;

    fn at(id: &str, record_type: &str, created_at: Timestamp) -> MemoryRecord {
        MemoryRecord::new(id, record_type, id, created_at)
    }

    #[test]
    fn test_empty_stats() {
        let stats = calculate_stats(&[], NOW);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_per_day, 0.0);
        assert_eq!(stats.oldest_memory, 0);
        assert_eq!(stats.newest_memory, 0);
        assert!(stats.most_active_day.is_none());
    }

    #[test]
    fn test_counts() {
        let records = vec![
            at("1", "Task", NOW - HOUR_MS).with_tags(["work"]),
            at("2", "Task", NOW - 3 * DAY_MS).with_tags(["work", "home"]),
            at("3", "Goal", NOW - 40 * DAY_MS),
            at("4", "Note", NOW - 400 * DAY_MS),
        ];
        let stats = calculate_stats(&records, NOW);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.by_type["Task"], 2);
        assert_eq!(stats.by_tag["work"], 2);
        assert_eq!(stats.by_tag["home"], 1);
        assert_eq!(
            stats.recent,
            RecentActivity {
                last_24_hours: 1,
                last_7_days: 2,
                last_30_days: 2,
                last_365_days: 3,
            }
        );
        assert_eq!(stats.oldest_memory, NOW - 400 * DAY_MS);
        assert_eq!(stats.newest_memory, NOW - HOUR_MS);
        // 4 records over 400 days
        assert_eq!(stats.average_per_day, 0.01);
    }

    #[test]
    fn test_average_uses_at_least_one_day() {
        let records = vec![at("1", "Note", NOW - HOUR_MS), at("2", "Note", NOW)];
        assert_eq!(calculate_stats(&records, NOW).average_per_day, 2.0);
    }

    #[test]
    fn test_average_rounds_to_two_decimals() {
        let records: Vec<_> = (0..2).map(|i| at(&i.to_string(), "Note", NOW - 3 * DAY_MS)).collect();
        assert_eq!(calculate_stats(&records, NOW).average_per_day, 0.67);
    }

    #[test]
    fn test_most_active_day_ties_break_first_seen() {
        let records = vec![
            at("a", "Note", NOW - 5 * DAY_MS),
            at("b", "Note", NOW - HOUR_MS),
            at("c", "Note", NOW - 5 * DAY_MS),
            at("d", "Note", NOW - 2 * HOUR_MS),
        ];
        let day = calculate_stats(&records, NOW).most_active_day.unwrap();
        assert_eq!(day.date, "2025-06-10");
        assert_eq!(day.count, 2);
    }

    #[test]
    fn test_extreme_timestamps() {
        let records = vec![
            at("past", "Note", i64::MIN),
            at("future", "Note", i64::MAX),
            at("now", "Note", NOW),
        ];
        let stats = calculate_stats(&records, NOW);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.oldest_memory, i64::MIN);
        assert_eq!(stats.newest_memory, i64::MAX);
        // Future records count as recent
        assert_eq!(stats.recent.last_24_hours, 2);
        assert_eq!(stats.recent.last_365_days, 2);
        assert_eq!(stats.average_per_day, 0.0);
        // Only the in-range record has a calendar day
        assert_eq!(stats.most_active_day.unwrap().date, "2025-06-15");

        let stats = calculate_stats(&[at("past", "Note", i64::MIN)], i64::MAX);
        assert_eq!(stats.recent, RecentActivity::default());
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(calculate_stats(&[], NOW)).unwrap();
        assert_eq!(json["total"], 0);
        assert_eq!(json["averagePerDay"], 0.0);
        assert_eq!(json["oldestMemory"], 0);
        assert_eq!(json["newestMemory"], 0);
    }
}
