//! Performance benchmarks for the search pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memoria::search::{
    calculate_stats, execute_search, find_duplicates, fuzzy_match, group_memories, levenshtein,
    sort_memories, SearchConfig,
};
use memoria::types::*;

const NOW: Timestamp = 1_749_988_800_000;

fn sample_records(count: usize) -> Vec<MemoryRecord> {
    let sample_titles = [
        "Authentication using JWT tokens and refresh mechanism",
        "Database migration strategy for PostgreSQL",
        "Weekly planning meeting with John",
        "Grocery list for the weekend",
        "Quarterly budget review",
        "Call the bank about the mortgage",
        "Reading notes on systems design",
        "Brand color palette refresh",
        "Gym routine and progress",
        "Rust ownership and borrowing concepts",
    ];
    let types = ["Note", "Task", "Journal entry", "Goal", "Calendar event"];
    let statuses = ["todo", "in-progress", "done"];

    (0..count)
        .map(|i| {
            let title = format!("{} {}", sample_titles[i % sample_titles.len()], i / 50);
            MemoryRecord::new(
                format!("r{}", i),
                types[i % types.len()],
                title,
                NOW - (i as i64 * 7 * 60 * 60 * 1000),
            )
            .with_content(format!(
                "{} - variation {} with additional context about daily life and work",
                sample_titles[(i * 7) % sample_titles.len()],
                i
            ))
            .with_tags([format!("topic{}", i % 5), "personal".to_string()])
            .with_status(statuses[i % statuses.len()])
        })
        .collect()
}

fn bench_execute_search(c: &mut Criterion) {
    let config = SearchConfig::default();
    let mut group = c.benchmark_group("execute_search");

    for size in [1000, 5000] {
        let records = sample_records(size);
        group.throughput(Throughput::Elements(size as u64));

        let queries = [
            ("plain", "budget"),
            ("boolean", "meeting -john +weekly"),
            ("phrase", "\"budget review\" OR mortgage"),
        ];
        for (name, query) in queries {
            let request = SearchRequest {
                filter: SearchFilter::with_query(query),
                sort: SortKey::Relevance,
                group: GroupKey::Type,
            };
            group.bench_with_input(
                BenchmarkId::new(name, size),
                &request,
                |b, request| b.iter(|| execute_search(black_box(&records), request, NOW, &config)),
            );
        }

        let fuzzy = SearchConfig {
            use_fuzzy: true,
            ..Default::default()
        };
        let request = SearchRequest {
            filter: SearchFilter::with_query("mortgaje"),
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("fuzzy", size), &request, |b, request| {
            b.iter(|| execute_search(black_box(&records), request, NOW, &fuzzy))
        });
    }

    group.finish();
}

fn bench_sort_and_group(c: &mut Criterion) {
    let records = sample_records(5000);
    let mut group = c.benchmark_group("sort_and_group");

    for &key in SortKey::all() {
        group.bench_with_input(BenchmarkId::new("sort", key.as_str()), &key, |b, &key| {
            b.iter(|| sort_memories(black_box(&records), key, Some("budget"), NOW))
        });
    }

    for key in [GroupKey::Date, GroupKey::Tags, GroupKey::Type] {
        group.bench_with_input(BenchmarkId::new("group", key.as_str()), &key, |b, &key| {
            b.iter(|| group_memories(black_box(&records), key, NOW))
        });
    }

    group.bench_function("stats", |b| {
        b.iter(|| calculate_stats(black_box(&records), NOW))
    });

    group.finish();
}

fn bench_fuzzy(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuzzy");

    let pairs = [
        ("short", "meetng", "meeting"),
        ("title", "Meeting with Jon", "Meeting with John"),
        (
            "long",
            "authentication using jwt tokens and refresh",
            "authentcation usng JWT token and refresh mechanism",
        ),
    ];
    for (name, a, b_text) in pairs {
        group.bench_function(BenchmarkId::new("levenshtein", name), |b| {
            b.iter(|| levenshtein(black_box(a), black_box(b_text)))
        });
        group.bench_function(BenchmarkId::new("fuzzy_match", name), |b| {
            b.iter(|| fuzzy_match(black_box(a), black_box(b_text), 0.7))
        });
    }

    group.finish();
}

fn bench_duplicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_duplicates");
    group.sample_size(20);

    for size in [250, 1000] {
        let records = sample_records(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| find_duplicates(black_box(records), 0.85))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_execute_search,
    bench_sort_and_group,
    bench_fuzzy,
    bench_duplicates
);
criterion_main!(benches);
