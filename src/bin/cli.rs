//! Memoria CLI
//!
//! Runs the search engine over a JSON file of records (or entities).

use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use memoria::config;
use memoria::entities::{normalize_entities, Entity};
use memoria::export::{export, import, ExportFormat};
use memoria::search::{
    calculate_stats, execute_search, find_duplicates, highlight, SearchConfig, SearchOutcome,
};
use memoria::types::*;
use memoria::MemoriaError;

#[derive(Parser)]
#[command(name = "memoria")]
#[command(about = "Search, group and deduplicate personal knowledge records")]
#[command(version)]
struct Cli {
    /// Records file (JSON array), `-` for stdin
    #[arg(long, short, env = "MEMORIA_RECORDS", default_value = "-", global = true)]
    records: String,

    /// Input is an array of tagged entities rather than records
    #[arg(long, global = true)]
    entities: bool,

    /// Current time in epoch milliseconds; defaults to the system clock
    #[arg(long, global = true)]
    now: Option<i64>,

    /// Config file (TOML)
    #[arg(long, env = "MEMORIA_CONFIG", global = true)]
    config: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter, rank and group records
    Search {
        /// Query text: words, "phrases", +required, -excluded, AND/OR/NOT
        #[arg(default_value = "")]
        query: String,
        /// Only these types (comma-separated)
        #[arg(short, long = "type", value_delimiter = ',')]
        types: Vec<String>,
        /// Drop these types (comma-separated)
        #[arg(long = "exclude-type", value_delimiter = ',')]
        exclude_types: Vec<String>,
        /// Require at least one of these tags (comma-separated)
        #[arg(short = 'T', long = "tag", value_delimiter = ',')]
        tags: Vec<String>,
        /// Created at or after (epoch ms or YYYY-MM-DD)
        #[arg(long, value_parser = parse_time)]
        from: Option<Timestamp>,
        /// Created at or before (epoch ms or YYYY-MM-DD, a date covers the whole day)
        #[arg(long, value_parser = parse_end_time)]
        to: Option<Timestamp>,
        /// Fields the query is matched against
        #[arg(long, default_value = "all")]
        search_in: SearchIn,
        #[arg(long, value_delimiter = ',')]
        status: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        priority: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        sentiment: Vec<String>,
        /// Keep only records with (true) or without (false) related ids
        #[arg(long)]
        has_relationships: Option<bool>,
        #[arg(short, long, default_value = "date-desc")]
        sort: SortKey,
        #[arg(short, long, default_value = "none")]
        group: GroupKey,
        /// Tolerate typos in query terms
        #[arg(short, long)]
        fuzzy: bool,
        /// Print at most this many results per group
        #[arg(short, long)]
        limit: Option<usize>,
        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show statistics
    Stats,
    /// List clusters of records with near-identical titles
    Duplicates {
        /// Minimum title similarity (0-1)
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Write records in an interchange format
    Export {
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,
        /// Output file (- for stdout)
        #[arg(short, long, default_value = "-")]
        output: String,
    },
    /// Read an export and print its records as JSON
    Import {
        /// Export file (- for stdin)
        input: String,
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,
    },
    /// Mark query matches inside a text
    Highlight {
        query: String,
        text: String,
        #[arg(long, default_value = "**")]
        open: String,
        #[arg(long, default_value = "**")]
        close: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<MemoriaError>()
                .map(MemoriaError::code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(false),
            )
            .init();
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let now = cli.now.unwrap_or_else(|| Utc::now().timestamp_millis());
    let settings = config::load_resolved(cli.config.as_deref()).context("loading config")?;

    match cli.command {
        Commands::Search {
            query,
            types,
            exclude_types,
            tags,
            from,
            to,
            search_in,
            status,
            priority,
            sentiment,
            has_relationships,
            sort,
            group,
            fuzzy,
            limit,
            json,
        } => {
            let records = load_records(&cli.records, cli.entities)?;
            let request = SearchRequest {
                filter: SearchFilter {
                    query,
                    types,
                    exclude_types,
                    tags,
                    date_from: from,
                    date_to: to,
                    search_in,
                    status: non_empty(status),
                    priority: non_empty(priority),
                    sentiment: non_empty(sentiment),
                    has_relationships,
                },
                sort,
                group,
            };
            let settings = SearchConfig {
                use_fuzzy: settings.use_fuzzy || fuzzy,
                ..settings
            };

            let outcome = execute_search(&records, &request, now, &settings);
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome, &request.filter.query, limit);
            }
        }

        Commands::Stats => {
            let records = load_records(&cli.records, cli.entities)?;
            let stats = calculate_stats(&records, now);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Duplicates { threshold } => {
            let records = load_records(&cli.records, cli.entities)?;
            let threshold = threshold.unwrap_or(settings.duplicate_threshold);
            let clusters = find_duplicates(&records, threshold);
            if clusters.is_empty() {
                println!("No duplicates at threshold {:.2}", threshold);
            }
            for cluster in &clusters {
                println!("{} ({} records)", cluster.head.title, cluster.len());
                for record in std::iter::once(&cluster.head).chain(&cluster.members) {
                    println!("  {} [{}] {}", record.id, record.record_type, record.title);
                }
            }
        }

        Commands::Export { format, output } => {
            let records = load_records(&cli.records, cli.entities)?;
            let content = export(&records, format)?;
            if output == "-" {
                print!("{}", content);
            } else {
                let path = shellexpand::tilde(&output).to_string();
                std::fs::write(&path, content).with_context(|| format!("writing {}", path))?;
                eprintln!("Exported {} records to {}", records.len(), path);
            }
        }

        Commands::Import { input, format } => {
            let text = read_input(&input)?;
            let records = import(&text, format)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }

        Commands::Highlight {
            query,
            text,
            open,
            close,
        } => {
            println!("{}", highlight(&text, &query, &open, &close));
        }
    }

    Ok(())
}

fn load_records(source: &str, entities: bool) -> anyhow::Result<Vec<MemoryRecord>> {
    let text = read_input(source)?;
    let records = if entities {
        let parsed: Vec<Entity> = serde_json::from_str(&text)
            .map_err(MemoriaError::from)
            .with_context(|| format!("parsing entities from {}", source))?;
        normalize_entities(parsed)
    } else {
        let parsed: Vec<MemoryRecord> = serde_json::from_str(&text)
            .map_err(MemoriaError::from)
            .with_context(|| format!("parsing records from {}", source))?;
        parsed
    };
    tracing::debug!(count = records.len(), source, "records loaded");
    Ok(records)
}

fn read_input(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(MemoriaError::from)
            .context("reading stdin")?;
        return Ok(text);
    }
    let path = shellexpand::tilde(source).to_string();
    std::fs::read_to_string(&path)
        .map_err(MemoriaError::from)
        .with_context(|| format!("reading {}", path))
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Epoch milliseconds, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS` (UTC)
fn parse_time(value: &str) -> anyhow::Result<Timestamp> {
    parse_bound(value, false)
}

/// Like [`parse_time`], but a bare date means the last millisecond of that day
fn parse_end_time(value: &str) -> anyhow::Result<Timestamp> {
    parse_bound(value, true)
}

fn parse_bound(value: &str, end_of_day: bool) -> anyhow::Result<Timestamp> {
    if let Ok(ms) = value.parse::<i64>() {
        return Ok(ms);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&dt).timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let dt = if end_of_day {
            date.and_hms_milli_opt(23, 59, 59, 999)
        } else {
            date.and_hms_opt(0, 0, 0)
        };
        if let Some(dt) = dt {
            return Ok(Utc.from_utc_datetime(&dt).timestamp_millis());
        }
    }
    bail!("expected epoch milliseconds or YYYY-MM-DD, got {:?}", value)
}

fn print_outcome(outcome: &SearchOutcome, query: &str, limit: Option<usize>) {
    println!("{} matching records", outcome.total);
    for (bucket, records) in outcome.groups.iter() {
        println!("\n{} ({})", bucket, records.len());
        for record in records.iter().take(limit.unwrap_or(usize::MAX)) {
            println!(
                "  {} [{}] {} - {}",
                record.id,
                record.record_type,
                highlight(&record.title, query, "*", "*"),
                truncate(&record.content, 60)
            );
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    let first_line = s.lines().next().unwrap_or(s);
    if first_line.chars().count() <= max {
        first_line.to_string()
    } else {
        let head: String = first_line.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
