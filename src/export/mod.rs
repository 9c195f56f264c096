//! Lossless export and import of records
//!
//! Every [`MemoryRecord`] field survives a round trip through each format:
//! integer timestamps, tag order, absent optionals, metadata values and
//! related ids.

mod csv;
mod json;
mod markdown;

pub use self::csv::{from_csv, to_csv, CSV_HEADER};
pub use self::json::{from_json, to_json};
pub use self::markdown::{from_markdown, to_markdown};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::MemoryRecord;

/// Supported interchange formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "markdown",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }

    pub fn all() -> &'static [ExportFormat] {
        &[ExportFormat::Json, ExportFormat::Csv, ExportFormat::Markdown]
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// Serialize records in `format`
pub fn export(records: &[MemoryRecord], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(records),
        ExportFormat::Csv => to_csv(records),
        ExportFormat::Markdown => to_markdown(records),
    }
}

/// Parse records previously written by [`export`]
pub fn import(input: &str, format: ExportFormat) -> Result<Vec<MemoryRecord>> {
    match format {
        ExportFormat::Json => from_json(input),
        ExportFormat::Csv => from_csv(input),
        ExportFormat::Markdown => from_markdown(input),
    }
}
