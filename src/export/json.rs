//! JSON export: a pretty-printed array of records

use crate::error::Result;
use crate::types::MemoryRecord;

pub fn to_json(records: &[MemoryRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn from_json(input: &str) -> Result<Vec<MemoryRecord>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(input)?)
}
