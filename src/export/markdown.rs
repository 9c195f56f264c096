//! Markdown export
//!
//! Each record becomes a section:
//!
//! ````text
//! ---
//! id: "r1"
//! type: "Task"
//! title: "Call the bank"
//! createdAt: 1718000000000
//! tags: ["finance"]
//! metadata: {}
//! ---
//!
//! ## Call the bank
//!
//! ```text
//! Ask about the mortgage rate.
//! ```
//! ````
//!
//! Header values are JSON, so every field keeps its exact type. The heading is
//! for readers only. Content sits inside a backtick fence longer than any
//! backtick run it contains, which makes the closing fence unambiguous.

use serde_json::{Map, Value};

use crate::error::{MemoriaError, Result};
use crate::types::MemoryRecord;

const FORMAT: &str = "markdown";

/// Header keys in output order; `content` lives in the fenced block
const HEADER_KEYS: [&str; 11] = [
    "id",
    "type",
    "title",
    "createdAt",
    "updatedAt",
    "tags",
    "status",
    "priority",
    "sentiment",
    "metadata",
    "relatedIds",
];

pub fn to_markdown(records: &[MemoryRecord]) -> Result<String> {
    let mut out = String::from("# Memoria export\n");

    for record in records {
        let value = serde_json::to_value(record)?;
        let fields = value
            .as_object()
            .ok_or_else(|| MemoriaError::Internal("record did not serialize to an object".into()))?;

        out.push_str("\n---\n");
        for key in HEADER_KEYS {
            if let Some(v) = fields.get(key) {
                out.push_str(key);
                out.push_str(": ");
                out.push_str(&serde_json::to_string(v)?);
                out.push('\n');
            }
        }
        out.push_str("---\n\n");

        out.push_str("## ");
        out.push_str(&heading(&record.title));
        out.push_str("\n\n");

        let fence = fence_for(&record.content);
        out.push_str(&fence);
        out.push_str("text\n");
        out.push_str(&record.content);
        out.push('\n');
        out.push_str(&fence);
        out.push('\n');
    }

    Ok(out)
}

fn heading(title: &str) -> String {
    let flat: String = title
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let flat = flat.trim();
    if flat.is_empty() {
        "(untitled)".to_string()
    } else {
        flat.to_string()
    }
}

/// A backtick fence strictly longer than any run in `content`, at least three
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

pub fn from_markdown(input: &str) -> Result<Vec<MemoryRecord>> {
    let mut records = Vec::new();
    let mut cursor = Cursor::new(input);

    while let Some(line) = cursor.next_line() {
        if line.trim_end() == "---" {
            records.push(read_record(&mut cursor)?);
        }
    }

    Ok(records)
}

fn read_record(cursor: &mut Cursor<'_>) -> Result<MemoryRecord> {
    let header_line = cursor.line;
    let mut fields = Map::new();

    loop {
        let line = cursor
            .next_line()
            .ok_or_else(|| MemoriaError::parse(FORMAT, header_line, "unterminated header"))?
            .trim_end_matches('\r');
        if line == "---" {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let (key, raw) = line.split_once(':').ok_or_else(|| {
            MemoriaError::parse(FORMAT, cursor.line, format!("expected `key: value`, got {:?}", line))
        })?;
        let value: Value = serde_json::from_str(raw.trim()).map_err(|e| {
            MemoriaError::parse(FORMAT, cursor.line, format!("{}: {}", key.trim(), e))
        })?;
        fields.insert(key.trim().to_string(), value);
    }

    let fence = loop {
        let line = cursor
            .next_line()
            .ok_or_else(|| MemoriaError::parse(FORMAT, header_line, "missing content block"))?;
        let ticks = line.chars().take_while(|&c| c == '`').count();
        if ticks >= 3 {
            break "`".repeat(ticks);
        }
        if line.trim_end() == "---" {
            return Err(MemoriaError::parse(
                FORMAT,
                cursor.line,
                "header without a content block",
            ));
        }
    };

    let content = cursor.take_until_fence(&fence).ok_or_else(|| {
        MemoriaError::parse(FORMAT, cursor.line, "unterminated content block")
    })?;
    fields.insert("content".to_string(), Value::String(content.to_string()));

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| MemoriaError::parse(FORMAT, header_line, e.to_string()))
}

/// Line reader that can also grab raw spans
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    /// 1-based number of the last line returned
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line: 0,
        }
    }

    fn next_line(&mut self) -> Option<&'a str> {
        if self.pos >= self.text.len() {
            return None;
        }
        let rest = &self.text[self.pos..];
        let (line, advance) = match rest.find('\n') {
            Some(i) => (&rest[..i], i + 1),
            None => (rest, rest.len()),
        };
        self.pos += advance;
        self.line += 1;
        Some(line)
    }

    /// Raw text up to the next `\n{fence}`; the cursor moves past the fence line
    fn take_until_fence(&mut self, fence: &str) -> Option<&'a str> {
        let closing = format!("\n{}", fence);
        let rest = &self.text[self.pos..];
        let end = rest.find(&closing)?;
        let content = &rest[..end];

        self.line += content.matches('\n').count() + 1;
        self.pos += end + 1;
        // Skip the closing fence line itself
        self.next_line();
        Some(content)
    }
}
