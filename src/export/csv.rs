//! CSV export (RFC 4180)
//!
//! One row per record under a fixed header. Text fields are always quoted;
//! an empty *unquoted* field means the optional value is absent, so `""`
//! (present but empty) and absent stay distinct. Tags, metadata and related
//! ids are JSON-encoded inside their cells.

use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;

use serde::de::DeserializeOwned;

use crate::error::{MemoriaError, Result};
use crate::types::{MemoryRecord, Timestamp};

pub const CSV_HEADER: [&str; 12] = [
    "id",
    "type",
    "title",
    "content",
    "createdAt",
    "updatedAt",
    "tags",
    "status",
    "priority",
    "sentiment",
    "metadata",
    "relatedIds",
];

const FORMAT: &str = "csv";

pub fn to_csv(records: &[MemoryRecord]) -> Result<String> {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for record in records {
        let cells = [
            quote(&record.id),
            quote(&record.record_type),
            quote(&record.title),
            quote(&record.content),
            record.created_at.to_string(),
            record.updated_at.map(|t| t.to_string()).unwrap_or_default(),
            quote(&serde_json::to_string(&record.tags)?),
            optional(record.status.as_deref()),
            optional(record.priority.as_deref()),
            optional(record.sentiment.as_deref()),
            quote(&serde_json::to_string(&record.metadata)?),
            match &record.related_ids {
                Some(ids) => quote(&serde_json::to_string(ids)?),
                None => String::new(),
            },
        ];
        out.push_str(&cells.join(","));
        out.push('\n');
    }

    Ok(out)
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn optional(value: Option<&str>) -> String {
    value.map(quote).unwrap_or_default()
}

pub fn from_csv(input: &str) -> Result<Vec<MemoryRecord>> {
    let mut rows = parse_rows(input)?.into_iter();

    let header = match rows.next() {
        Some(row) => row,
        None => return Ok(Vec::new()),
    };
    let names: Vec<&str> = header.fields.iter().map(|f| f.value.as_str()).collect();
    if names != CSV_HEADER {
        return Err(MemoriaError::parse(
            FORMAT,
            header.line,
            format!("unexpected header: {}", names.join(",")),
        ));
    }

    rows.map(|row| row.into_record()).collect()
}

#[derive(Debug)]
struct Field {
    value: String,
    quoted: bool,
}

impl Field {
    fn is_absent(&self) -> bool {
        !self.quoted && self.value.is_empty()
    }
}

#[derive(Debug)]
struct Row {
    line: usize,
    fields: Vec<Field>,
}

impl Row {
    fn into_record(self) -> Result<MemoryRecord> {
        let line = self.line;
        if self.fields.len() != CSV_HEADER.len() {
            return Err(MemoriaError::parse(
                FORMAT,
                line,
                format!(
                    "expected {} columns, found {}",
                    CSV_HEADER.len(),
                    self.fields.len()
                ),
            ));
        }

        let mut f = self.fields.into_iter();
        // Column order follows CSV_HEADER
        let mut next = || f.next().unwrap_or(Field {
            value: String::new(),
            quoted: false,
        });

        let id = next().value;
        let record_type = next().value;
        let title = next().value;
        let content = next().value;
        let created_at = parse_timestamp(&next().value, line, "createdAt")?;
        let updated = next();
        let updated_at = if updated.is_absent() {
            None
        } else {
            Some(parse_timestamp(&updated.value, line, "updatedAt")?)
        };
        let tags: Vec<String> = parse_json(&next().value, line, "tags")?;
        let status = optional_field(next());
        let priority = optional_field(next());
        let sentiment = optional_field(next());
        let metadata: BTreeMap<String, serde_json::Value> =
            parse_json(&next().value, line, "metadata")?;
        let related = next();
        let related_ids = if related.is_absent() {
            None
        } else {
            Some(parse_json(&related.value, line, "relatedIds")?)
        };

        Ok(MemoryRecord {
            id,
            record_type,
            title,
            content,
            created_at,
            updated_at,
            tags,
            status,
            priority,
            sentiment,
            metadata,
            related_ids,
        })
    }
}

fn optional_field(field: Field) -> Option<String> {
    if field.is_absent() {
        None
    } else {
        Some(field.value)
    }
}

fn parse_timestamp(value: &str, line: usize, column: &str) -> Result<Timestamp> {
    value.trim().parse().map_err(|_| {
        MemoriaError::parse(
            FORMAT,
            line,
            format!("{} is not an integer timestamp: {:?}", column, value),
        )
    })
}

fn parse_json<T: DeserializeOwned>(value: &str, line: usize, column: &str) -> Result<T> {
    serde_json::from_str(value)
        .map_err(|e| MemoriaError::parse(FORMAT, line, format!("{}: {}", column, e)))
}

fn parse_rows(input: &str) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;

    while chars.peek().is_some() {
        let row_line = line;
        let mut fields = Vec::new();

        loop {
            fields.push(read_field(&mut chars, &mut line)?);
            match chars.next() {
                Some(',') => continue,
                Some('\r') => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    line += 1;
                    break;
                }
                Some('\n') => {
                    line += 1;
                    break;
                }
                None => break,
                Some(c) => {
                    return Err(MemoriaError::parse(
                        FORMAT,
                        line,
                        format!("unexpected {:?} after quoted field", c),
                    ))
                }
            }
        }

        let blank = fields.len() == 1 && fields[0].is_absent();
        if !blank {
            rows.push(Row {
                line: row_line,
                fields,
            });
        }
    }

    Ok(rows)
}

fn read_field(chars: &mut Peekable<Chars<'_>>, line: &mut usize) -> Result<Field> {
    let mut value = String::new();

    if chars.peek() != Some(&'"') {
        while let Some(&c) = chars.peek() {
            if matches!(c, ',' | '\n' | '\r') {
                break;
            }
            value.push(c);
            chars.next();
        }
        return Ok(Field {
            value,
            quoted: false,
        });
    }

    let start_line = *line;
    chars.next();
    loop {
        match chars.next() {
            Some('"') => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    value.push('"');
                } else {
                    break;
                }
            }
            Some(c) => {
                if c == '\n' {
                    *line += 1;
                }
                value.push(c);
            }
            None => {
                return Err(MemoriaError::parse(
                    FORMAT,
                    start_line,
                    "unterminated quoted field",
                ))
            }
        }
    }

    Ok(Field {
        value,
        quoted: true,
    })
}
