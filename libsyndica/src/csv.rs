//! Minimal CSV reading and writing for bulk import/export
//!
//! Quoted fields may contain commas, doubled quotes and newlines. Multi-valued
//! cells (platforms, account ids, hashtags) are comma-separated inside one
//! quoted field.

use std::collections::HashMap;

use crate::error::{Result, SyndicaError};
use crate::types::PlatformKind;

/// Required import columns. `platforms` and `accountIds` are comma-separated
/// and must have equal cardinality per row.
pub const REQUIRED_IMPORT_COLUMNS: &[&str] = &["text", "platforms", "accountIds"];

pub const EXPORT_HEADER: &[&str] = &[
    "id",
    "text",
    "platforms",
    "accountIds",
    "accountNames",
    "status",
    "scheduledAt",
    "publishedAt",
    "hashtags",
    "mentions",
    "link",
    "firstComment",
    "mediaCount",
    "campaignId",
    "campaignName",
    "tags",
    "aiGenerated",
    "createdAt",
    "updatedAt",
];

/// Quote a field when it contains a delimiter, quote or line break.
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn write_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse CSV text into records. Empty lines between records are skipped;
/// an unterminated quoted field is an input error.
pub fn parse(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !field_started => {
                in_quotes = true;
                field_started = true;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_started = false;
            }
            '\r' => {
                // Bare CR is folded into the following LF handling
                if chars.peek() == Some(&'\n') {
                    continue;
                }
            }
            '\n' => {
                record.push(std::mem::take(&mut field));
                field_started = false;
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }

    if in_quotes {
        return Err(SyndicaError::InvalidInput(
            "CSV ends inside a quoted field".to_string(),
        ));
    }

    if field_started || !field.is_empty() || !record.is_empty() {
        record.push(field);
        if !(record.len() == 1 && record[0].is_empty()) {
            records.push(record);
        }
    }

    Ok(records)
}

/// Split a multi-valued cell on commas, trimming and dropping empty entries.
pub fn split_multi(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// One interpreted import row.
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub text: String,
    pub platforms: Vec<PlatformKind>,
    pub account_ids: Vec<String>,
    pub scheduled_at: Option<String>,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub link: Option<String>,
    pub first_comment: Option<String>,
    pub media_ids: Vec<String>,
    pub campaign_id: Option<String>,
    pub tags: Vec<String>,
}

/// Parsed import file: each row carries its own outcome so one malformed row
/// never sinks the batch.
pub struct ImportFile {
    pub rows: Vec<std::result::Result<ImportRow, String>>,
}

/// Parse an import CSV. A missing required header rejects the whole file;
/// everything row-level is reported per row.
pub fn parse_import(text: &str) -> Result<ImportFile> {
    let records = parse(text)?;
    let mut iter = records.into_iter();
    let header = iter
        .next()
        .ok_or_else(|| SyndicaError::InvalidInput("CSV has no header row".to_string()))?;

    let index: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();

    for col in REQUIRED_IMPORT_COLUMNS {
        if !index.contains_key(*col) {
            return Err(SyndicaError::InvalidInput(format!(
                "CSV is missing required column '{col}'"
            )));
        }
    }

    let cell = |record: &[String], name: &str| -> String {
        index
            .get(name)
            .and_then(|i| record.get(*i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    let optional = |record: &[String], name: &str| -> Option<String> {
        let v = cell(record, name);
        if v.is_empty() {
            None
        } else {
            Some(v)
        }
    };

    let rows = iter
        .map(|record| {
            let text = cell(&record, "text");
            if text.is_empty() {
                return Err("missing required field 'text'".to_string());
            }

            let platform_names = split_multi(&cell(&record, "platforms"));
            if platform_names.is_empty() {
                return Err("missing required field 'platforms'".to_string());
            }
            let platforms = platform_names
                .iter()
                .map(|name| name.parse::<PlatformKind>())
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let account_ids = split_multi(&cell(&record, "accountIds"));
            if account_ids.is_empty() {
                return Err("missing required field 'accountIds'".to_string());
            }
            if platforms.len() != account_ids.len() {
                return Err(format!(
                    "platforms ({}) and accountIds ({}) must have equal cardinality",
                    platforms.len(),
                    account_ids.len()
                ));
            }

            Ok(ImportRow {
                text,
                platforms,
                account_ids,
                scheduled_at: optional(&record, "scheduledAt"),
                hashtags: split_multi(&cell(&record, "hashtags")),
                mentions: split_multi(&cell(&record, "mentions")),
                link: optional(&record, "link"),
                first_comment: optional(&record, "firstComment"),
                media_ids: split_multi(&cell(&record, "mediaIds")),
                campaign_id: optional(&record, "campaignId"),
                tags: split_multi(&cell(&record, "tags")),
            })
        })
        .collect();

    Ok(ImportFile { rows })
}
