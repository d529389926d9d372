use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::row::Row;
use crate::sprint_dates::{SprintDates, extract_sprint_dates};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Tab,
    Semicolon,
    Comma,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Tab => '\t',
            Delimiter::Semicolon => ';',
            Delimiter::Comma => ',',
        }
    }

    pub fn as_byte(self) -> u8 {
        self.as_char() as u8
    }

    /// Picks the delimiter from the first line only: tab, then semicolon,
    /// then comma.
    pub fn sniff(first_line: &str) -> Option<Self> {
        if first_line.contains('\t') {
            Some(Delimiter::Tab)
        } else if first_line.contains(';') {
            Some(Delimiter::Semicolon)
        } else if first_line.contains(',') {
            Some(Delimiter::Comma)
        } else {
            None
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown delimiter '{0}'")]
pub struct UnknownDelimiter(String);

impl FromStr for Delimiter {
    type Err = UnknownDelimiter;

    /// Accepts a name, a file extension or the delimiter character itself.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "\t" {
            return Ok(Delimiter::Tab);
        }
        match value.trim().to_ascii_lowercase().as_str() {
            "tab" | "tsv" => Ok(Delimiter::Tab),
            "semicolon" | ";" => Ok(Delimiter::Semicolon),
            "comma" | "csv" | "," => Ok(Delimiter::Comma),
            _ => Err(UnknownDelimiter(value.to_string())),
        }
    }
}

/// Result of parsing one uploaded export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedExport {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    pub sprint_dates: SprintDates,
    pub delimiter: Option<Delimiter>,
}

impl ParsedExport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn parse(text: &str) -> Vec<Row> {
    parse_export(text).rows
}

/// Parses delimited text into rows keyed by the header line.
///
/// Never fails: unrecognised input produces an empty export and a warning.
pub fn parse_export(text: &str) -> ParsedExport {
    let without_nulls = text.replace('\0', "");
    let cleaned = without_nulls.trim_start_matches('\u{feff}').trim();
    if cleaned.is_empty() {
        return ParsedExport::default();
    }

    let first_line = cleaned
        .split('\n')
        .next()
        .unwrap_or_default()
        .trim_end_matches('\r');
    let Some(delimiter) = Delimiter::sniff(first_line) else {
        tracing::warn!("unknown delimiter in export header line; no rows parsed");
        return ParsedExport::default();
    };

    let records = scan_records(cleaned, delimiter.as_char());
    if records.len() < 2 {
        tracing::warn!(
            records = records.len(),
            "export needs a header line and at least one data row"
        );
        return ParsedExport {
            delimiter: Some(delimiter),
            ..ParsedExport::default()
        };
    }

    let mut records = records.into_iter();
    let headers: Vec<String> = records
        .next()
        .unwrap_or_default()
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let rows: Vec<Row> = records
        .map(|record| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| {
                    let value = record.get(idx).map(|v| v.trim()).unwrap_or_default();
                    (header.clone(), value.to_string())
                })
                .collect()
        })
        .collect();

    let sprint_dates = extract_sprint_dates(&rows);
    tracing::debug!(
        rows = rows.len(),
        columns = headers.len(),
        sprints_with_dates = sprint_dates.len(),
        ?delimiter,
        "parsed export"
    );

    ParsedExport {
        headers,
        rows,
        sprint_dates,
        delimiter: Some(delimiter),
    }
}

/// Single left-to-right scan. `""` emits a literal quote, a lone `"` toggles
/// quoting, and the delimiter and line breaks only count outside quotes.
/// Empty lines never produce a record.
fn scan_records(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                field.push('"');
            } else {
                in_quotes = !in_quotes;
            }
            continue;
        }
        if !in_quotes && ch == delimiter {
            record.push(std::mem::take(&mut field));
            continue;
        }
        if !in_quotes && (ch == '\n' || ch == '\r') {
            if !field.is_empty() || !record.is_empty() {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            continue;
        }
        field.push(ch);
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

/// Serialises rows in header order with the given delimiter, quoting any
/// field that needs it so [`parse`] reads it back unchanged.
pub fn write_rows<W: io::Write>(
    writer: W,
    headers: &[String],
    rows: &[Row],
    delimiter: Delimiter,
) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(
            headers
                .iter()
                .map(|header| row.get(header).map(String::as_str).unwrap_or_default()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn rows_to_string(
    headers: &[String],
    rows: &[Row],
    delimiter: Delimiter,
) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_rows(&mut buffer, headers, rows, delimiter)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
