//! CSV to record parser for the published deals sheet.
//!
//! Converts one already-decoded CSV document into header-keyed records.
//! Quoted fields may hold commas, line breaks and doubled quotes (`""`).
//! Only the comma delimiter is supported and no encoding detection happens
//! here: the text arrives decoded from the fetch step.
//!
//! Parsing never fails. Rows whose width differs from the header are
//! dropped and reported as [`RowWarning`]s next to the records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// One data row keyed by header name.
pub type Record = BTreeMap<String, String>;

/// A data row that was skipped because its width did not match the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowWarning {
    /// Position in the row list (the header is row 0)
    pub row_index: usize,
    /// Header column count
    pub expected: usize,
    /// Column count found in the row
    pub actual: usize,
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Row {} has {} columns, expected {}. Skipping.",
            self.row_index, self.actual, self.expected
        )
    }
}

/// Result of parsing with diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Column headers (empty for empty input)
    pub headers: Vec<String>,
    /// Accepted records, in input order
    pub records: Vec<Record>,
    /// Rows skipped for a column count mismatch
    pub warnings: Vec<RowWarning>,
}

/// Scan state threaded through a single left-to-right pass.
#[derive(Default)]
struct Scanner {
    inside_quotes: bool,
    field: String,
    row: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Scanner {
    fn close_field(&mut self) {
        let field = std::mem::take(&mut self.field);
        self.row.push(field.trim().to_string());
    }

    fn close_row(&mut self) {
        self.close_field();
        let row = std::mem::take(&mut self.row);
        self.rows.push(row);
    }

    /// Flush a last row that has no trailing line break.
    fn finish(mut self) -> Vec<Vec<String>> {
        if !self.field.is_empty() || !self.row.is_empty() {
            self.close_row();
        }
        self.rows
    }
}

/// Split raw CSV text into rows of trimmed fields.
///
/// Line breaks are `\n` or `\r\n`; a lone `\r` is kept as field content.
pub fn tokenize(raw: &str) -> Vec<Vec<String>> {
    let mut scanner = Scanner::default();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if scanner.inside_quotes && chars.peek() == Some(&'"') {
                    scanner.field.push('"');
                    chars.next();
                } else {
                    scanner.inside_quotes = !scanner.inside_quotes;
                }
            }
            ',' if !scanner.inside_quotes => scanner.close_field(),
            '\n' if !scanner.inside_quotes => scanner.close_row(),
            '\r' if !scanner.inside_quotes && chars.peek() == Some(&'\n') => {
                chars.next();
                scanner.close_row();
            }
            _ => scanner.field.push(c),
        }
    }

    scanner.finish()
}

/// Zip tokenized rows against the first (header) row.
///
/// Blank rows are ignored silently. Rows with more or fewer fields than the
/// header are skipped, never padded, and reported as warnings.
pub fn rows_to_records(mut rows: Vec<Vec<String>>) -> ParseResult {
    if rows.len() < 2 {
        return ParseResult {
            headers: rows.pop().unwrap_or_default(),
            ..ParseResult::default()
        };
    }

    let mut data = rows.into_iter();
    let headers = data.next().unwrap_or_default();
    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for (offset, row) in data.enumerate() {
        let row_index = offset + 1;

        if row.is_empty() || (row.len() == 1 && row[0].is_empty()) {
            continue;
        }

        if row.len() != headers.len() {
            let warning = RowWarning {
                row_index,
                expected: headers.len(),
                actual: row.len(),
            };
            tracing::warn!(
                row = row_index,
                expected = warning.expected,
                actual = warning.actual,
                "{}",
                warning
            );
            warnings.push(warning);
            continue;
        }

        let record: Record = headers.iter().cloned().zip(row).collect();
        records.push(record);
    }

    ParseResult { headers, records, warnings }
}

/// Parse a CSV document into header-keyed records.
///
/// # Example
/// ```
/// use dealshub::parse_delimited_text;
///
/// let result = parse_delimited_text("Title,Merchant\n\"Phone, 128GB\",Amazon");
///
/// assert_eq!(result.records.len(), 1);
/// assert_eq!(result.records[0]["Title"], "Phone, 128GB");
/// assert_eq!(result.records[0]["Merchant"], "Amazon");
/// ```
pub fn parse_delimited_text(raw: &str) -> ParseResult {
    rows_to_records(tokenize(raw))
}

/// Parse a CSV file from disk. The file must be UTF-8.
pub fn parse_file<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let content = std::fs::read_to_string(path.as_ref())?;
    Ok(parse_delimited_text(&content))
}

/// Serialize records back to CSV with the quoting rules the parser reads.
///
/// Fields holding commas, quotes or line breaks are quoted and inner quotes
/// doubled. Records missing a header key are written with an empty field.
pub fn write_delimited_text(headers: &[String], records: &[Record]) -> CsvResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for record in records {
        writer.write_record(
            headers
                .iter()
                .map(|h| record.get(h).map(String::as_str).unwrap_or("")),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CsvError::IoError(std::io::Error::other(e.to_string())))?;
    Ok(String::from_utf8(bytes)?)
}
