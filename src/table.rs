//! Tabular payloads and their CSV wire form.
//!
//! A snapshot's content is an ordered list of rows; row 0 is the header and
//! every other row is data. On the wire and in the database the table is
//! plain CSV (comma separated, double-quote escaping, newlines allowed inside
//! quoted fields). Decoding is strict: an unterminated quote, a stray quote
//! inside an unquoted field, or rows of differing width are rejected.

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Table { rows }
    }

    /// Build a table from borrowed cells, mostly handy in tests and benches.
    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names, or `None` for a table with zero rows.
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Every row after the header.
    pub fn data(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Split into header and data rows. An empty table yields an empty header.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<String>>) {
        let mut rows = self.rows.into_iter();
        let header = rows.next().unwrap_or_default();
        (header, rows.collect())
    }
}

/// Parse CSV text into a table. Empty input yields a table with zero rows.
pub fn decode(text: &str) -> Result<Table> {
    check_quoting(text)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { rows })
}

/// Serialize a table to CSV, quoting only where a cell needs it. A row with
/// no cells has no CSV form and is refused.
pub fn encode(table: &Table) -> Result<String> {
    if let Some(index) = table.rows.iter().position(Vec::is_empty) {
        return Err(Error::Encode(format!("row {index} has no cells")));
    }

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| Error::Encode(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Encode(format!("csv writer error: {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::Encode(format!("csv output not utf-8: {e}")))
}

#[derive(Clone, Copy, PartialEq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    // just saw a quote inside a quoted field: either an escape or the close
    QuoteInQuoted,
}

/// The csv crate is lenient about quoting, so strict RFC 4180 quoting is
/// checked up front to reject what it would silently accept.
fn check_quoting(text: &str) -> Result<()> {
    use QuoteState::*;

    let mut state = FieldStart;
    let mut line = 1usize;
    let mut quote_opened_on = 0usize;

    // the csv reader drops a leading BOM, so the first field starts after it
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    for ch in text.chars() {
        state = match (state, ch) {
            (FieldStart, '"') => {
                quote_opened_on = line;
                Quoted
            }
            (FieldStart | Unquoted | QuoteInQuoted, ',' | '\r') => FieldStart,
            (FieldStart | Unquoted | QuoteInQuoted, '\n') => {
                line += 1;
                FieldStart
            }
            (Unquoted, '"') => {
                return Err(Error::MalformedInput(format!(
                    "line {line}: bare \" in non-quoted field"
                )));
            }
            (FieldStart | Unquoted, _) => Unquoted,
            (Quoted, '"') => QuoteInQuoted,
            (Quoted, '\n') => {
                line += 1;
                Quoted
            }
            (Quoted, _) => Quoted,
            (QuoteInQuoted, '"') => Quoted,
            (QuoteInQuoted, _) => {
                return Err(Error::MalformedInput(format!(
                    "line {line}: unexpected {ch:?} after closing quote"
                )));
            }
        };
    }

    if state == Quoted {
        return Err(Error::MalformedInput(format!(
            "line {quote_opened_on}: unterminated quoted field"
        )));
    }

    Ok(())
}
