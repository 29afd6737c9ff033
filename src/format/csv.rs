//! Delimited-text (CSV) codec

use std::borrow::Cow;

use tracing::debug;

use crate::error::ConvertError;
use crate::model::{Row, Table};

use super::{Format, TableCodec};

/// Codec for comma-separated text
pub struct DelimitedCodec;

impl TableCodec for DelimitedCodec {
    fn format(&self) -> Format {
        Format::DelimitedText
    }

    fn decode(&self, bytes: &[u8]) -> Result<Table, ConvertError> {
        // The csv reader silently accepts a quote that runs to end of input
        ensure_quotes_closed(bytes)?;

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        // The reader skips blank lines; they are kept as empty rows
        let mut consumed = 0;
        let mut table = Table::new();
        let mut record = csv::StringRecord::new();
        while csv_reader.read_record(&mut record)? {
            push_blank_lines(&mut table, bytes, consumed);
            table.add_row(record.iter().collect::<Row>());
            consumed = usize::try_from(csv_reader.position().byte()).unwrap_or(bytes.len());
        }
        push_blank_lines(&mut table, bytes, consumed);

        debug!(
            rows = table.row_count(),
            columns = table.column_count(),
            "decoded delimited text"
        );
        Ok(table)
    }

    fn encode(&self, table: &Table) -> Result<Vec<u8>, ConvertError> {
        let mut builder = csv::WriterBuilder::new();
        builder.flexible(true);
        let mut writer = builder.from_writer(Vec::new());

        for row in &table.rows {
            if is_blank_line(row) {
                // The writer renders a record without fields as `""`
                let mut out = writer.into_inner().map_err(|e| e.into_error())?;
                out.push(b'\n');
                writer = builder.from_writer(out);
                continue;
            }
            let fields: Vec<Cow<'_, str>> = row.fields().collect();
            writer.write_record(fields.iter().map(|f| f.as_bytes()))?;
        }

        writer.into_inner().map_err(|e| e.into_error().into())
    }
}

/// Add an empty row for every blank line at `bytes[from..]`
fn push_blank_lines(table: &mut Table, bytes: &[u8], from: usize) {
    for _ in 0..blank_lines(bytes, from) {
        table.add_row(Row::default());
    }
}

/// Count the line breaks before the next record starts at `bytes[from..]`.
///
/// A record ending in `\r` leaves its `\n` unread; that `\n` is not a
/// blank line.
fn blank_lines(bytes: &[u8], from: usize) -> usize {
    let rest = bytes.get(from..).unwrap_or_default();
    let mut i = 0;
    if from > 0 && bytes.get(from - 1) == Some(&b'\r') && rest.first() == Some(&b'\n') {
        i = 1;
    }

    let mut lines = 0;
    while let Some(&b) = rest.get(i) {
        match b {
            b'\r' if rest.get(i + 1) == Some(&b'\n') => i += 2,
            b'\r' | b'\n' => i += 1,
            _ => break,
        }
        lines += 1;
    }
    lines
}

/// Rows that are written as an empty line
fn is_blank_line(row: &Row) -> bool {
    row.len() <= 1 && row.fields().all(|f| f.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Reject input whose last quoted field is never closed.
///
/// Follows the csv reader's rules: a quote only opens a quoted field at
/// the start of a field, and `""` inside a quoted field is an escape.
fn ensure_quotes_closed(bytes: &[u8]) -> Result<(), ConvertError> {
    let mut state = QuoteState::FieldStart;
    let mut line: u64 = 1;
    let mut opened_on: u64 = 1;

    for &b in bytes {
        state = match (state, b) {
            (QuoteState::FieldStart, b'"') => {
                opened_on = line;
                QuoteState::Quoted
            }
            (QuoteState::Quoted, b'"') => QuoteState::QuoteInQuoted,
            (QuoteState::Quoted, _) => QuoteState::Quoted,
            (QuoteState::QuoteInQuoted, b'"') => QuoteState::Quoted,
            (_, b',' | b'\n' | b'\r') => QuoteState::FieldStart,
            _ => QuoteState::Unquoted,
        };
        if b == b'\n' {
            line += 1;
        }
    }

    if state == QuoteState::Quoted {
        Err(ConvertError::UnterminatedQuote { line: opened_on })
    } else {
        Ok(())
    }
}
