//! Packaged spreadsheet (xlsx) codec

use std::io::Cursor;

use calamine::{Data, ExcelDateTime, Range, Reader, Xlsx};
use rust_xlsxwriter::utility::cell_range_absolute;
use rust_xlsxwriter::{Format as CellFormat, Workbook, Worksheet};
use tracing::debug;

use crate::error::ConvertError;
use crate::model::{CellValue, Row, Table};

use super::{Format, TableCodec};

const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Workbook-level name holding the written grid, e.g. `Sheet1!$A$1:$C$4`.
///
/// calamine drops cells without a value, so trailing empty columns and
/// rows are only recoverable from this range.
const EXTENT_NAME: &str = "TabconvExtent";

/// Largest grid an xlsx sheet can hold
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Codec for single-sheet xlsx workbooks
pub struct SpreadsheetCodec;

impl TableCodec for SpreadsheetCodec {
    fn format(&self) -> Format {
        Format::Spreadsheet
    }

    fn decode(&self, bytes: &[u8]) -> Result<Table, ConvertError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;

        let sheets = workbook.sheet_names();
        if sheets.len() > 1 {
            debug!(sheets = sheets.len(), "ignoring all sheets but the first");
        }
        let extent = sheets.first().and_then(|sheet| {
            workbook
                .defined_names()
                .iter()
                .find(|(name, _)| name == EXTENT_NAME)
                .and_then(|(_, value)| parse_extent(value, sheet))
        });

        // Only the first sheet is converted
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(ConvertError::NoSheets)??;

        let mut table = range_to_table(&range);
        if let Some((rows, columns)) = extent {
            pad_to_extent(&mut table, rows, columns);
        }
        debug!(
            rows = table.row_count(),
            columns = table.column_count(),
            "decoded spreadsheet"
        );
        Ok(table)
    }

    fn encode(&self, table: &Table) -> Result<Vec<u8>, ConvertError> {
        let mut workbook = Workbook::new();
        let formats = CellFormats {
            datetime: CellFormat::new().set_num_format(DATETIME_NUM_FORMAT),
            // A blank cell is only stored when it carries a format
            blank: CellFormat::new().set_num_format("@"),
        };
        let worksheet = workbook.add_worksheet();
        let sheet_name = worksheet.name();

        for (r, row) in table.rows.iter().enumerate() {
            let row_num =
                u32::try_from(r).map_err(|_| ConvertError::OutOfBounds { row: r, column: 0 })?;
            for (c, cell) in row.cells.iter().enumerate() {
                let col_num = u16::try_from(c)
                    .map_err(|_| ConvertError::OutOfBounds { row: r, column: c })?;
                write_cell(worksheet, row_num, col_num, cell, &formats)?;
            }
        }

        if let Some(extent) = extent_formula(&sheet_name, table)? {
            workbook.define_name(EXTENT_NAME, &extent)?;
        }

        Ok(workbook.save_to_buffer()?)
    }
}

struct CellFormats {
    datetime: CellFormat,
    blank: CellFormat,
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    formats: &CellFormats,
) -> Result<(), ConvertError> {
    match cell {
        // xlsx has no empty-string cell
        CellValue::Null => {
            worksheet.write_blank(row, col, &formats.blank)?;
        }
        CellValue::String(s) if s.is_empty() => {
            worksheet.write_blank(row, col, &formats.blank)?;
        }
        CellValue::String(s) | CellValue::Error(s) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
        CellValue::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::DateTime(dt) => {
            worksheet.write_datetime_with_format(row, col, dt, &formats.datetime)?;
        }
    }
    Ok(())
}

/// `=Sheet!$A$1:$X$N` covering every row and the widest row of `table`
fn extent_formula(sheet_name: &str, table: &Table) -> Result<Option<String>, ConvertError> {
    let rows = table.row_count();
    if rows == 0 {
        return Ok(None);
    }
    let columns = table.column_count().max(1);

    let last_row = u32::try_from(rows - 1).map_err(|_| ConvertError::OutOfBounds {
        row: rows - 1,
        column: 0,
    })?;
    let last_col = u16::try_from(columns - 1).map_err(|_| ConvertError::OutOfBounds {
        row: 0,
        column: columns - 1,
    })?;

    Ok(Some(format!(
        "='{}'!{}",
        sheet_name.replace('\'', "''"),
        cell_range_absolute(0, 0, last_row, last_col)
    )))
}

/// Read a `Sheet1!$A$1:$C$4` extent back as (rows, columns).
///
/// Ranges on other sheets or past the sheet limits are ignored.
fn parse_extent(value: &str, sheet: &str) -> Option<(usize, usize)> {
    let (name, range) = value.trim_start_matches('=').rsplit_once('!')?;
    let name = name
        .strip_prefix('\'')
        .and_then(|n| n.strip_suffix('\''))
        .map_or_else(|| name.to_string(), |n| n.replace("''", "'"));
    if name != sheet {
        return None;
    }

    let last = range.rsplit(':').next()?;
    let (row, col) = parse_cell_ref(last)?;
    let (rows, columns) = (row + 1, col + 1);
    (rows <= MAX_ROWS && columns <= MAX_COLUMNS).then_some((rows, columns))
}

/// Zero-based (row, column) of an `A1` or `$A$1` reference
fn parse_cell_ref(cell: &str) -> Option<(usize, usize)> {
    let cell = cell.replace('$', "");
    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() || letters.len() > 3 || !letters.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }

    let col = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A') + 1);
    let row: usize = digits.parse().ok()?;
    Some((row.checked_sub(1)?, col - 1))
}

/// Grow `table` to at least `rows` x `columns`, keeping every row the same width
fn pad_to_extent(table: &mut Table, rows: usize, columns: usize) {
    let width = table.column_count().max(columns);
    while table.row_count() < rows {
        table.add_row(Row::default());
    }
    for row in &mut table.rows {
        row.cells.resize(width, CellValue::Null);
    }
}

/// Lay a sheet range out as rows anchored at A1.
///
/// calamine trims the range to the first used cell, so leading empty
/// rows and columns are restored as empty cells.
fn range_to_table(range: &Range<Data>) -> Table {
    let Some((start_row, start_col)) = range.start() else {
        return Table::new();
    };
    let lead = start_col as usize;
    let width = lead + range.width();

    let mut table = Table::new();
    for _ in 0..start_row {
        table.add_row(Row::new(vec![CellValue::Null; width]));
    }

    for row in range.rows() {
        let mut cells = Vec::with_capacity(width);
        cells.resize(lead, CellValue::Null);
        cells.extend(row.iter().map(convert_cell));
        table.add_row(Row::new(cells));
    }

    table
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Float(f) => CellValue::Float(*f),
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => convert_datetime(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

fn convert_datetime(dt: &ExcelDateTime) -> CellValue {
    if dt.is_duration() {
        return CellValue::String(format_duration(dt.as_f64()));
    }
    match dt.as_datetime() {
        Some(datetime) => CellValue::DateTime(datetime),
        None => CellValue::Float(dt.as_f64()),
    }
}

/// Render a duration stored in days as `h:mm:ss`
fn format_duration(days: f64) -> String {
    let total = (days * 86_400.0).round() as i64;
    let sign = if total < 0 { "-" } else { "" };
    let secs = total.abs();
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(workbook: &mut Workbook) -> Table {
        let bytes = workbook.save_to_buffer().unwrap();
        SpreadsheetCodec.decode(&bytes).unwrap()
    }

    #[test]
    fn test_values_and_empty_cells() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "a").unwrap();
        sheet.write_number(0, 1, 1).unwrap();
        sheet.write_string(1, 0, "b").unwrap();

        let table = decode(&mut workbook);
        assert_eq!(table.to_strings(), vec![vec!["a", "1"], vec!["b", ""]]);
    }

    #[test]
    fn test_leading_gap_is_preserved() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(1, 2, "x").unwrap();

        let table = decode(&mut workbook);
        assert_eq!(table.row_count(), 2);
        assert!(table.is_rectangular());
        assert_eq!(table.to_strings(), vec![vec!["", "", ""], vec!["", "", "x"]]);
    }

    #[test]
    fn test_typed_cells() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_boolean(0, 0, false).unwrap();
        sheet.write_number(0, 1, 2.5).unwrap();
        sheet.write_formula(0, 2, "=1+1").unwrap();

        let table = decode(&mut workbook);
        assert_eq!(table.rows[0].get(0), Some(&CellValue::Bool(false)));
        assert_eq!(table.rows[0].get(1), Some(&CellValue::Float(2.5)));
        // Formulas are never emitted as text
        assert_ne!(
            table.rows[0].get(2).map(|c| c.display().into_owned()),
            Some("=1+1".to_string())
        );
    }

    #[test]
    fn test_first_sheet_only() {
        let mut workbook = Workbook::new();
        workbook
            .add_worksheet()
            .write_string(0, 0, "first")
            .unwrap();
        workbook
            .add_worksheet()
            .write_string(0, 0, "second")
            .unwrap();

        let table = decode(&mut workbook);
        assert_eq!(table.to_strings(), vec![vec!["first"]]);
    }

    #[test]
    fn test_empty_sheet() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        assert!(decode(&mut workbook).is_empty());
    }

    #[test]
    fn test_encode_empty_table() {
        let bytes = SpreadsheetCodec.encode(&Table::new()).unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));
        assert!(SpreadsheetCodec.decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_encode_typed_cells() {
        let dt = chrono::NaiveDate::from_ymd_opt(2023, 5, 17)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .unwrap();
        let table: Table = vec![Row::new(vec![
            CellValue::Int(7),
            CellValue::Bool(true),
            CellValue::DateTime(dt),
        ])]
        .into_iter()
        .collect();

        let bytes = SpreadsheetCodec.encode(&table).unwrap();
        let decoded = SpreadsheetCodec.decode(&bytes).unwrap();
        assert_eq!(
            decoded.to_strings(),
            vec![vec!["7", "TRUE", "2023-05-17 08:30:00"]]
        );
    }

    #[test]
    fn test_empty_columns_and_rows_survive_encode() {
        let table: Table = vec![
            Row::new(vec![CellValue::from("x"), CellValue::from("")]),
            Row::default(),
            Row::new(vec![CellValue::from("y"), CellValue::Null]),
            Row::new(vec![CellValue::Null, CellValue::Null]),
        ]
        .into_iter()
        .collect();

        let decoded = SpreadsheetCodec
            .decode(&SpreadsheetCodec.encode(&table).unwrap())
            .unwrap();
        assert_eq!(decoded.row_count(), 4);
        assert_eq!(decoded.column_count(), 2);
        assert!(decoded.is_rectangular());
        assert_eq!(
            decoded.to_strings(),
            vec![
                vec!["x", ""],
                vec!["", ""],
                vec!["y", ""],
                vec!["", ""]
            ]
        );
    }

    #[test]
    fn test_extent_is_recorded_as_defined_name() {
        let table: Table = vec![["a", "", ""].into_iter().collect::<Row>()]
            .into_iter()
            .collect();
        let bytes = SpreadsheetCodec.encode(&table).unwrap();

        let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        let extent = workbook
            .defined_names()
            .iter()
            .find(|(name, _)| name == EXTENT_NAME)
            .map(|(_, value)| value.clone());
        assert_eq!(extent.as_deref(), Some("'Sheet1'!$A$1:$C$1"));
    }

    #[test]
    fn test_parse_extent() {
        assert_eq!(parse_extent("Sheet1!$A$1:$C$4", "Sheet1"), Some((4, 3)));
        assert_eq!(
            parse_extent("'My ''Data'''!$A$1:$AA$2", "My 'Data'"),
            Some((2, 27))
        );
        assert_eq!(parse_extent("'Sheet1'!$A$1", "Sheet1"), Some((1, 1)));
        assert_eq!(parse_extent("Other!$A$1:$C$4", "Sheet1"), None);
        assert_eq!(parse_extent("Sheet1!$A$0", "Sheet1"), None);
        assert_eq!(parse_extent("Sheet1!$XFE$1", "Sheet1"), None);
        assert_eq!(parse_extent("Sheet1!#REF!", "Sheet1"), None);
    }

    #[test]
    fn test_extent_never_shrinks_the_sheet() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 3, "late edit").unwrap();
        workbook.define_name(EXTENT_NAME, "=Sheet1!$A$1:$B$1").unwrap();

        let table = decode(&mut workbook);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.rows[2].get(3), Some(&CellValue::from("late edit")));
    }

    #[test]
    fn test_corrupt_package() {
        let err = SpreadsheetCodec.decode(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ConvertError::Spreadsheet(_)));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(1.5), "36:00:00");
        assert_eq!(format_duration(-0.5 / 24.0), "-0:30:00");
    }
}
