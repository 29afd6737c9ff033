//! Two-direction conversion between delimited text and spreadsheets

use tracing::debug;

use crate::error::ConvertError;
use crate::format::{DelimitedCodec, Format, SpreadsheetCodec, TableCodec};

/// Output of a successful conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    /// Format of `bytes`
    pub format: Format,
    /// Complete serialized payload
    pub bytes: Vec<u8>,
}

/// Convert comma-separated text into a single-sheet xlsx workbook
pub fn to_spreadsheet(bytes: &[u8]) -> Result<Vec<u8>, ConvertError> {
    transcode(&DelimitedCodec, &SpreadsheetCodec, bytes)
}

/// Convert the first sheet of an xlsx workbook into comma-separated text
pub fn to_delimited_text(bytes: &[u8]) -> Result<Vec<u8>, ConvertError> {
    transcode(&SpreadsheetCodec, &DelimitedCodec, bytes)
}

/// Convert a payload in `from` into the other format
pub fn convert(bytes: &[u8], from: Format) -> Result<Converted, ConvertError> {
    let to = from.other();
    let bytes = transcode(from.codec(), to.codec(), bytes)?;
    Ok(Converted { format: to, bytes })
}

fn transcode(
    from: &dyn TableCodec,
    to: &dyn TableCodec,
    bytes: &[u8],
) -> Result<Vec<u8>, ConvertError> {
    let table = from.decode(bytes)?;
    let out = to.encode(&table)?;
    debug!(
        from = %from.format(),
        to = %to.format(),
        input_bytes = bytes.len(),
        output_bytes = out.len(),
        "converted table"
    );
    Ok(out)
}
