//! Table formats and the codecs that read and write them

mod csv;
mod xlsx;

use std::path::Path;

use crate::error::ConvertError;
use crate::model::Table;

pub use self::csv::DelimitedCodec;
pub use self::xlsx::SpreadsheetCodec;

/// MIME type of delimited text
pub const CSV_MIME: &str = "text/csv";

/// MIME type of an OOXML spreadsheet package
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Source or target format of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    DelimitedText,
    Spreadsheet,
}

impl Format {
    /// The format a payload in `self` converts into
    pub fn other(self) -> Format {
        match self {
            Format::DelimitedText => Format::Spreadsheet,
            Format::Spreadsheet => Format::DelimitedText,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Format::DelimitedText => CSV_MIME,
            Format::Spreadsheet => XLSX_MIME,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::DelimitedText => "csv",
            Format::Spreadsheet => "xlsx",
        }
    }

    /// Fixed attachment name used for converted payloads
    pub fn output_filename(self) -> &'static str {
        match self {
            Format::DelimitedText => "output.csv",
            Format::Spreadsheet => "output.xlsx",
        }
    }

    /// Pick a format from a `Content-Type` value.
    ///
    /// Matching is by substring so parameters such as `; charset=utf-8`
    /// do not matter.
    pub fn from_content_type(content_type: &str) -> Option<Format> {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("text/csv") {
            Some(Format::DelimitedText)
        } else if content_type.contains("spreadsheetml") || content_type.contains("xlsx") {
            Some(Format::Spreadsheet)
        } else {
            None
        }
    }

    /// Pick a format from a file extension
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" | "txt" => Some(Format::DelimitedText),
            "xlsx" | "xlsm" => Some(Format::Spreadsheet),
            _ => None,
        }
    }

    /// Codec reading and writing this format
    pub fn codec(self) -> &'static dyn TableCodec {
        match self {
            Format::DelimitedText => &DelimitedCodec,
            Format::Spreadsheet => &SpreadsheetCodec,
        }
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" | "delimited-text" => Ok(Format::DelimitedText),
            "xlsx" | "packaged-spreadsheet" => Ok(Format::Spreadsheet),
            _ => Err(format!("Unknown table format: {}", s)),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::DelimitedText => write!(f, "delimited-text"),
            Format::Spreadsheet => write!(f, "packaged-spreadsheet"),
        }
    }
}

/// Trait for decoding and encoding a table in one format
pub trait TableCodec: Send + Sync {
    /// Format handled by this codec
    fn format(&self) -> Format;

    /// Decode a complete payload into a table
    fn decode(&self, bytes: &[u8]) -> Result<Table, ConvertError>;

    /// Encode a table into a complete payload
    fn encode(&self, table: &Table) -> Result<Vec<u8>, ConvertError>;
}

/// Detect the format of a payload from its leading bytes
pub fn detect_format(bytes: &[u8]) -> Format {
    // Both xlsx and xlsm are ZIP packages
    if bytes.starts_with(b"PK\x03\x04") {
        Format::Spreadsheet
    } else {
        Format::DelimitedText
    }
}
