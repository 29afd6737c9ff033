//! Error types for conversion, remote collaborators, and handlers

use thiserror::Error;

/// Failure while decoding or encoding a table
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: u64 },

    #[error("malformed delimited text: {0}")]
    Csv(#[from] csv::Error),

    #[error("unreadable spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error("workbook contains no sheets")]
    NoSheets,

    #[error("table exceeds spreadsheet limits at row {row}, column {column}")]
    OutOfBounds { row: usize, column: usize },

    #[error("failed to write spreadsheet: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure talking to the object store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {bucket}/{key} is not valid UTF-8")]
    NotText { bucket: String, key: String },

    #[error("invalid object location {0:?}")]
    InvalidLocation(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure fetching a summary from the remote API
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("summary service returned HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

/// Missing or unusable configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingVar(&'static str),
}

/// Coarse error class, mapped to a status code at the handler boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is unusable
    BadRequest,
    /// Processing or a collaborator failed
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Internal => 500,
        }
    }
}

/// Structured handler failure carrying a kind and a caller-facing message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub kind: ErrorKind,
    pub message: String,
}

impl HandlerError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::BadRequest,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            message: message.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.kind.status()
    }
}

impl From<ConvertError> for HandlerError {
    fn from(err: ConvertError) -> Self {
        HandlerError::internal(err.to_string())
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        HandlerError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(HandlerError::bad_request("nope").status(), 400);
        assert_eq!(HandlerError::internal("boom").status(), 500);
    }

    #[test]
    fn test_convert_error_is_internal() {
        let err: HandlerError = ConvertError::UnterminatedQuote { line: 3 }.into();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.message, "unterminated quoted field starting on line 3");
    }

    #[test]
    fn test_config_error_message() {
        assert_eq!(
            ConfigError::MissingVar("BUCKET_NAME").to_string(),
            "BUCKET_NAME is not set"
        );
    }
}
