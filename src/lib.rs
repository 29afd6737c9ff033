//! tabconv - CSV/xlsx conversion and Wikipedia summary handlers
//!
//! The core is a pure two-direction converter between delimited text and
//! single-sheet xlsx workbooks. Around it sit serverless-style handlers that
//! decode an HTTP-like event, call one library or remote API, and encode an
//! HTTP-like response.

pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod handler;
pub mod model;
pub mod remote;

pub use config::StoreConfig;
pub use convert::{convert, to_delimited_text, to_spreadsheet, Converted};
pub use error::{ConfigError, ConvertError, HandlerError};
pub use format::Format;
pub use handler::{Handler, Request, Response};
pub use model::Table;
