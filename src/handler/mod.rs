//! Request handlers wrapping the converter and the summary collaborators

mod append;
mod convert;
pub mod event;
mod summary;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::{ErrorKind, HandlerError};

pub use append::AppendHandler;
pub use convert::ConvertHandler;
pub use event::{Headers, KnownHeader, Request, Response};
pub use summary::SummaryHandler;

/// Trait for serverless-style handlers
pub trait Handler: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Turn a request into a response, without failing
    fn handle(&self, request: &Request) -> Response;
}

/// Map a handler outcome to a response, logging failures
fn respond(handler: &'static str, result: Result<Response, HandlerError>) -> Response {
    match result {
        Ok(response) => {
            info!(handler, status = response.status_code, "request handled");
            response
        }
        Err(err) => {
            match err.kind {
                ErrorKind::BadRequest => warn!(handler, error = %err, "request rejected"),
                ErrorKind::Internal => error!(handler, error = %err, "request failed"),
            }
            Response::error(&err)
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TitleBody {
    #[serde(default)]
    title: String,
}

/// Extract a non-blank `title` from a JSON body
fn parse_title(body: &str) -> Result<String, HandlerError> {
    let parsed: TitleBody = serde_json::from_str(body)
        .map_err(|err| HandlerError::bad_request(format!("Invalid JSON body: {}", err)))?;
    non_blank_title(&parsed.title)
}

fn non_blank_title(title: &str) -> Result<String, HandlerError> {
    let title = title.trim();
    if title.is_empty() {
        Err(HandlerError::bad_request("Missing title"))
    } else {
        Ok(title.to_string())
    }
}
