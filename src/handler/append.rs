//! Append Wikipedia summaries to a stored text file, or download it

use tracing::debug;

use crate::config::StoreConfig;
use crate::error::HandlerError;
use crate::remote::{summary_or_message, ObjectStore, SummarySource};

use super::{parse_title, respond, Handler, Request, Response};

/// Appends a titled summary to the configured object, returning the whole file.
///
/// A request with a body appends; a bodiless request with
/// `?action=download` only reads.
pub struct AppendHandler<S, O> {
    config: StoreConfig,
    source: S,
    store: O,
}

impl<S: SummarySource, O: ObjectStore> AppendHandler<S, O> {
    pub fn new(config: StoreConfig, source: S, store: O) -> Self {
        Self {
            config,
            source,
            store,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn store(&self) -> &O {
        &self.store
    }

    fn process(&self, request: &Request) -> Result<Response, HandlerError> {
        let StoreConfig {
            bucket, file_key, ..
        } = &self.config;

        if request.has_body() {
            let title = parse_title(request.body())?;
            let summary = summary_or_message(&self.source, &title);

            let current = self.store.get(bucket, file_key)?;
            self.store
                .put(bucket, file_key, &append_entry(&current, &title, &summary))?;
            debug!(bucket = %bucket, key = %file_key, title = %title, "summary appended");

            let full = self.store.get(bucket, file_key)?;
            return Ok(self.attachment(full));
        }

        if request.query("action") == Some("download") {
            let content = self.store.get(bucket, file_key)?;
            return Ok(self.attachment(content));
        }

        Err(HandlerError::bad_request("Bad request"))
    }

    fn attachment(&self, content: String) -> Response {
        Response::ok(content)
            .with_header("Content-Type", "text/plain")
            .with_header(
                "Content-Disposition",
                format!("attachment; filename={}", self.config.file_key),
            )
    }
}

impl<S: SummarySource, O: ObjectStore> Handler for AppendHandler<S, O> {
    fn name(&self) -> &'static str {
        "append"
    }

    fn handle(&self, request: &Request) -> Response {
        respond(self.name(), self.process(request))
    }
}

/// Separator line written before every entry
fn separator() -> String {
    format!("\n{}\n", "*".repeat(40))
}

fn append_entry(current: &str, title: &str, summary: &str) -> String {
    format!("{}{}{}\n\n{}\n", current, separator(), title, summary)
}
