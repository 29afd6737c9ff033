//! Plain Wikipedia summary lookup

use crate::error::HandlerError;
use crate::remote::{summary_or_message, SummarySource};

use super::{non_blank_title, parse_title, respond, Handler, Request, Response};

/// Returns the summary for a title given in the JSON body or `?title=`
pub struct SummaryHandler<S> {
    source: S,
}

impl<S: SummarySource> SummaryHandler<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    fn process(&self, request: &Request) -> Result<Response, HandlerError> {
        let title = if request.has_body() {
            parse_title(request.body())?
        } else {
            non_blank_title(request.query("title").unwrap_or(""))?
        };

        Ok(Response::ok(summary_or_message(&self.source, &title))
            .with_header("Content-Type", "text/plain; charset=utf-8"))
    }
}

impl<S: SummarySource> Handler for SummaryHandler<S> {
    fn name(&self) -> &'static str {
        "summary"
    }

    fn handle(&self, request: &Request) -> Response {
        respond(self.name(), self.process(request))
    }
}
