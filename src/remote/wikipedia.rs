//! Wikipedia page summary client

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;

/// Base of the REST summary endpoint; the page title is appended as one segment
pub const SUMMARY_API_BASE: &str = "https://en.wikipedia.org/api/rest_v1/page/summary/";

/// Text used when a page has no `extract`
pub const NO_SUMMARY: &str = "No summary found.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can produce a plain-text summary for a page title
pub trait SummarySource: Send + Sync {
    fn summary(&self, title: &str) -> Result<String, FetchError>;
}

#[derive(Deserialize)]
struct SummaryPayload {
    extract: Option<String>,
}

/// Blocking client for the Wikipedia REST API
pub struct WikipediaClient {
    agent: ureq::Agent,
    base_url: Url,
}

impl WikipediaClient {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            base_url: Url::parse(SUMMARY_API_BASE).expect("summary base url is valid"),
        }
    }

    /// Point the client at another summary endpoint
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, url::ParseError> {
        self.base_url = Url::parse(base_url)?;
        Ok(self)
    }

    /// Build the summary URL, with spaces in the title replaced by underscores
    pub fn summary_url(&self, title: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&title.replace(' ', "_"));
        }
        url
    }
}

impl Default for WikipediaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SummarySource for WikipediaClient {
    fn summary(&self, title: &str) -> Result<String, FetchError> {
        let url = self.summary_url(title);
        debug!(%url, "fetching summary");

        let response = self
            .agent
            .get(url.as_str())
            .set("Accept", "application/json")
            .call();

        match response {
            Ok(resp) => {
                let body = resp
                    .into_string()
                    .map_err(|err| FetchError::Transport(err.to_string()))?;
                let payload: SummaryPayload = serde_json::from_str(&body)
                    .map_err(|err| FetchError::Decode(err.to_string()))?;
                Ok(payload.extract.unwrap_or_else(|| NO_SUMMARY.to_string()))
            }
            Err(ureq::Error::Status(code, _)) => Err(FetchError::Status(code)),
            Err(ureq::Error::Transport(err)) => Err(FetchError::Transport(err.to_string())),
        }
    }
}

/// Fetch a summary, turning any failure into readable text
pub fn summary_or_message(source: &dyn SummarySource, title: &str) -> String {
    match source.summary(title) {
        Ok(summary) => summary,
        Err(err) => {
            warn!(title, error = %err, "summary fetch failed");
            format!("Could not fetch summary for \"{}\": {}", title, err)
        }
    }
}
