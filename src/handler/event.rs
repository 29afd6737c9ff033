//! Typed HTTP-like request and response events

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::HandlerError;

/// Headers the handlers look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownHeader {
    ContentType,
}

impl KnownHeader {
    /// Normalised (lower-case) header name
    pub fn name(self) -> &'static str {
        match self {
            KnownHeader::ContentType => "content-type",
        }
    }
}

/// Request headers with names normalised to lower case
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(IndexMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, header: KnownHeader) -> Option<&str> {
        self.0.get(header.name()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<IndexMap<String, String>>::deserialize(deserializer)?;
        let mut headers = Headers::new();
        for (name, value) in raw.unwrap_or_default() {
            headers.insert(&name, value);
        }
        Ok(headers)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IndexMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Inbound event; fields outside this set are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub query_string_parameters: IndexMap<String, String>,
    #[serde(default)]
    pub http_method: Option<String>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set a plain text body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.is_base64_encoded = false;
        self
    }

    /// Set a binary body, base64 encoded as a gateway would
    pub fn with_binary_body(mut self, bytes: &[u8]) -> Self {
        self.body = Some(STANDARD.encode(bytes));
        self.is_base64_encoded = true;
        self
    }

    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query_string_parameters
            .insert(name.to_string(), value.into());
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(KnownHeader::ContentType)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_string_parameters.get(name).map(String::as_str)
    }

    /// Raw body text, empty when absent
    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// True when the request carries a non-empty body
    pub fn has_body(&self) -> bool {
        !self.body().is_empty()
    }

    /// Body bytes, base64-decoded when the event says so
    pub fn payload(&self) -> Result<Vec<u8>, HandlerError> {
        if self.is_base64_encoded {
            STANDARD
                .decode(self.body())
                .map_err(|_| HandlerError::bad_request("Invalid base64 payload"))
        } else {
            Ok(self.body().as_bytes().to_vec())
        }
    }
}

/// Outbound event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl Response {
    /// 200 with a text body
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            headers: IndexMap::new(),
            body: body.into(),
            is_base64_encoded: false,
        }
    }

    /// 200 with a base64-encoded binary body
    pub fn binary(bytes: &[u8]) -> Self {
        Self {
            is_base64_encoded: true,
            ..Self::ok(STANDARD.encode(bytes))
        }
    }

    /// JSON `{"error": ...}` body with the status of the error kind
    pub fn error(err: &HandlerError) -> Self {
        Self {
            status_code: err.status(),
            ..Self::ok(serde_json::json!({ "error": err.message }).to_string())
        }
        .with_header("Content-Type", "application/json")
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body bytes, base64-decoded when flagged
    pub fn decoded_body(&self) -> Result<Vec<u8>, base64::DecodeError> {
        if self.is_base64_encoded {
            STANDARD.decode(&self.body)
        } else {
            Ok(self.body.as_bytes().to_vec())
        }
    }

    /// The `error` field of a JSON error body
    pub fn error_message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        value.get("error")?.as_str().map(str::to_string)
    }
}
