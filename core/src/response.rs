//! The success value of a request.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::find_header;

/// A response the pipeline classified as successful. The content is kept
/// exactly as the API returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    content: Value,
}

impl Response {
    pub(crate) fn new(status: u16, headers: Vec<(String, String)>, content: Value) -> Self {
        Self {
            status,
            headers,
            content,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    /// The `data` member most FarmOpsX payloads are wrapped in.
    pub fn data(&self) -> Option<&Value> {
        self.content.get("data")
    }

    pub fn into_content(self) -> Value {
        self.content
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        T::deserialize(&self.content).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }
}
