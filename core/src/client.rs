//! Request pipeline for the FarmOpsX API.
//!
//! # Design
//! Every call is split the same way as a host-does-IO client: `build_request`
//! turns a target and its options into an `HttpRequest`, the transport
//! performs one round-trip, and `handle_response` classifies the
//! `HttpResponse`. The verb methods compose the three. The configuration is
//! read per call and never modified by a request, so one call cannot leak
//! state into the next.

use serde_json::Value;

use crate::config::{ClientConfig, SecretToken};
use crate::endpoint::{encode_query, EndpointBuilder};
use crate::error::{ApiError, RESOURCE_ERROR_STATUSES, UNKNOWN_ERROR};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::resources::{Channels, SyncResource};
use crate::response::Response;
use crate::Options;

/// Synchronous client for the FarmOpsX API.
///
/// Each verb method performs exactly one blocking call through `T` and
/// returns either the response or a classified `ApiError`. Nothing is
/// retried.
#[derive(Debug, Clone)]
pub struct FarmOpsXClient<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> FarmOpsXClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resource name prefixed to every target of the verb methods.
    pub fn set_resource(&mut self, resource: impl Into<String>) -> &mut Self {
        self.config.set_resource(Some(resource.into()));
        self
    }

    pub fn clear_resource(&mut self) -> &mut Self {
        self.config.set_resource(None);
        self
    }

    pub fn set_token(&mut self, token: impl Into<SecretToken>) -> &mut Self {
        self.config.set_token(token.into());
        self
    }

    pub fn channels(&self) -> Channels<'_, T> {
        Channels::new(self)
    }

    pub fn sync(&self) -> SyncResource<'_, T> {
        SyncResource::new(self)
    }

    pub fn get(&self, target: &str, options: Options) -> Result<Response, ApiError> {
        self.perform_request(self.config.resource(), HttpMethod::Get, target, &options)
    }

    pub fn post(&self, target: &str, options: Options) -> Result<Response, ApiError> {
        self.perform_request(self.config.resource(), HttpMethod::Post, target, &options)
    }

    pub fn put(&self, target: &str, options: Options) -> Result<Response, ApiError> {
        self.perform_request(self.config.resource(), HttpMethod::Put, target, &options)
    }

    pub fn delete(&self, target: &str, options: Options) -> Result<Response, ApiError> {
        self.perform_request(self.config.resource(), HttpMethod::Delete, target, &options)
    }

    /// Build the request for `target` under the configured resource.
    pub fn build_request(
        &self,
        method: HttpMethod,
        target: &str,
        options: &Options,
    ) -> Result<HttpRequest, ApiError> {
        self.build_request_for(self.config.resource(), method, target, options)
    }

    /// Classify a raw response into a `Response` or an `ApiError`.
    pub fn handle_response(&self, response: HttpResponse) -> Result<Response, ApiError> {
        normalize_response(response)
    }

    /// Entry point for resource handles, which pass their own resource name.
    pub(crate) fn request(
        &self,
        resource: &str,
        method: HttpMethod,
        target: &str,
        options: Options,
    ) -> Result<Response, ApiError> {
        self.perform_request(Some(resource), method, target, &options)
    }

    fn perform_request(
        &self,
        resource: Option<&str>,
        method: HttpMethod,
        target: &str,
        options: &Options,
    ) -> Result<Response, ApiError> {
        let request = self.build_request_for(resource, method, target, options)?;
        tracing::debug!(method = %request.method, url = %request.url, "dispatching request");

        let raw = self.transport.send(&request)?;
        let result = normalize_response(raw);
        match &result {
            Ok(response) => {
                tracing::debug!(
                    status = response.status_code(),
                    url = %request.url,
                    "request succeeded"
                );
            }
            Err(err) => {
                tracing::warn!(
                    method = %request.method,
                    url = %request.url,
                    error = %err,
                    "request failed"
                );
            }
        }
        result
    }

    fn build_request_for(
        &self,
        resource: Option<&str>,
        method: HttpMethod,
        target: &str,
        options: &Options,
    ) -> Result<HttpRequest, ApiError> {
        let endpoint = EndpointBuilder::new(target)
            .with_resource(resource)
            .build(options)?;

        let mut url = if endpoint.path.is_empty() {
            self.config.base_url().to_string()
        } else {
            format!("{}/{}", self.config.base_url(), endpoint.path)
        };

        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if let Some(token) = self.config.token() {
            headers.push(("authorization".to_string(), format!("Bearer {}", token.expose())));
        }

        let body = if method.sends_body() {
            let body = serde_json::to_string(&endpoint.remaining)
                .map_err(|e| ApiError::SerializationError(e.to_string()))?;
            headers.push(("content-type".to_string(), "application/json".to_string()));
            Some(body)
        } else {
            let query = encode_query(&endpoint.remaining);
            if !query.is_empty() {
                url.push('?');
                url.push_str(&query);
            }
            None
        };

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }
}

/// Success iff the status is 302 or 2xx and the body carries content.
fn normalize_response(response: HttpResponse) -> Result<Response, ApiError> {
    let succeeded = response.status == 302 || response.is_success();
    match response.content() {
        Some(content) if succeeded => Ok(Response::new(response.status, response.headers, content)),
        content => {
            let status = response.status;
            let message = content
                .as_ref()
                .and_then(|c| c.get("error"))
                .map(error_text)
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            if RESOURCE_ERROR_STATUSES.contains(&status) {
                Err(ApiError::ResourceError { status, message })
            } else {
                Err(ApiError::ServiceError { status, message })
            }
        }
    }
}

fn error_text(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
