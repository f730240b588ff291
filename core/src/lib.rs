//! Synchronous client for the FarmOpsX API.
//!
//! # Overview
//! `FarmOpsXClient` turns a target such as `channels/:channelId` and a map
//! of options into one HTTP call, then classifies the response as a
//! `Response` or an `ApiError`. The HTTP round-trip itself goes through the
//! `Transport` trait, so the pipeline can run against `ureq`, a mock server,
//! or a closure in tests.
//!
//! # Design
//! - `build_request` and `handle_response` are public and pure, so a host
//!   that does its own I/O can skip `Transport` entirely.
//! - `ResourceError` (400, 403, 404, 410) and `ServiceError` (everything
//!   else) separate expected rejections from service failures.
//! - Resource handles (`channels()`, `sync()`) are thin tables of verb,
//!   target and default options over the same pipeline.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod resources;
pub mod response;
#[cfg(feature = "ureq")]
pub mod transport;

/// Request options, in insertion order.
pub type Options = serde_json::Map<String, serde_json::Value>;

pub use client::FarmOpsXClient;
pub use config::{ClientConfig, SecretToken};
pub use endpoint::{Endpoint, EndpointBuilder};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use resources::{ChannelDetails, Channels, SyncResource};
pub use response::Response;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
