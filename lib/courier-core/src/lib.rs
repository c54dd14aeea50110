//! Core types for the courier HTTP request pipeline.
//!
//! This crate provides the data model shared by the pipeline:
//! - [`RequestConfig`] and [`ResponseConfig`] - the request/response descriptions
//! - [`Error`] and [`Result`] - the error taxonomy with stable codes
//! - [`Body`] and [`ContentType`] - normalized request bodies
//! - [`Headers`] and [`SearchParams`] - ordered header and query collections
//! - [`RetryPolicy`] - retry-eligibility and backoff decisions
//! - [`CancelToken`] - caller-facing cancellation
//! - [`Transport`] and [`Adapter`] - the pluggable network seam
//! - [`ResponseType`], [`ResponseData`] and [`ResponseParser`] - response parsing

mod body;
mod cancel;
mod config;
mod error;
mod headers;
mod params;
pub mod prelude;
mod response;
mod retry;
mod transport;

pub use body::{Body, ContentType, from_json, to_form, to_json};
pub use cancel::CancelToken;
pub use config::RequestConfig;
pub use error::{Error, Result};
pub use headers::Headers;
pub use params::SearchParams;
pub use response::{ResponseConfig, ResponseData, ResponseParser, ResponseType};
pub use retry::{DelayFn, RetryPolicy, RetryPredicate};
pub use transport::{Adapter, FnTransport, RawResponse, Transport, TransportRequest};

// Re-export http crate types used throughout the pipeline surface.
pub use http::{HeaderMap, Method, StatusCode};
