//! An axios-style HTTP request pipeline.
//!
//! A [`Client`] merges per-call config with its defaults, runs registered
//! interceptor chains, composes cancellation (caller token + attempt
//! timeout) with deterministic attribution, retries per policy, and
//! dispatches through a pluggable transport (built-in: hyper + rustls).
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! let client = Client::builder()
//!     .base_url("https://api.example.com".parse()?)
//!     .default_header("accept", "application/json")
//!     .retry(RetryPolicy::attempts(2).backoff(2.0))
//!     .build();
//!
//! client.interceptors().request.add(RequestInterceptor::new(|config| async move {
//!     Ok(config.with_header("authorization", "Bearer ..."))
//! }));
//!
//! let response = client.get("/users").await?;
//! let users: Vec<User> = response.json()?;
//! ```

mod client;
mod connector;
mod dispatch;
mod gate;
mod interceptor;
pub mod prelude;
mod scope;
mod transport;

pub use client::{Client, ClientBuilder, Interceptors};
pub use interceptor::{InterceptorId, InterceptorSet, RequestInterceptor, ResponseInterceptor};
pub use scope::{AbortReason, CancelScope};
pub use transport::{HyperTransport, PoolOptions};

// Re-export the core data model at the crate root.
pub use courier_core::{
    Adapter, Body, CancelToken, ContentType, Error, FnTransport, HeaderMap, Headers, Method,
    RawResponse, RequestConfig, ResponseConfig, ResponseData, ResponseParser, ResponseType,
    Result, RetryPolicy, SearchParams, StatusCode, Transport, TransportRequest, from_json,
    to_form, to_json,
};
