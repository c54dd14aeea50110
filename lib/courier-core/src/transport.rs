//! The transport seam: the abstract network-call primitive.
//!
//! The pipeline hands a fully prepared [`TransportRequest`] to a
//! [`Transport`] and gets back a buffered [`RawResponse`]. Cancellation is
//! cooperative: the dispatcher races the returned future against the
//! composed cancellation signal and drops it on abort, so transports never
//! see or classify aborts themselves.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{HeaderMap, StatusCode};
use url::Url;

use crate::Result;

/// A fully prepared request, ready for the wire.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: http::Method,
    /// Resolved absolute URL, query applied.
    pub url: Url,
    /// Transport-ready headers, content type already defaulted.
    pub headers: HeaderMap,
    /// Normalized body payload, if any.
    pub body: Option<Bytes>,
    /// Opaque transport-specific extensions (cache directives, revalidation
    /// hints). The pipeline forwards these without interpreting them.
    pub extensions: HashMap<String, serde_json::Value>,
}

/// A buffered transport response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Fully read response body.
    pub body: Bytes,
}

impl RawResponse {
    /// Creates a response from parts.
    #[must_use]
    pub const fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }
}

/// The pluggable network-call primitive.
///
/// Implementations perform exactly one network exchange and buffer the
/// response body. Failures are reported through the crate error taxonomy;
/// anything that is not an HTTP response should map to a network error.
pub trait Transport: Send + Sync {
    /// Performs the network call.
    fn perform(&self, request: TransportRequest) -> BoxFuture<'_, Result<RawResponse>>;
}

/// Adapts a plain async function into a [`Transport`].
///
/// Mostly useful for tests and for hosts that already own a request
/// primitive.
pub struct FnTransport<F> {
    f: F,
}

impl<F> FnTransport<F> {
    /// Wraps an async function.
    pub const fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(TransportRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RawResponse>> + Send + 'static,
{
    fn perform(&self, request: TransportRequest) -> BoxFuture<'_, Result<RawResponse>> {
        Box::pin((self.f)(request))
    }
}

/// Transport selection for a request.
#[derive(Clone, Default)]
pub enum Adapter {
    /// The client's built-in transport.
    #[default]
    Default,
    /// A named built-in transport; unknown names fail with a
    /// bad-configuration error at dispatch.
    Named(String),
    /// A caller-supplied transport.
    Custom(Arc<dyn Transport>),
}

impl Adapter {
    /// Selects a built-in transport by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wraps a caller-supplied transport.
    #[must_use]
    pub fn custom(transport: Arc<dyn Transport>) -> Self {
        Self::Custom(transport)
    }

    /// Wraps a plain async function as the transport.
    #[must_use]
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(TransportRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RawResponse>> + Send + 'static,
    {
        Self::Custom(Arc::new(FnTransport { f }))
    }

    /// Returns `true` for the default selection.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => f.write_str("Adapter::Default"),
            Self::Named(name) => f.debug_tuple("Adapter::Named").field(name).finish(),
            Self::Custom(_) => f.write_str("Adapter::Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TransportRequest {
        TransportRequest {
            method: http::Method::GET,
            url: Url::parse("https://api.example.com/ping").expect("valid URL"),
            headers: HeaderMap::new(),
            body: None,
            extensions: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn fn_transport_performs() {
        let adapter = Adapter::from_fn(|req| async move {
            assert_eq!(req.method, http::Method::GET);
            Ok(RawResponse::new(
                StatusCode::OK,
                HeaderMap::new(),
                Bytes::from_static(b"pong"),
            ))
        });

        let Adapter::Custom(transport) = adapter else {
            panic!("expected custom adapter");
        };
        let response = transport.perform(request()).await.expect("response");
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body.as_ref(), b"pong");
    }

    #[test]
    fn adapter_debug_and_default() {
        assert!(Adapter::default().is_default());
        assert!(!Adapter::named("hyper").is_default());
        assert_eq!(format!("{:?}", Adapter::Default), "Adapter::Default");
        assert!(format!("{:?}", Adapter::named("hyper")).contains("hyper"));
    }
}
