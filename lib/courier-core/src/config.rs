//! Request configuration and the base/per-call merge.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::{
    Adapter, Body, CancelToken, Headers, ResponseParser, ResponseType, RetryPolicy, SearchParams,
};

/// The logical description of a request.
///
/// A config is assembled with chainable setters, merged with the client's
/// base config, transformed by the request-interceptor chain, and then
/// treated as immutable: every retry attempt reuses the same resolved config.
#[derive(Clone, Default)]
pub struct RequestConfig {
    /// HTTP method, including extension verbs.
    pub method: http::Method,
    /// Target URL: absolute, or a path joined with `base_url`.
    pub url: Option<String>,
    /// Base URL for relative targets.
    pub base_url: Option<Url>,
    /// Ordered, case-insensitive headers.
    pub headers: Headers,
    /// Normalized request body.
    pub body: Option<Body>,
    /// Query parameters applied at dispatch.
    pub search_params: Option<SearchParams>,
    /// Attempt timeout; `None` or zero disables the timer.
    pub timeout: Option<Duration>,
    /// Retry policy; absent means no retries.
    pub retry: Option<RetryPolicy>,
    /// Built-in response parsing mode.
    pub response_type: Option<ResponseType>,
    /// Custom response parser; wins over `response_type` when set.
    pub response_parser: Option<Arc<dyn ResponseParser>>,
    /// Caller-supplied cancellation token.
    pub cancel: Option<CancelToken>,
    /// Transport selection.
    pub adapter: Adapter,
    /// Opaque transport-specific extensions, forwarded uninterpreted.
    pub extensions: HashMap<String, serde_json::Value>,
}

impl std::fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestConfig")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("response_type", &self.response_type)
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

impl RequestConfig {
    /// Creates a config targeting `url` with the given method.
    #[must_use]
    pub fn new(method: http::Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Creates a base config rooted at `base_url`, suitable as client
    /// defaults.
    #[must_use]
    pub fn base(base_url: Url) -> Self {
        Self {
            base_url: Some(base_url),
            ..Self::default()
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets a header (case-insensitive, last-write-wins).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the query parameters.
    #[must_use]
    pub fn with_search_params(mut self, params: SearchParams) -> Self {
        self.search_params = Some(params);
        self
    }

    /// Sets the attempt timeout. Zero disables the timer.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Sets the built-in response parsing mode.
    #[must_use]
    pub const fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Installs a custom response parser.
    #[must_use]
    pub fn with_response_parser(mut self, parser: Arc<dyn ResponseParser>) -> Self {
        self.response_parser = Some(parser);
        self
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Selects the transport.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Adapter) -> Self {
        self.adapter = adapter;
        self
    }

    /// Adds an opaque transport extension.
    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    /// The attempt timeout with zero normalized away.
    #[must_use]
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }

    /// Produces the effective config for a call: per-call fields win where
    /// set, headers and extensions overlay entry-wise, everything else falls
    /// back to the base.
    #[must_use]
    pub fn merge(base: &Self, call: Self) -> Self {
        let mut headers = base.headers.clone();
        headers.merge(&call.headers);

        let mut extensions = base.extensions.clone();
        extensions.extend(call.extensions);

        Self {
            method: call.method,
            url: call.url.or_else(|| base.url.clone()),
            base_url: call.base_url.or_else(|| base.base_url.clone()),
            headers,
            body: call.body.or_else(|| base.body.clone()),
            search_params: call.search_params.or_else(|| base.search_params.clone()),
            timeout: call.timeout.or(base.timeout),
            retry: call.retry.or_else(|| base.retry.clone()),
            response_type: call.response_type.or(base.response_type),
            response_parser: call
                .response_parser
                .or_else(|| base.response_parser.clone()),
            cancel: call.cancel.or_else(|| base.cancel.clone()),
            adapter: if call.adapter.is_default() {
                base.adapter.clone()
            } else {
                call.adapter
            },
            extensions,
        }
    }
}
