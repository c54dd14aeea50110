//! The built-in hyper transport.
//!
//! One network exchange per [`Transport::perform`] call: build the hyper
//! request, send it over the pooled legacy client, buffer the body. The
//! transport never applies timeouts and never classifies aborts; the
//! dispatcher races it against the attempt's cancellation scope and drops
//! the future on abort.

use std::time::Duration;

use bytes::Bytes;
use courier_core::{Error, RawResponse, Result, Transport, TransportRequest};
use futures_util::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use crate::connector::https_connector;

/// Connection-pool tuning for the built-in transport.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Maximum idle connections kept per host.
    pub idle_per_host: usize,
    /// How long an idle connection is kept around.
    pub idle_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            idle_per_host: 32,
            idle_timeout: Duration::from_secs(90),
        }
    }
}

/// The built-in transport, registered as the default adapter and under the
/// name `"hyper"`.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Adapter name this transport is registered under.
    pub const NAME: &'static str = "hyper";

    /// Creates a transport with the given pool tuning.
    #[must_use]
    pub fn new(pool: &PoolOptions) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(pool.idle_timeout)
            .pool_max_idle_per_host(pool.idle_per_host)
            .build(https_connector());
        Self { client }
    }

    fn build_request(request: TransportRequest) -> Result<http::Request<Full<Bytes>>> {
        let mut builder = http::Request::builder()
            .method(request.method)
            .uri(request.url.as_str());

        if let Some(headers) = builder.headers_mut() {
            headers.extend(request.headers);
        }

        let body = request.body.map_or_else(Full::default, Full::new);
        builder
            .body(body)
            .map_err(|e| Error::bad_config_value(e.to_string()))
    }

    fn map_send_error(error: &hyper_util::client::legacy::Error) -> Error {
        Error::network(error.to_string())
    }

    async fn exchange(&self, request: TransportRequest) -> Result<RawResponse> {
        debug!(url = %request.url, method = %request.method, "transport exchange");
        let hyper_request = Self::build_request(request)?;

        let response = self
            .client
            .request(hyper_request)
            .await
            .map_err(|e| Self::map_send_error(&e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::network(e.to_string()))?
            .to_bytes();

        Ok(RawResponse::new(status, headers, body))
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(&PoolOptions::default())
    }
}

impl Transport for HyperTransport {
    fn perform(&self, request: TransportRequest) -> BoxFuture<'_, Result<RawResponse>> {
        Box::pin(self.exchange(request))
    }
}
