//! The client: call surface, interceptor chains, retry loop, pause gate.

use std::sync::Arc;
use std::time::Duration;

use courier_core::{
    Adapter, Body, Error, Method, RequestConfig, ResponseConfig, ResponseType, Result,
    RetryPolicy,
};
use tracing::{debug, warn};
use url::Url;

use crate::dispatch::Dispatcher;
use crate::gate::Gate;
use crate::interceptor::{InterceptorSet, RequestInterceptor, ResponseInterceptor};
use crate::transport::{HyperTransport, PoolOptions};

/// The client's interceptor registries.
///
/// ```ignore
/// client.interceptors().request.add(RequestInterceptor::new(|config| async move {
///     Ok(config.with_header("authorization", "Bearer ..."))
/// }));
/// ```
#[derive(Debug, Default)]
pub struct Interceptors {
    /// Runs over the merged config before dispatch, in insertion order.
    pub request: InterceptorSet<RequestInterceptor>,
    /// Runs over the dispatch outcome; see the chain semantics on
    /// [`InterceptorSet`].
    pub response: InterceptorSet<ResponseInterceptor>,
}

struct ClientInner {
    defaults: RequestConfig,
    dispatcher: Dispatcher,
    interceptors: Interceptors,
    gate: Gate,
}

/// An HTTP request pipeline: merged config, interceptor chains, cancellation
/// composition, retries, and a pluggable transport.
///
/// Cloning is cheap and shares the interceptors, the gate, and the
/// connection pool.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("defaults", &self.inner.defaults)
            .field("interceptors", &self.inner.interceptors)
            .finish_non_exhaustive()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a client builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The interceptor registries.
    #[must_use]
    pub fn interceptors(&self) -> &Interceptors {
        &self.inner.interceptors
    }

    /// Parks requests that have not yet entered the pipeline. In-flight
    /// requests are unaffected.
    pub fn lock(&self) {
        self.inner.gate.lock();
    }

    /// Releases parked requests in arrival order.
    pub fn unlock(&self) {
        self.inner.gate.unlock();
    }

    /// Whether the gate is currently locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.inner.gate.is_locked()
    }

    /// Runs a request through the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error as (possibly) transformed by the response
    /// interceptor chain. Request-chain failures surface directly: no
    /// dispatch, no retries, no response error chain.
    pub async fn request(&self, config: RequestConfig) -> Result<ResponseConfig> {
        self.inner.gate.admitted().await;

        let merged = RequestConfig::merge(&self.inner.defaults, config);
        let resolved = self.inner.interceptors.request.run(merged).await?;

        match self.execute_with_retries(resolved).await {
            Ok(response) => self.inner.interceptors.response.run_success(response).await,
            Err(error) => self.inner.interceptors.response.run_error(error).await,
        }
    }

    /// Runs a request with an extension verb.
    pub async fn request_with(
        &self,
        method: Method,
        url: impl Into<String>,
    ) -> Result<ResponseConfig> {
        self.request(RequestConfig::new(method, url)).await
    }

    /// `GET` shorthand.
    pub async fn get(&self, url: impl Into<String>) -> Result<ResponseConfig> {
        self.request(RequestConfig::new(Method::GET, url)).await
    }

    /// `POST` shorthand with a body.
    pub async fn post(&self, url: impl Into<String>, body: Body) -> Result<ResponseConfig> {
        self.request(RequestConfig::new(Method::POST, url).with_body(body))
            .await
    }

    /// `PUT` shorthand with a body.
    pub async fn put(&self, url: impl Into<String>, body: Body) -> Result<ResponseConfig> {
        self.request(RequestConfig::new(Method::PUT, url).with_body(body))
            .await
    }

    /// `PATCH` shorthand with a body.
    pub async fn patch(&self, url: impl Into<String>, body: Body) -> Result<ResponseConfig> {
        self.request(RequestConfig::new(Method::PATCH, url).with_body(body))
            .await
    }

    /// `DELETE` shorthand.
    pub async fn delete(&self, url: impl Into<String>) -> Result<ResponseConfig> {
        self.request(RequestConfig::new(Method::DELETE, url)).await
    }

    /// `HEAD` shorthand.
    pub async fn head(&self, url: impl Into<String>) -> Result<ResponseConfig> {
        self.request(RequestConfig::new(Method::HEAD, url)).await
    }

    /// `OPTIONS` shorthand.
    pub async fn options(&self, url: impl Into<String>) -> Result<ResponseConfig> {
        self.request(RequestConfig::new(Method::OPTIONS, url)).await
    }

    /// The retry controller: at most `attempts + 1` dispatches of the same
    /// resolved config, with policy-computed delays in between.
    async fn execute_with_retries(&self, config: RequestConfig) -> Result<ResponseConfig> {
        let policy = config.retry.clone().unwrap_or_default();
        let max_attempts = policy.max_attempts();
        let mut attempt = 0;
        loop {
            match self.inner.dispatcher.dispatch(&config, attempt).await {
                Ok(response) => {
                    debug!(attempt, status = response.status.as_u16(), "request complete");
                    return Ok(response);
                }
                Err(error) => {
                    if attempt >= max_attempts || !policy.should_retry(&error, attempt) {
                        return Err(error);
                    }
                    let delay = policy.delay_for(attempt);
                    warn!(
                        attempt,
                        code = error.code(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "retrying request"
                    );
                    self.backoff(&config, delay).await?;
                    attempt += 1;
                }
            }
        }
    }

    /// Sleeps the computed delay, cut short by a user cancellation.
    async fn backoff(&self, config: &RequestConfig, delay: Duration) -> Result<()> {
        if delay.is_zero() {
            return Ok(());
        }
        match &config.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => Err(Error::canceled().with_request(config.clone())),
                    () = tokio::time::sleep(delay) => Ok(()),
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

/// Builder for [`Client`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    defaults: RequestConfig,
    pool: PoolOptions,
}

impl ClientBuilder {
    /// Sets the base URL joined with relative request targets.
    #[must_use]
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.defaults.base_url = Some(base_url);
        self
    }

    /// Adds a header sent with every request (per-call headers override).
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.headers.insert(name, value);
        self
    }

    /// Sets the default attempt timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = Some(timeout);
        self
    }

    /// Sets the default retry policy.
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.defaults.retry = Some(policy);
        self
    }

    /// Sets the default response parsing mode.
    #[must_use]
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.defaults.response_type = Some(response_type);
        self
    }

    /// Sets the default transport.
    #[must_use]
    pub fn adapter(mut self, adapter: Adapter) -> Self {
        self.defaults.adapter = adapter;
        self
    }

    /// Maximum idle connections per host for the built-in transport.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool.idle_per_host = count;
        self
    }

    /// Idle connection timeout for the built-in transport.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool.idle_timeout = timeout;
        self
    }

    /// Builds the client.
    #[must_use]
    pub fn build(self) -> Client {
        let transport = Arc::new(HyperTransport::new(&self.pool));
        Client {
            inner: Arc::new(ClientInner {
                defaults: self.defaults,
                dispatcher: Dispatcher::new(transport),
                interceptors: Interceptors::default(),
                gate: Gate::default(),
            }),
        }
    }
}
