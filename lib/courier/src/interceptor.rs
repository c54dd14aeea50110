//! Interceptor chains.
//!
//! Registration is arena-style: every entry gets a stable, monotonically
//! increasing [`InterceptorId`]; ejecting nulls the slot in place so the
//! remaining ids keep their positions, and clearing bumps the id base so
//! ids are never reused. Chain execution reads the live collection at each
//! step, so a `clear()` racing an in-flight request may shorten that
//! request's chain.

use std::future::Future;
use std::sync::{Arc, Mutex};

use courier_core::{Error, RequestConfig, ResponseConfig, Result};
use futures_util::future::BoxFuture;
use tracing::debug;

/// Stable handle to a registered interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorId(u64);

type Fulfilled<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<T>> + Send + Sync>;
type Rejected<T> = Arc<dyn Fn(Error) -> BoxFuture<'static, Result<T>> + Send + Sync>;
type RunWhen = Arc<dyn Fn(&RequestConfig) -> bool + Send + Sync>;

/// A request-chain entry: transforms the outgoing config, optionally
/// handles failures from earlier entries, optionally gated per request.
pub struct RequestInterceptor {
    on_fulfilled: Option<Fulfilled<RequestConfig>>,
    on_rejected: Option<Rejected<RequestConfig>>,
    run_when: Option<RunWhen>,
}

impl RequestInterceptor {
    /// Creates an entry from a config-transforming handler.
    pub fn new<F, Fut>(on_fulfilled: F) -> Self
    where
        F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RequestConfig>> + Send + 'static,
    {
        Self {
            on_fulfilled: Some(Arc::new(move |config| Box::pin(on_fulfilled(config)))),
            on_rejected: None,
            run_when: None,
        }
    }

    /// Creates a rejection-only entry; successes pass through untouched.
    pub fn from_rejected<F, Fut>(on_rejected: F) -> Self
    where
        F: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RequestConfig>> + Send + 'static,
    {
        Self {
            on_fulfilled: None,
            on_rejected: Some(Arc::new(move |error| Box::pin(on_rejected(error)))),
            run_when: None,
        }
    }

    /// Attaches a rejection handler for failures from earlier entries.
    #[must_use]
    pub fn on_rejected<F, Fut>(mut self, on_rejected: F) -> Self
    where
        F: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RequestConfig>> + Send + 'static,
    {
        self.on_rejected = Some(Arc::new(move |error| Box::pin(on_rejected(error))));
        self
    }

    /// Gates the fulfilled handler per request. The predicate sees the
    /// config as transformed by earlier entries; a `false` skips only the
    /// fulfilled handler.
    #[must_use]
    pub fn when(mut self, predicate: impl Fn(&RequestConfig) -> bool + Send + Sync + 'static) -> Self {
        self.run_when = Some(Arc::new(predicate));
        self
    }
}

impl std::fmt::Debug for RequestInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestInterceptor")
            .field("has_fulfilled", &self.on_fulfilled.is_some())
            .field("has_rejected", &self.on_rejected.is_some())
            .field("has_run_when", &self.run_when.is_some())
            .finish()
    }
}

/// A response-chain entry: transforms the successful response, optionally
/// handles (and may recover from) failures.
pub struct ResponseInterceptor {
    on_fulfilled: Option<Fulfilled<ResponseConfig>>,
    on_rejected: Option<Rejected<ResponseConfig>>,
}

impl ResponseInterceptor {
    /// Creates an entry from a response-transforming handler.
    pub fn new<F, Fut>(on_fulfilled: F) -> Self
    where
        F: Fn(ResponseConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResponseConfig>> + Send + 'static,
    {
        Self {
            on_fulfilled: Some(Arc::new(move |response| Box::pin(on_fulfilled(response)))),
            on_rejected: None,
        }
    }

    /// Creates a rejection-only entry; successes pass through untouched.
    /// Returning `Ok` from the handler recovers the pipeline.
    pub fn from_rejected<F, Fut>(on_rejected: F) -> Self
    where
        F: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResponseConfig>> + Send + 'static,
    {
        Self {
            on_fulfilled: None,
            on_rejected: Some(Arc::new(move |error| Box::pin(on_rejected(error)))),
        }
    }

    /// Attaches a rejection handler.
    #[must_use]
    pub fn on_rejected<F, Fut>(mut self, on_rejected: F) -> Self
    where
        F: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResponseConfig>> + Send + 'static,
    {
        self.on_rejected = Some(Arc::new(move |error| Box::pin(on_rejected(error))));
        self
    }
}

impl std::fmt::Debug for ResponseInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseInterceptor")
            .field("has_fulfilled", &self.on_fulfilled.is_some())
            .field("has_rejected", &self.on_rejected.is_some())
            .finish()
    }
}

struct Slots<T> {
    entries: Vec<Option<Arc<T>>>,
    base: u64,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            base: 0,
        }
    }
}

/// A registry of interceptors with stable ids.
pub struct InterceptorSet<T> {
    slots: Mutex<Slots<T>>,
}

impl<T> Default for InterceptorSet<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
        }
    }
}

impl<T> std::fmt::Debug for InterceptorSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.lock();
        f.debug_struct("InterceptorSet")
            .field("slots", &slots.entries.len())
            .field("base", &slots.base)
            .finish()
    }
}

impl<T> InterceptorSet<T> {
    /// Registers an interceptor and returns its stable id.
    pub fn add(&self, interceptor: T) -> InterceptorId {
        let mut slots = self.lock();
        let id = slots.base + slots.entries.len() as u64;
        slots.entries.push(Some(Arc::new(interceptor)));
        InterceptorId(id)
    }

    /// Removes an interceptor by id, nulling its slot in place so the
    /// remaining entries keep their positions. Unknown or already-ejected
    /// ids are a no-op.
    pub fn eject(&self, id: InterceptorId) -> bool {
        let mut slots = self.lock();
        let Some(position) = id.0.checked_sub(slots.base) else {
            return false;
        };
        let Ok(position) = usize::try_from(position) else {
            return false;
        };
        match slots.entries.get_mut(position) {
            Some(slot) => slot.take().is_some(),
            None => false,
        }
    }

    /// Removes every interceptor. Previously issued ids stay dead: the id
    /// base advances past them so they are never reused.
    pub fn clear(&self) {
        let mut slots = self.lock();
        slots.base += slots.entries.len() as u64;
        slots.entries.clear();
    }

    /// Number of live (non-ejected) entries.
    pub fn len(&self) -> usize {
        self.lock().entries.iter().flatten().count()
    }

    /// Whether the set has no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_count(&self) -> usize {
        self.lock().entries.len()
    }

    fn get(&self, position: usize) -> Option<Arc<T>> {
        self.lock().entries.get(position).cloned().flatten()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots<T>> {
        self.slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl InterceptorSet<RequestInterceptor> {
    /// Runs the request chain in insertion order, promise-style: a stage's
    /// rejection handler sees failures produced by earlier stages only.
    pub(crate) async fn run(&self, config: RequestConfig) -> Result<RequestConfig> {
        let mut state = Ok(config);
        let mut position = 0;
        // Bound and slots are re-read each step: the live collection rules.
        while position < self.slot_count() {
            let entry = self.get(position);
            position += 1;
            let Some(entry) = entry else { continue };
            state = match state {
                Ok(config) => {
                    if entry.run_when.as_ref().is_some_and(|gate| !gate(&config)) {
                        debug!(position, "request interceptor gated off");
                        Ok(config)
                    } else {
                        match &entry.on_fulfilled {
                            Some(fulfilled) => fulfilled(config).await,
                            None => Ok(config),
                        }
                    }
                }
                Err(error) => match &entry.on_rejected {
                    Some(rejected) => rejected(error).await,
                    None => Err(error),
                },
            };
        }
        state
    }
}

impl InterceptorSet<ResponseInterceptor> {
    /// Runs the response chain over a successful dispatch, forward
    /// promise-style.
    pub(crate) async fn run_success(&self, response: ResponseConfig) -> Result<ResponseConfig> {
        self.walk_forward(Ok(response), 0, usize::MAX).await
    }

    /// Runs the response chain over a dispatch error: rejection handlers
    /// are walked in reverse insertion order. A handler returning `Ok`
    /// recovers the pipeline, and the entries the reverse walk had not yet
    /// visited consume the recovered response through their fulfilled
    /// handlers in insertion order.
    pub(crate) async fn run_error(&self, error: Error) -> Result<ResponseConfig> {
        let mut error = error;
        let mut position = self.slot_count();
        while position > 0 {
            position -= 1;
            let Some(entry) = self.get(position) else {
                continue;
            };
            let Some(rejected) = entry.on_rejected.clone() else {
                continue;
            };
            match rejected(error).await {
                Ok(response) => {
                    debug!(position, "response interceptor recovered the pipeline");
                    return self.walk_forward(Ok(response), 0, position).await;
                }
                Err(next) => error = next,
            }
        }
        Err(error)
    }

    async fn walk_forward(
        &self,
        mut state: Result<ResponseConfig>,
        start: usize,
        stop: usize,
    ) -> Result<ResponseConfig> {
        let mut position = start;
        while position < stop.min(self.slot_count()) {
            let entry = self.get(position);
            position += 1;
            let Some(entry) = entry else { continue };
            state = match state {
                Ok(response) => match &entry.on_fulfilled {
                    Some(fulfilled) => fulfilled(response).await,
                    None => Ok(response),
                },
                Err(error) => match &entry.on_rejected {
                    Some(rejected) => rejected(error).await,
                    None => Err(error),
                },
            };
        }
        state
    }
}
