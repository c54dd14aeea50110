//! The dispatcher: one network attempt.
//!
//! Each call runs the full attempt sequence — pre-abort check, URL
//! resolution, header preparation, adapter resolution, the transport call
//! raced against the cancellation scope, status classification, and the
//! parser hand-off. Abort attribution comes exclusively from the scope's
//! recorded reason; the transport future is simply dropped on abort.

use std::sync::Arc;

use courier_core::{
    Adapter, Error, RawResponse, RequestConfig, ResponseConfig, Result, Transport,
    TransportRequest,
};
use tracing::{debug, warn};
use url::Url;

use crate::scope::CancelScope;
use crate::transport::HyperTransport;

pub(crate) struct Dispatcher {
    default_transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub(crate) fn new(default_transport: Arc<dyn Transport>) -> Self {
        Self { default_transport }
    }

    /// Runs one attempt against the resolved config.
    pub(crate) async fn dispatch(
        &self,
        config: &RequestConfig,
        attempt: u32,
    ) -> Result<ResponseConfig> {
        let scope = CancelScope::arm(config.effective_timeout(), config.cancel.clone());
        if let Some(reason) = scope.pre_aborted() {
            warn!(attempt, "request aborted before dispatch");
            return Err(reason.into_error().with_request(config.clone()));
        }

        let prepared = prepare(config).and_then(|request| {
            let transport = self.resolve_adapter(&config.adapter)?;
            Ok((request, transport))
        });
        let (request, transport) = match prepared {
            Ok(parts) => parts,
            Err(error) => {
                scope.complete();
                return Err(error.with_request(config.clone()));
            }
        };

        debug!(attempt, method = %request.method, url = %request.url, "dispatching");
        let outcome = {
            let call = transport.perform(request);
            let abort = scope.aborted();
            tokio::pin!(call, abort);
            tokio::select! {
                result = &mut call => result,
                reason = &mut abort => {
                    warn!(attempt, ?reason, "attempt aborted");
                    Err(reason.into_error())
                }
            }
        };
        scope.complete();

        match outcome {
            Ok(raw) => classify(raw, config),
            Err(error) => Err(error.with_request(config.clone())),
        }
    }

    fn resolve_adapter(&self, adapter: &Adapter) -> Result<Arc<dyn Transport>> {
        match adapter {
            Adapter::Default => Ok(Arc::clone(&self.default_transport)),
            Adapter::Named(name) if name == HyperTransport::NAME => {
                Ok(Arc::clone(&self.default_transport))
            }
            Adapter::Named(name) => Err(Error::bad_config(format!("unknown adapter {name:?}"))),
            Adapter::Custom(transport) => Ok(Arc::clone(transport)),
        }
    }
}

/// Resolves the target URL: an absolute `url` wins outright; a relative one
/// joins the base with exactly one separating slash.
fn resolve_url(config: &RequestConfig) -> Result<Url> {
    let mut url = match (&config.url, &config.base_url) {
        (Some(target), base) => match Url::parse(target) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let Some(base) = base else {
                    return Err(Error::bad_config_value(format!(
                        "relative URL {target:?} with no base URL configured"
                    )));
                };
                let joined = format!(
                    "{}/{}",
                    base.as_str().trim_end_matches('/'),
                    target.trim_start_matches('/')
                );
                Url::parse(&joined).map_err(|e| Error::invalid_url(format!("{joined}: {e}")))?
            }
            Err(e) => return Err(Error::invalid_url(format!("{target}: {e}"))),
        },
        (None, Some(base)) => base.clone(),
        (None, None) => return Err(Error::bad_config_value("no URL configured")),
    };

    if let Some(params) = &config.search_params {
        params.apply(&mut url);
    }
    Ok(url)
}

/// Turns the resolved config into a transport request. The body's inferred
/// content type becomes a `Content-Type` header only when the caller has
/// not set one.
fn prepare(config: &RequestConfig) -> Result<TransportRequest> {
    let url = resolve_url(config)?;
    let mut headers = config.headers.to_header_map()?;

    let body = config.body.as_ref().map(|body| {
        if !headers.contains_key(http::header::CONTENT_TYPE)
            && let Some(content_type) = body.content_type()
        {
            headers.insert(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static(content_type.as_str()),
            );
        }
        body.as_bytes().clone()
    });

    Ok(TransportRequest {
        method: config.method.clone(),
        url,
        headers,
        body,
        extensions: config.extensions.clone(),
    })
}

/// Maps the raw response to the pipeline outcome: 2xx parses, 4xx is a
/// request error, everything else a response error. The body is read once
/// and kept on the error for diagnostics.
fn classify(raw: RawResponse, config: &RequestConfig) -> Result<ResponseConfig> {
    let status = raw.status;
    if status.is_success() {
        let parsed = match &config.response_parser {
            Some(parser) => parser.parse(&raw),
            None => config.response_type.unwrap_or_default().parse(&raw),
        };
        return match parsed {
            Ok(data) => Ok(ResponseConfig::new(raw, data, config.clone())),
            Err(error) => Err(error
                .with_request(config.clone())
                .with_response(ResponseConfig::unparsed(raw, config.clone()))),
        };
    }

    let error = if status.is_client_error() {
        Error::bad_request(status.as_u16())
    } else {
        Error::bad_response_status(status.as_u16())
    };
    Err(error
        .with_request(config.clone())
        .with_response(ResponseConfig::unparsed(raw, config.clone())))
}

#[cfg(test)]
mod tests {
    use courier_core::SearchParams;

    use super::*;

    fn with_base(url: &str) -> RequestConfig {
        RequestConfig::new(http::Method::GET, url)
            .with_base_url(Url::parse("https://api.example.com/v1").expect("valid URL"))
    }

    #[test]
    fn absolute_url_wins_over_base() {
        let url = resolve_url(&with_base("https://other.example.com/x")).expect("resolves");
        assert_eq!(url.as_str(), "https://other.example.com/x");
    }

    #[test]
    fn join_uses_exactly_one_slash() {
        for target in ["/users", "users"] {
            let url = resolve_url(&with_base(target)).expect("resolves");
            assert_eq!(url.as_str(), "https://api.example.com/v1/users");
        }

        let mut config = with_base("/users");
        config.base_url = Some(Url::parse("https://api.example.com/v1/").expect("valid URL"));
        let url = resolve_url(&config).expect("resolves");
        assert_eq!(url.as_str(), "https://api.example.com/v1/users");
    }

    #[test]
    fn relative_url_without_base_is_bad_config_value() {
        let config = RequestConfig::new(http::Method::GET, "/users");
        let err = resolve_url(&config).expect_err("no base");
        assert_eq!(err.code(), "ERR_BAD_CONFIG_VALUE");
    }

    #[test]
    fn malformed_url_is_invalid_url() {
        let config = RequestConfig::new(http::Method::GET, "https://exa mple.com/x");
        let err = resolve_url(&config).expect_err("malformed");
        assert_eq!(err.code(), "ERR_INVALID_URL");
    }

    #[test]
    fn no_url_at_all_is_bad_config_value() {
        let err = resolve_url(&RequestConfig::default()).expect_err("nothing to resolve");
        assert_eq!(err.code(), "ERR_BAD_CONFIG_VALUE");
    }

    #[test]
    fn search_params_are_applied() {
        let config = with_base("/users")
            .with_search_params(SearchParams::new().append("page", 2).append("tag", "a"));
        let url = resolve_url(&config).expect("resolves");
        assert_eq!(url.as_str(), "https://api.example.com/v1/users?page=2&tag=a");
    }

    #[test]
    fn content_type_injected_only_when_absent() {
        let body = courier_core::Body::json(&serde_json::json!({"a": 1})).expect("serializable");

        let config = with_base("/x").with_body(body.clone());
        let request = prepare(&config).expect("prepares");
        assert_eq!(
            request
                .headers
                .get(http::header::CONTENT_TYPE)
                .map(http::HeaderValue::as_bytes),
            Some(&b"application/json"[..])
        );

        let config = with_base("/x")
            .with_header("Content-Type", "application/vnd.custom+json")
            .with_body(body);
        let request = prepare(&config).expect("prepares");
        assert_eq!(
            request
                .headers
                .get(http::header::CONTENT_TYPE)
                .map(http::HeaderValue::as_bytes),
            Some(&b"application/vnd.custom+json"[..])
        );
    }

    #[test]
    fn classify_maps_statuses() {
        let config = RequestConfig::default();
        let raw = |status: u16| {
            RawResponse::new(
                http::StatusCode::from_u16(status).expect("valid status"),
                http::HeaderMap::new(),
                bytes::Bytes::from_static(b"body"),
            )
        };

        let err = classify(raw(404), &config).expect_err("client error");
        assert_eq!(err.code(), "ERR_BAD_REQUEST");
        assert_eq!(err.status(), Some(404));
        assert!(err.response().is_some());

        let err = classify(raw(503), &config).expect_err("server error");
        assert_eq!(err.code(), "ERR_BAD_RESPONSE");
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn unknown_adapter_name_fails_fast() {
        let dispatcher = Dispatcher::new(Arc::new(crate::transport::HyperTransport::default()));
        let config = RequestConfig::new(http::Method::GET, "https://api.example.com/x")
            .with_adapter(Adapter::named("curl"));
        let err = dispatcher.dispatch(&config, 0).await.expect_err("unknown adapter");
        assert_eq!(err.code(), "ERR_BAD_CONFIG");
    }
}
