//! Error types for courier.

use derive_more::{Display, Error};

use crate::{RequestConfig, ResponseConfig};

/// Main error type for courier operations.
///
/// Every failure surfaced by the pipeline carries a stable [`code`](Error::code)
/// and, where available, the originating request config and/or response config
/// for diagnostics.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// Malformed adapter selection or a pipeline contract violation.
    #[display("bad configuration: {message}")]
    BadConfig {
        /// Error message.
        message: String,
    },

    /// A required configuration value is missing or unusable.
    #[display("bad configuration value: {message}")]
    BadConfigValue {
        /// Error message.
        message: String,
    },

    /// URL construction or parsing failure.
    #[display("invalid URL: {message}")]
    InvalidUrl {
        /// Error message.
        message: String,
    },

    /// The attempt was aborted by the internal timeout timer.
    #[display("request timed out")]
    Timedout {
        /// Originating request config, if available.
        config: Option<Box<RequestConfig>>,
    },

    /// The attempt was aborted by the caller-supplied cancellation token.
    #[display("request canceled")]
    Canceled {
        /// Originating request config, if available.
        config: Option<Box<RequestConfig>>,
    },

    /// Transport-level failure not attributable to an abort.
    #[display("network error: {message}")]
    Network {
        /// Error message.
        message: String,
        /// Originating request config, if available.
        config: Option<Box<RequestConfig>>,
    },

    /// HTTP 4xx response.
    #[display("HTTP client error {status}")]
    BadRequest {
        /// HTTP status code.
        status: u16,
        /// Originating request config, if available.
        config: Option<Box<RequestConfig>>,
        /// Response carrying the diagnostic body.
        response: Option<Box<ResponseConfig>>,
    },

    /// HTTP non-2xx/non-4xx response, or a response-body parse failure.
    #[display("bad response: {message}")]
    BadResponse {
        /// Error message.
        message: String,
        /// HTTP status code, when status-driven.
        status: Option<u16>,
        /// Originating request config, if available.
        config: Option<Box<RequestConfig>>,
        /// Response context, possibly partially constructed.
        response: Option<Box<ResponseConfig>>,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bad-configuration error.
    #[must_use]
    pub fn bad_config(message: impl Into<String>) -> Self {
        Self::BadConfig {
            message: message.into(),
        }
    }

    /// Create a missing-configuration-value error.
    #[must_use]
    pub fn bad_config_value(message: impl Into<String>) -> Self {
        Self::BadConfigValue {
            message: message.into(),
        }
    }

    /// Create an invalid-URL error.
    #[must_use]
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timed_out() -> Self {
        Self::Timedout { config: None }
    }

    /// Create a cancellation error.
    #[must_use]
    pub fn canceled() -> Self {
        Self::Canceled { config: None }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            config: None,
        }
    }

    /// Create an HTTP 4xx error.
    #[must_use]
    pub fn bad_request(status: u16) -> Self {
        Self::BadRequest {
            status,
            config: None,
            response: None,
        }
    }

    /// Create a bad-response error from a message (e.g. a parse failure).
    #[must_use]
    pub fn bad_response(message: impl Into<String>) -> Self {
        Self::BadResponse {
            message: message.into(),
            status: None,
            config: None,
            response: None,
        }
    }

    /// Create a status-driven bad-response error.
    #[must_use]
    pub fn bad_response_status(status: u16) -> Self {
        Self::BadResponse {
            message: format!("HTTP status {status}"),
            status: Some(status),
            config: None,
            response: None,
        }
    }

    /// Attach the originating request config, for variants that carry one.
    #[must_use]
    pub fn with_request(mut self, request: RequestConfig) -> Self {
        match &mut self {
            Self::Timedout { config }
            | Self::Canceled { config }
            | Self::Network { config, .. }
            | Self::BadRequest { config, .. }
            | Self::BadResponse { config, .. } => *config = Some(Box::new(request)),
            Self::BadConfig { .. } | Self::BadConfigValue { .. } | Self::InvalidUrl { .. } => {}
        }
        self
    }

    /// Attach the response context, for variants that carry one.
    #[must_use]
    pub fn with_response(mut self, ctx: ResponseConfig) -> Self {
        match &mut self {
            Self::BadRequest { response, .. } => *response = Some(Box::new(ctx)),
            Self::BadResponse {
                status, response, ..
            } => {
                if status.is_none() {
                    *status = Some(ctx.status.as_u16());
                }
                *response = Some(Box::new(ctx));
            }
            _ => {}
        }
        self
    }

    /// Stable error code for this kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadConfig { .. } => "ERR_BAD_CONFIG",
            Self::BadConfigValue { .. } => "ERR_BAD_CONFIG_VALUE",
            Self::InvalidUrl { .. } => "ERR_INVALID_URL",
            Self::Timedout { .. } => "ETIMEDOUT",
            Self::Canceled { .. } => "ERR_CANCELED",
            Self::Network { .. } => "ERR_NETWORK",
            Self::BadRequest { .. } => "ERR_BAD_REQUEST",
            Self::BadResponse { .. } => "ERR_BAD_RESPONSE",
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timedout { .. })
    }

    /// Returns `true` if this is a cancellation error.
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled { .. })
    }

    /// Returns `true` if this is a network error.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Returns the HTTP status code if this error is status-driven.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { status, .. } => Some(*status),
            Self::BadResponse { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// The originating request config, if this error carries one.
    #[must_use]
    pub fn request(&self) -> Option<&RequestConfig> {
        match self {
            Self::Timedout { config }
            | Self::Canceled { config }
            | Self::Network { config, .. }
            | Self::BadRequest { config, .. }
            | Self::BadResponse { config, .. } => config.as_deref(),
            Self::BadConfig { .. } | Self::BadConfigValue { .. } | Self::InvalidUrl { .. } => None,
        }
    }

    /// The response context, if this error carries one.
    #[must_use]
    pub fn response(&self) -> Option<&ResponseConfig> {
        match self {
            Self::BadRequest { response, .. } | Self::BadResponse { response, .. } => {
                response.as_deref()
            }
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::invalid_url(err.to_string())
    }
}
