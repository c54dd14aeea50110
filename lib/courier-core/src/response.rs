//! Response handling: parsed data, pluggable parsers, and the response
//! config handed back to the caller.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::{RawResponse, RequestConfig, Result, from_json};

/// Built-in response parsing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    /// Parse the body as a JSON document (the default). An empty body
    /// parses to [`ResponseData::None`].
    #[default]
    Json,
    /// Decode the body as UTF-8 text.
    Text,
    /// Keep the raw bytes.
    Bytes,
}

/// Parsed response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// No payload (empty body, HEAD response).
    None,
    /// Raw bytes.
    Bytes(Bytes),
    /// Decoded text.
    Text(String),
    /// Parsed JSON document.
    Json(serde_json::Value),
}

impl ResponseData {
    /// The parsed JSON document, if this is JSON data.
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The decoded text, if this is text data.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The raw bytes, if this is byte data.
    #[must_use]
    pub const fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns `true` when no payload was parsed.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// A pluggable response parser.
///
/// The dispatcher invokes exactly one parser per successful response: the
/// config's custom parser when set, otherwise the built-in parser for the
/// configured [`ResponseType`].
pub trait ResponseParser: Send + Sync {
    /// Parses the raw response into structured data.
    ///
    /// # Errors
    ///
    /// Returns a bad-response error when the body cannot be parsed.
    fn parse(&self, raw: &RawResponse) -> Result<ResponseData>;
}

impl ResponseType {
    /// Parses the raw body according to this mode.
    ///
    /// # Errors
    ///
    /// Returns a bad-response error when the body cannot be parsed.
    pub fn parse(self, raw: &RawResponse) -> Result<ResponseData> {
        match self {
            Self::Json => {
                if raw.body.is_empty() {
                    return Ok(ResponseData::None);
                }
                let value = serde_json::from_slice(&raw.body).map_err(|e| {
                    crate::Error::bad_response(format!("JSON parse error: {e}"))
                })?;
                Ok(ResponseData::Json(value))
            }
            Self::Text => {
                let text = std::str::from_utf8(&raw.body)
                    .map_err(|e| crate::Error::bad_response(format!("invalid UTF-8 body: {e}")))?;
                Ok(ResponseData::Text(text.to_owned()))
            }
            Self::Bytes => Ok(ResponseData::Bytes(raw.body.clone())),
        }
    }
}

impl ResponseParser for ResponseType {
    fn parse(&self, raw: &RawResponse) -> Result<ResponseData> {
        (*self).parse(raw)
    }
}

/// The pipeline's terminal value: the raw transport response, the parsed
/// data, and a back-reference to the resolved request config.
#[derive(Debug, Clone)]
pub struct ResponseConfig {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Parsed payload.
    pub data: ResponseData,
    /// The raw response body, read exactly once.
    pub body: Bytes,
    /// The resolved request config that produced this response.
    pub config: RequestConfig,
}

impl ResponseConfig {
    /// Assembles a response config from a raw response and parsed data.
    #[must_use]
    pub fn new(raw: RawResponse, data: ResponseData, config: RequestConfig) -> Self {
        Self {
            status: raw.status,
            headers: raw.headers,
            data,
            body: raw.body,
            config,
        }
    }

    /// Assembles a diagnostic response config with unparsed data, used on
    /// non-success statuses where the body is kept only for inspection.
    #[must_use]
    pub fn unparsed(raw: RawResponse, config: RequestConfig) -> Self {
        Self::new(raw, ResponseData::None, config)
    }

    /// Deserializes the raw body as JSON with path-aware error messages.
    ///
    /// # Errors
    ///
    /// Returns a bad-response error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        from_json(&self.body)
    }

    /// Single header value by name, when it is valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16, body: &'static [u8]) -> RawResponse {
        RawResponse::new(
            StatusCode::from_u16(status).expect("valid status"),
            HeaderMap::new(),
            Bytes::from_static(body),
        )
    }

    #[test]
    fn json_parse_to_value() {
        let data = ResponseType::Json.parse(&raw(200, br#"{"id":1}"#)).expect("parse");
        let value = data.as_json().expect("json data");
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn json_parse_empty_body_is_none() {
        let data = ResponseType::Json.parse(&raw(204, b"")).expect("parse");
        assert!(data.is_none());
    }

    #[test]
    fn json_parse_failure_is_bad_response() {
        let err = ResponseType::Json
            .parse(&raw(200, b"not json"))
            .expect_err("should fail");
        assert_eq!(err.code(), "ERR_BAD_RESPONSE");
    }

    #[test]
    fn text_parse() {
        let data = ResponseType::Text.parse(&raw(200, b"hello")).expect("parse");
        assert_eq!(data.as_text(), Some("hello"));
    }

    #[test]
    fn text_parse_rejects_invalid_utf8() {
        let err = ResponseType::Text
            .parse(&raw(200, &[0xFF, 0xFE]))
            .expect_err("should fail");
        assert_eq!(err.code(), "ERR_BAD_RESPONSE");
    }

    #[test]
    fn bytes_parse_keeps_payload() {
        let data = ResponseType::Bytes.parse(&raw(200, b"\x00\x01")).expect("parse");
        assert_eq!(data.as_bytes().map(Bytes::as_ref), Some(&b"\x00\x01"[..]));
    }

    #[test]
    fn response_config_typed_json() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct User {
            id: u64,
        }

        let response = ResponseConfig::new(
            raw(200, br#"{"id":7}"#),
            ResponseData::None,
            RequestConfig::default(),
        );
        let user: User = response.json().expect("decode");
        assert_eq!(user, User { id: 7 });
    }

    #[test]
    fn unparsed_keeps_diagnostic_body() {
        let response = ResponseConfig::unparsed(raw(503, b"overloaded"), RequestConfig::default());
        assert_eq!(response.status.as_u16(), 503);
        assert!(response.data.is_none());
        assert_eq!(response.body.as_ref(), b"overloaded");
    }
}
