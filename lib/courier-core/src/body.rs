//! Body normalization and serialization utilities.
//!
//! [`Body`] turns a caller-supplied value into a transport-ready payload plus
//! an inferred content type. The pipeline injects the inferred content type as
//! a `Content-Type` header only when the caller has not set one explicitly.

use bytes::Bytes;

use crate::Result;

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized request body: transport-ready bytes plus an optional
/// inferred content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    bytes: Bytes,
    content_type: Option<ContentType>,
}

impl Body {
    /// Build a JSON body by serializing `value`.
    ///
    /// # Errors
    ///
    /// Returns a request-construction error if serialization fails.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            bytes: to_json(value)?,
            content_type: Some(ContentType::Json),
        })
    }

    /// Build a form URL-encoded body by serializing `value`.
    ///
    /// # Errors
    ///
    /// Returns a request-construction error if serialization fails.
    pub fn form<T: serde::Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            bytes: to_form(value)?,
            content_type: Some(ContentType::FormUrlEncoded),
        })
    }

    /// Build a text body.
    ///
    /// A string that already holds serialized JSON is tagged as
    /// `application/json`, everything else as `text/plain`.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        let content_type = if looks_like_json(&value) {
            ContentType::Json
        } else {
            ContentType::PlainText
        };
        Self {
            bytes: Bytes::from(value.into_bytes()),
            content_type: Some(content_type),
        }
    }

    /// Build an opaque byte body with no inferred content type.
    #[must_use]
    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self {
            bytes: value.into(),
            content_type: None,
        }
    }

    /// Build a body from already-normalized parts.
    #[must_use]
    pub const fn from_parts(bytes: Bytes, content_type: Option<ContentType>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    /// The transport-ready payload.
    #[must_use]
    pub const fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// The inferred content type, if any.
    #[must_use]
    pub const fn content_type(&self) -> Option<ContentType> {
        self.content_type
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Returns `true` if the string parses as a JSON document.
fn looks_like_json(value: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(value.trim()).is_ok()
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns a request-construction error if serialization fails.
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| crate::Error::bad_config(format!("JSON serialization failed: {e}")))
}

/// Serialize a value to form URL-encoded bytes.
///
/// Uses `serde_html_form` which supports `Vec<T>` for repeated form fields
/// (e.g., `tags=a&tags=b&tags=c`).
///
/// # Errors
///
/// Returns a request-construction error if serialization fails.
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_html_form::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(|e| crate::Error::bad_config(format!("form serialization failed: {e}")))
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Uses `serde_path_to_error` so decode failures name the exact field that
/// failed (e.g., "user.address.city").
///
/// # Errors
///
/// Returns a bad-response error if deserialization fails.
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::bad_response(format!(
            "JSON decode error at '{}': {}",
            e.path(),
            e.inner()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(
            ContentType::FormUrlEncoded.as_str(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(ContentType::PlainText.as_str(), "text/plain");
        assert_eq!(ContentType::OctetStream.as_str(), "application/octet-stream");
    }

    #[test]
    fn json_body_sets_content_type() {
        #[derive(serde::Serialize)]
        struct Login {
            email: String,
        }

        let body = Body::json(&Login {
            email: "a@b.com".to_string(),
        })
        .expect("serialize");

        assert_eq!(body.content_type(), Some(ContentType::Json));
        assert_eq!(body.as_bytes().as_ref(), br#"{"email":"a@b.com"}"#);
    }

    #[test]
    fn form_body_sets_content_type() {
        #[derive(serde::Serialize)]
        struct Login {
            username: String,
            password: String,
        }

        let body = Body::form(&Login {
            username: "alice".to_string(),
            password: "secret".to_string(),
        })
        .expect("serialize");

        assert_eq!(body.content_type(), Some(ContentType::FormUrlEncoded));
        assert_eq!(body.as_bytes().as_ref(), b"username=alice&password=secret");
    }

    #[test]
    fn text_body_sniffs_json() {
        let body = Body::text(r#"{"already":"json"}"#);
        assert_eq!(body.content_type(), Some(ContentType::Json));

        let body = Body::text("plain words");
        assert_eq!(body.content_type(), Some(ContentType::PlainText));
    }

    #[test]
    fn byte_body_has_no_content_type() {
        let body = Body::bytes(vec![1_u8, 2, 3]);
        assert_eq!(body.content_type(), None);
        assert_eq!(body.len(), 3);
        assert!(!body.is_empty());
    }

    #[test]
    fn from_json_decode_with_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Address {
            #[allow(dead_code)]
            city: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct User {
            #[allow(dead_code)]
            address: Address,
        }

        let result: Result<User> = from_json(br#"{"address":{}}"#);
        let err = result.expect_err("should fail");
        assert_eq!(err.code(), "ERR_BAD_RESPONSE");
        let msg = err.to_string();
        assert!(msg.contains("address"), "expected path in error: {msg}");
        assert!(msg.contains("city"), "expected field in error: {msg}");
    }

    #[test]
    fn to_json_round_trip() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct User {
            name: String,
            age: u32,
        }

        let user = User {
            name: "Alice".to_string(),
            age: 30,
        };
        let bytes = to_json(&user).expect("serialize");
        let back: User = from_json(&bytes).expect("deserialize");
        assert_eq!(back, user);
    }
}
