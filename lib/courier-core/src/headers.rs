//! Ordered, case-insensitive request headers.
//!
//! Configs carry headers as an ordered list with case-insensitive keys and
//! last-write-wins semantics; the dispatcher converts them to an
//! [`http::HeaderMap`] when building the transport request, which is where
//! invalid names or values surface as request-construction errors.

use http::header::{HeaderName, HeaderValue};

use crate::{Error, Result};

/// Ordered header collection with case-insensitive keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a collection from name/value pairs, applying last-write-wins
    /// for duplicate semantic keys.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.insert(name, value);
        }
        headers
    }

    /// Sets a header, replacing any existing value for the same
    /// (case-insensitive) name while keeping its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Looks up a header value by case-insensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if a header with this name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes a header by case-insensitive name.
    pub fn remove(&mut self, name: &str) {
        self.entries
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    }

    /// Iterates name/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no headers are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlays `other` on top of `self` (last-write-wins per key).
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    /// Converts to a transport-ready [`http::HeaderMap`].
    ///
    /// # Errors
    ///
    /// Returns a request-construction error for invalid names or values.
    pub fn to_header_map(&self) -> Result<http::HeaderMap> {
        let mut map = http::HeaderMap::with_capacity(self.entries.len());
        for (name, value) in self.iter() {
            let name = HeaderName::try_from(name)
                .map_err(|e| Error::bad_config_value(format!("invalid header name: {e}")))?;
            let value = HeaderValue::try_from(value)
                .map_err(|e| Error::bad_config_value(format!("invalid header value: {e}")))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self::from_pairs(iter.into_iter().map(|(n, v)| (n.into(), v.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");

        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(headers.contains("Content-type"));
        assert!(!headers.contains("Accept"));
    }

    #[test]
    fn last_write_wins_keeps_position() {
        let mut headers = Headers::new();
        headers.insert("Accept", "text/html");
        headers.insert("X-Trace", "1");
        headers.insert("accept", "application/json");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Accept"), Some("application/json"));
        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Accept", "X-Trace"]);
    }

    #[test]
    fn merge_overlays_other() {
        let mut base = Headers::from_pairs([
            ("Accept".to_string(), "application/json".to_string()),
            ("X-Env".to_string(), "staging".to_string()),
        ]);
        let call = Headers::from_pairs([("x-env".to_string(), "production".to_string())]);

        base.merge(&call);
        assert_eq!(base.get("X-Env"), Some("production"));
        assert_eq!(base.get("Accept"), Some("application/json"));
    }

    #[test]
    fn to_header_map_converts() {
        let mut headers = Headers::new();
        headers.insert("Accept", "application/json");
        let map = headers.to_header_map().expect("valid headers");
        assert_eq!(
            map.get(http::header::ACCEPT).map(|v| v.to_str().ok()),
            Some(Some("application/json"))
        );
    }

    #[test]
    fn to_header_map_rejects_invalid_name() {
        let mut headers = Headers::new();
        headers.insert("bad header name", "x");
        let err = headers.to_header_map().expect_err("should fail");
        assert_eq!(err.code(), "ERR_BAD_CONFIG_VALUE");
    }

    #[test]
    fn remove_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("X-Token", "abc");
        headers.remove("x-token");
        assert!(headers.is_empty());
    }
}
