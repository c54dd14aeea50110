//! Query parameter containers.

use url::Url;

use crate::Result;

/// An ordered collection of query parameters.
///
/// Built either explicitly pair-by-pair, from a serializable value (where
/// `Vec` fields expand to repeated keys and `None` fields are dropped), or
/// from a plain mapping with optional values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    /// Creates an empty parameter collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Appends a single parameter.
    #[must_use]
    pub fn append(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((name.into(), value.to_string()));
        self
    }

    /// Appends a parameter only when the value is present.
    #[must_use]
    pub fn append_option(self, name: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.append(name, value),
            None => self,
        }
    }

    /// Appends one parameter per element, expanding to repeated keys.
    #[must_use]
    pub fn append_all(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl ToString>,
    ) -> Self {
        let name = name.into();
        for value in values {
            self.pairs.push((name.clone(), value.to_string()));
        }
        self
    }

    /// Builds parameters by serializing `value`.
    ///
    /// Uses `serde_html_form`, so `Vec<T>` fields become repeated keys and
    /// `Option::None` fields are omitted.
    ///
    /// # Errors
    ///
    /// Returns a request-construction error if serialization fails.
    pub fn from_serde<T: serde::Serialize>(value: &T) -> Result<Self> {
        let query = serde_html_form::to_string(value)
            .map_err(|e| crate::Error::bad_config(format!("query serialization failed: {e}")))?;
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Ok(Self { pairs })
    }

    /// The parameter pairs in insertion order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Returns `true` if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Appends all parameters to the URL's query string.
    pub fn apply(&self, url: &mut Url) {
        if self.pairs.is_empty() {
            return;
        }
        url.query_pairs_mut()
            .extend_pairs(self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str())));
    }
}

impl<N: Into<String>, V: ToString> FromIterator<(N, V)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.to_string()))
                .collect(),
        }
    }
}
