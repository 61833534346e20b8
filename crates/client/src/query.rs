//! Query options for the listing and view endpoints
//!
//! The listing endpoints take JSON-typed query parameters: string values are
//! sent JSON-quoted (`startkey="abc"`), numbers and booleans bare
//! (`limit=500`, `include_docs=true`). [`QueryOptions`] keeps the caller's
//! options as JSON values and renders them that way.

use std::collections::BTreeMap;

use serde_json::Value;
use url::form_urlencoded;

/// Caller-supplied options for one listing request.
///
/// Caller keys are preserved as given, with one exception: the pagination
/// engine always overwrites `limit` and `startkey`, so values supplied for
/// those keys do not survive a paginated call.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    params: BTreeMap<String, Value>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value for the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Render as a `?`-prefixed, percent-escaped query string, or an empty
    /// string when no options are set. Values are JSON-encoded.
    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            serializer.append_pair(key, &value.to_string());
        }
        format!("?{}", serializer.finish())
    }
}
