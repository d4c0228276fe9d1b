//! Record and request types shared by the core and infra crates

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    QUERY_DISTINCT, QUERY_GROUP_BY, QUERY_LIMIT, QUERY_ORDER_BY, QUERY_SELECT, QUERY_SKIP,
    QUERY_WHERE,
};

/// A single row returned by the platform. The client never inspects fields.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// HTTP verbs supported by the REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered query parameters
///
/// Keys are unique; `set` replaces an existing value in place so the
/// original ordering is kept when the paginator rewrites `q.skip`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        let key = key.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
        self
    }

    /// Builder form of [`QueryParams::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.0
    }

    // Platform conventions

    pub fn where_clause(self, clause: impl ToString) -> Self {
        self.with(QUERY_WHERE, clause)
    }

    pub fn select(self, columns: impl ToString) -> Self {
        self.with(QUERY_SELECT, columns)
    }

    pub fn order_by(self, order: impl ToString) -> Self {
        self.with(QUERY_ORDER_BY, order)
    }

    pub fn group_by(self, columns: impl ToString) -> Self {
        self.with(QUERY_GROUP_BY, columns)
    }

    pub fn distinct(self, distinct: bool) -> Self {
        self.with(QUERY_DISTINCT, distinct)
    }

    pub fn limit(self, limit: u32) -> Self {
        self.with(QUERY_LIMIT, limit)
    }

    pub fn skip(self, skip: u64) -> Self {
        self.with(QUERY_SKIP, skip)
    }

    /// The caller-supplied `q.limit`, if it parses as a positive integer
    pub fn page_limit(&self) -> Option<u32> {
        self.get(QUERY_LIMIT).and_then(|v| v.trim().parse::<u32>().ok()).filter(|v| *v > 0)
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

impl<K: Into<String>, V: ToString, const N: usize> From<[(K, V); N]> for QueryParams {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Where a single platform call is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// A resource path relative to the REST base, plus query parameters
    Resource { path: String, params: QueryParams },
    /// A continuation link handed back by the platform, used verbatim
    Cursor(String),
}

impl RequestTarget {
    pub fn resource(path: impl Into<String>, params: QueryParams) -> Self {
        Self::Resource { path: path.into(), params }
    }

    /// Path or URL for log and error context
    pub fn describe(&self) -> &str {
        match self {
            Self::Resource { path, .. } => path,
            Self::Cursor(url) => url,
        }
    }
}
