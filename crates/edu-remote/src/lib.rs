//! Remote table service access for the educational center site.
//!
//! This crate provides the [`RemoteStore`] contract consumed by the content
//! mirror, plus two implementations:
//!
//! - [`RestClient`] talks to a hosted PostgREST-style table service over HTTP.
//! - [`MemoryStore`] keeps tables in process, for offline runs and tests.
//!
//! Rows travel as JSON objects. The store never interprets them beyond the
//! key column used for filtering and ordering.

mod memory;
mod rest;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStore;
pub use rest::{RestClient, RestConfig};

/// A single table row as exchanged with the remote service.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur while talking to the remote table service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The HTTP request could not be completed.
    #[error("remote request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("remote returned HTTP {status} for '{table}': {message}")]
    Status {
        /// Table the request targeted.
        table: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The response body was not the expected row array.
    #[error("unexpected response from '{table}': {message}")]
    Decode {
        /// Table the request targeted.
        table: String,
        /// Description of the decoding failure.
        message: String,
    },

    /// A keyed write matched no row.
    #[error("no row in '{table}' matched {key}")]
    NoRows {
        /// Table the request targeted.
        table: String,
        /// The key that matched nothing.
        key: Key,
    },

    /// The client was constructed with unusable settings.
    #[error("invalid remote configuration: {0}")]
    InvalidConfig(String),

    /// The store refused the operation.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
}

impl RemoteError {
    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates a new `NoRows` error.
    #[must_use]
    pub fn no_rows(table: impl Into<String>, key: Key) -> Self {
        Self::NoRows {
            table: table.into(),
            key,
        }
    }
}

/// The kind of operation issued against a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read rows.
    Select,
    /// Append a row.
    Insert,
    /// Change the row matching a key.
    Update,
    /// Remove the row matching a key.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "select"),
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Equality filter identifying a single row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Column to match.
    pub column: String,
    /// Value the column must equal, in its textual form.
    pub value: String,
}

impl Key {
    /// Creates a key on an arbitrary column.
    #[must_use]
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Creates a key on the `id` column.
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new("id", value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.column, self.value)
    }
}

/// Sort order requested for a select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Column to sort by.
    pub column: String,
    /// Whether to sort newest/largest first.
    pub descending: bool,
}

impl Order {
    /// Ascending order on `column`.
    #[must_use]
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// Descending order on `column`.
    #[must_use]
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    /// Renders the order in the PostgREST `order=` dialect.
    #[must_use]
    pub fn to_query_value(&self) -> String {
        let direction = if self.descending { "desc" } else { "asc" };
        format!("{}.{direction}", self.column)
    }
}

/// Table-oriented access to the remote data service.
///
/// Every method is a single request/response exchange. There are no
/// transactions and no ordering guarantees between calls.
#[async_trait]
pub trait RemoteStore: Send + Sync + fmt::Debug {
    /// Reads every row of `table`, optionally sorted.
    async fn select(&self, table: &str, order: Option<&Order>) -> Result<Vec<Row>, RemoteError>;

    /// Inserts `row` and returns the row as stored, including generated columns.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, RemoteError>;

    /// Applies `patch` to the row matching `key` and returns the stored row.
    ///
    /// Fails with [`RemoteError::NoRows`] if nothing matched.
    async fn update(&self, table: &str, patch: Row, key: &Key) -> Result<Row, RemoteError>;

    /// Removes the row matching `key`. Removing a missing row is not an error.
    async fn delete(&self, table: &str, key: &Key) -> Result<(), RemoteError>;
}

/// Renders a JSON value in the textual form used by key filters.
///
/// Strings are taken verbatim; numbers and booleans use their JSON text.
#[must_use]
pub fn key_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
