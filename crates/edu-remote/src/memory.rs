//! In-process table store.
//!
//! Behaves like the hosted service for the four table operations: numeric
//! ids are generated on insert, updates merge the patch into the stored row,
//! and deletes of missing rows succeed. Individual operations can be made to
//! fail, which is how offline runs and tests simulate an unreachable backend.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{key_text, Key, Operation, Order, RemoteError, RemoteStore, Row};

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<String, Vec<Row>>,
    failing: HashSet<(String, Operation)>,
    calls: Vec<(String, Operation)>,
}

impl Tables {
    fn check(&mut self, table: &str, operation: Operation) -> Result<(), RemoteError> {
        self.calls.push((table.to_string(), operation));
        if self.failing.contains(&(table.to_string(), operation)) {
            return Err(RemoteError::Unavailable(format!(
                "{operation} on '{table}' is failing"
            )));
        }
        Ok(())
    }

    fn next_id(&self, table: &str) -> u64 {
        self.rows
            .get(table)
            .into_iter()
            .flatten()
            .filter_map(|row| row.get("id"))
            .filter_map(|id| match id {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1
    }
}

fn matches_key(row: &Row, key: &Key) -> bool {
    row.get(&key.column)
        .and_then(key_text)
        .is_some_and(|text| text == key.value)
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        (Some(Value::Null) | None, Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Null) | None) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// [`RemoteStore`] that keeps every table in memory.
///
/// # Example
///
/// ```
/// use edu_remote::{MemoryStore, Operation, RemoteStore};
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// let mut row = serde_json::Map::new();
/// row.insert("name".into(), "Aziz".into());
///
/// let stored = store.insert("messages", row).await.unwrap();
/// assert_eq!(stored["id"], 1);
///
/// store.fail("messages", Operation::Insert).await;
/// assert!(store.insert("messages", serde_json::Map::new()).await.is_err());
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents of `table` with `rows`.
    #[must_use]
    pub fn with_rows(mut self, table: impl Into<String>, rows: Vec<Row>) -> Self {
        self.tables.get_mut().rows.insert(table.into(), rows);
        self
    }

    /// Makes every subsequent `operation` on `table` fail.
    pub async fn fail(&self, table: &str, operation: Operation) {
        self.tables
            .lock()
            .await
            .failing
            .insert((table.to_string(), operation));
    }

    /// Undoes a previous [`fail`](Self::fail).
    pub async fn recover(&self, table: &str, operation: Operation) {
        self.tables
            .lock()
            .await
            .failing
            .remove(&(table.to_string(), operation));
    }

    /// Returns a copy of the stored rows of `table`.
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .await
            .rows
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns how many times `operation` was attempted, on any table.
    pub async fn call_count(&self, operation: Operation) -> usize {
        self.tables
            .lock()
            .await
            .calls
            .iter()
            .filter(|(_, op)| *op == operation)
            .count()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, table: &str, order: Option<&Order>) -> Result<Vec<Row>, RemoteError> {
        let mut tables = self.tables.lock().await;
        tables.check(table, Operation::Select)?;

        let mut rows = tables.rows.get(table).cloned().unwrap_or_default();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, RemoteError> {
        let mut tables = self.tables.lock().await;
        tables.check(table, Operation::Insert)?;

        if row.get("id").map_or(true, Value::is_null) {
            let id = tables.next_id(table);
            row.insert("id".to_string(), Value::from(id));
        }
        debug!(table, id = ?row.get("id"), "Inserted row in memory");
        tables
            .rows
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, patch: Row, key: &Key) -> Result<Row, RemoteError> {
        let mut tables = self.tables.lock().await;
        tables.check(table, Operation::Update)?;

        let stored = tables
            .rows
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| matches_key(row, key)))
            .ok_or_else(|| RemoteError::no_rows(table, key.clone()))?;
        for (column, value) in patch {
            stored.insert(column, value);
        }
        Ok(stored.clone())
    }

    async fn delete(&self, table: &str, key: &Key) -> Result<(), RemoteError> {
        let mut tables = self.tables.lock().await;
        tables.check(table, Operation::Delete)?;

        if let Some(rows) = tables.rows.get_mut(table) {
            rows.retain(|row| !matches_key(row, key));
        }
        Ok(())
    }
}
