//! In-memory store
//!
//! A [`ProfileStore`] over plain vectors, with the same upsert-by-conflict
//! column and filter semantics as the hosted store. Used by the CLI's offline
//! mode and by tests.

use crate::error::StoreError;
use crate::store::{Filter, ProfileStore, Row, Table};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<BTreeMap<Table, Vec<Row>>>,
}

impl InMemoryStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows directly, bypassing conflict handling
    pub fn seed(&self, table: Table, rows: impl IntoIterator<Item = Row>) {
        self.tables.lock().entry(table).or_default().extend(rows);
    }

    /// Copy of every row in `table`
    #[must_use]
    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.tables.lock().get(&table).cloned().unwrap_or_default()
    }

    /// Row count of `table`
    #[must_use]
    pub fn len(&self, table: Table) -> usize {
        self.tables.lock().get(&table).map_or(0, Vec::len)
    }

    /// Whole content as JSON, keyed by table name
    #[must_use]
    pub fn dump(&self) -> Value {
        let tables = self.tables.lock();
        Value::Object(
            tables
                .iter()
                .map(|(table, rows)| {
                    (
                        table.name().to_string(),
                        Value::Array(rows.iter().cloned().map(Value::Object).collect()),
                    )
                })
                .collect(),
        )
    }

    /// Rebuild from [`Self::dump`] output
    ///
    /// # Errors
    /// [`StoreError::Decode`] when the value is not shaped like a dump.
    pub fn restore(value: &Value) -> Result<Self, StoreError> {
        let object = value
            .as_object()
            .ok_or_else(|| StoreError::Decode("store dump must be an object".into()))?;
        let store = Self::new();
        for table in Table::ALL {
            let Some(rows) = object.get(table.name()) else {
                continue;
            };
            let rows = rows
                .as_array()
                .ok_or_else(|| StoreError::Decode(format!("{table}: expected array")))?;
            let rows = rows
                .iter()
                .map(|row| {
                    row.as_object()
                        .cloned()
                        .ok_or_else(|| StoreError::Decode(format!("{table}: expected object row")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            store.seed(table, rows);
        }
        Ok(store)
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn upsert(&self, table: Table, row: Row) -> Result<(), StoreError> {
        let column = table.conflict_column();
        let key = row
            .get(column)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Rejected {
                status: 400,
                message: format!("{table}: missing conflict column {column}"),
            })?;

        let mut tables = self.tables.lock();
        let rows = tables.entry(table).or_default();
        match rows
            .iter_mut()
            .find(|existing| existing.get(column).and_then(Value::as_str) == Some(key.as_str()))
        {
            Some(existing) => existing.extend(row),
            None => rows.push(row),
        }
        Ok(())
    }

    async fn delete(&self, table: Table, filter: Filter) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        if let Some(rows) = tables.get_mut(&table) {
            let before = rows.len();
            rows.retain(|row| !filter.matches(row));
            tracing::trace!(%table, removed = before - rows.len(), "delete");
        }
        Ok(())
    }

    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default())
    }
}
