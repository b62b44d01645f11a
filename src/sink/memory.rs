//! In-memory sink
//!
//! Keeps rows per table behind a lock. Used by `--dry-run`, by `summary`
//! and in tests. Enforces the same keys as the data service: respondent ids
//! are unique and child rows must reference an existing respondent.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{Error, Result};

use super::{RecordSink, Table};

/// In-memory implementation of `RecordSink`
#[derive(Default)]
pub struct MemorySink {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
    failing: RwLock<HashSet<Table>>,
    /// Fail only inserts carrying this respondent id
    failing_respondent: RwLock<Option<String>>,
    failing_deletes: RwLock<bool>,
    insert_calls: RwLock<u32>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every insert into `table` fail until cleared.
    pub fn fail_table(&self, table: Table) {
        self.failing.write().insert(table);
    }

    /// Make inserts for one respondent fail, in any table.
    pub fn fail_respondent(&self, respondent_id: impl Into<String>) {
        *self.failing_respondent.write() = Some(respondent_id.into());
    }

    /// Make every delete fail until cleared.
    pub fn fail_deletes(&self) {
        *self.failing_deletes.write() = true;
    }

    pub fn clear_failures(&self) {
        self.failing.write().clear();
        *self.failing_respondent.write() = None;
        *self.failing_deletes.write() = false;
    }

    /// Number of rows in a table.
    pub fn count(&self, table: Table) -> usize {
        self.tables.read().get(&table).map_or(0, Vec::len)
    }

    /// Copy of a table's rows.
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables.read().get(&table).cloned().unwrap_or_default()
    }

    pub fn insert_calls(&self) -> u32 {
        *self.insert_calls.read()
    }

    fn respondent_ids(&self) -> HashSet<String> {
        self.tables
            .read()
            .get(&Table::Respondents)
            .map(|rows| {
                rows.iter()
                    .filter_map(|r| r.get("id").and_then(Value::as_str).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn row_key(table: Table, row: &Value) -> Option<&str> {
    row.get(table.respondent_column()).and_then(Value::as_str)
}

#[async_trait]
impl RecordSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, table: Table, rows: &[Value]) -> Result<()> {
        *self.insert_calls.write() += 1;

        if self.failing.read().contains(&table) {
            return Err(Error::sink_request(table.name(), "injected failure"));
        }
        if let Some(ref id) = *self.failing_respondent.read() {
            if rows.iter().any(|r| row_key(table, r) == Some(id.as_str())) {
                return Err(Error::sink_request(table.name(), "injected failure"));
            }
        }

        let known = self.respondent_ids();
        if table == Table::Respondents {
            let mut batch = HashSet::new();
            for row in rows {
                let id = row_key(table, row).unwrap_or_default();
                if known.contains(id) || !batch.insert(id) {
                    return Err(Error::SinkRejected {
                        table: table.name().to_string(),
                        status: 409,
                        body: format!("duplicate key: id {:?} already exists", id),
                    });
                }
            }
        } else {
            for row in rows {
                match row_key(table, row) {
                    Some(id) if known.contains(id) => {}
                    other => {
                        return Err(Error::SinkRejected {
                            table: table.name().to_string(),
                            status: 409,
                            body: format!("respondent_id {:?} not present in respondents", other),
                        })
                    }
                }
            }
        }

        self.tables
            .write()
            .entry(table)
            .or_default()
            .extend(rows.iter().cloned());
        Ok(())
    }

    async fn select(&self, table: Table) -> Result<Vec<Value>> {
        Ok(self.rows(table))
    }

    async fn delete_all(&self, table: Table) -> Result<()> {
        if *self.failing_deletes.read() {
            return Err(Error::sink_request(table.name(), "injected failure"));
        }
        if table == Table::Respondents {
            let tables = self.tables.read();
            let orphaned = Table::delete_order()
                .iter()
                .filter(|t| t.is_child())
                .any(|t| tables.get(t).is_some_and(|rows| !rows.is_empty()));
            if orphaned {
                return Err(Error::SinkRejected {
                    table: table.name().to_string(),
                    status: 409,
                    body: "child rows still reference respondents".to_string(),
                });
            }
        }
        self.tables.write().remove(&table);
        Ok(())
    }

    async fn delete_for_respondent(&self, table: Table, respondent_id: &str) -> Result<()> {
        if *self.failing_deletes.read() {
            return Err(Error::sink_request(table.name(), "injected failure"));
        }
        let mut tables = self.tables.write();
        if table == Table::Respondents {
            let referenced = Table::delete_order()
                .iter()
                .filter(|t| t.is_child())
                .any(|t| {
                    tables.get(t).is_some_and(|rows| {
                        rows.iter().any(|row| row_key(*t, row) == Some(respondent_id))
                    })
                });
            if referenced {
                return Err(Error::SinkRejected {
                    table: table.name().to_string(),
                    status: 409,
                    body: format!("respondent {:?} still has child rows", respondent_id),
                });
            }
        }
        if let Some(rows) = tables.get_mut(&table) {
            rows.retain(|row| row_key(table, row) != Some(respondent_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_select() {
        let sink = MemorySink::new();
        sink.insert(Table::Respondents, &[json!({"id": "r1"})]).await.unwrap();
        sink.insert(
            Table::RatingResponses,
            &[json!({"respondent_id": "r1", "value": 5})],
        )
        .await
        .unwrap();

        assert_eq!(sink.select(Table::Respondents).await.unwrap().len(), 1);
        assert_eq!(sink.count(Table::RatingResponses), 1);
        assert_eq!(sink.insert_calls(), 2);
    }

    #[tokio::test]
    async fn test_child_without_parent_rejected() {
        let sink = MemorySink::new();
        let err = sink
            .insert(Table::ToolResponses, &[json!({"respondent_id": "ghost"})])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SinkRejected { status: 409, .. }));
        assert_eq!(sink.count(Table::ToolResponses), 0);
    }

    #[tokio::test]
    async fn test_injected_table_failure() {
        let sink = MemorySink::new();
        sink.fail_table(Table::Respondents);
        assert!(sink.insert(Table::Respondents, &[json!({"id": "r1"})]).await.is_err());

        sink.clear_failures();
        assert!(sink.insert(Table::Respondents, &[json!({"id": "r1"})]).await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_respondent_failure() {
        let sink = MemorySink::new();
        sink.fail_respondent("r2");
        assert!(sink.insert(Table::Respondents, &[json!({"id": "r1"})]).await.is_ok());
        assert!(sink.insert(Table::Respondents, &[json!({"id": "r2"})]).await.is_err());
        assert_eq!(sink.count(Table::Respondents), 1);
    }

    #[tokio::test]
    async fn test_duplicate_respondent_rejected() {
        let sink = MemorySink::new();
        sink.insert(Table::Respondents, &[json!({"id": "r1"})]).await.unwrap();

        let err = sink
            .insert(Table::Respondents, &[json!({"id": "r1"})])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SinkRejected { status: 409, .. }));

        let err = sink
            .insert(Table::Respondents, &[json!({"id": "r2"}), json!({"id": "r2"})])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SinkRejected { status: 409, .. }));
        assert_eq!(sink.count(Table::Respondents), 1);
    }

    #[tokio::test]
    async fn test_delete_for_respondent() {
        let sink = MemorySink::new();
        sink.insert(Table::Respondents, &[json!({"id": "r1"}), json!({"id": "r2"})])
            .await
            .unwrap();
        sink.insert(
            Table::RatingResponses,
            &[
                json!({"respondent_id": "r1", "value": 3}),
                json!({"respondent_id": "r2", "value": 4}),
            ],
        )
        .await
        .unwrap();

        // Parent first is refused while children remain
        assert!(sink.delete_for_respondent(Table::Respondents, "r1").await.is_err());

        sink.delete_for_respondent(Table::RatingResponses, "r1").await.unwrap();
        sink.delete_for_respondent(Table::ToolResponses, "r1").await.unwrap();
        sink.delete_for_respondent(Table::Respondents, "r1").await.unwrap();

        assert_eq!(sink.count(Table::Respondents), 1);
        assert_eq!(sink.rows(Table::RatingResponses), vec![json!({"respondent_id": "r2", "value": 4})]);

        // The id is free again
        sink.insert(Table::Respondents, &[json!({"id": "r1"})]).await.unwrap();
    }

    #[tokio::test]
    async fn test_injected_delete_failure() {
        let sink = MemorySink::new();
        sink.fail_deletes();
        assert!(sink.delete_for_respondent(Table::ToolResponses, "r1").await.is_err());
        assert!(sink.delete_all(Table::ToolResponses).await.is_err());
        sink.clear_failures();
        assert!(sink.delete_all(Table::ToolResponses).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_respects_references() {
        let sink = MemorySink::new();
        sink.insert(Table::Respondents, &[json!({"id": "r1"})]).await.unwrap();
        sink.insert(Table::ToolResponses, &[json!({"respondent_id": "r1"})])
            .await
            .unwrap();

        assert!(sink.delete_all(Table::Respondents).await.is_err());

        for table in Table::delete_order() {
            sink.delete_all(*table).await.unwrap();
        }
        assert_eq!(sink.count(Table::Respondents), 0);
        assert_eq!(sink.count(Table::ToolResponses), 0);
    }
}
