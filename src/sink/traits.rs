//! Sink trait definitions
//!
//! Defines the `RecordSink` trait the orchestrator writes bundles through.
//! Rows are JSON objects keyed by column name.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

// ─────────────────────────────────────────────────────────────────
// Tables
// ─────────────────────────────────────────────────────────────────

/// Tables of the survey data service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// One row per respondent.
    Respondents,
    /// Tool-usage rows, children of a respondent.
    ToolResponses,
    /// Rating rows, children of a respondent.
    RatingResponses,
}

impl Table {
    /// Name of the table in the data service.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Respondents => "respondents",
            Table::ToolResponses => "section_a_responses",
            Table::RatingResponses => "likert_responses",
        }
    }

    /// Insert order for one bundle: parent first.
    pub fn insert_order() -> &'static [Table] {
        &[Table::Respondents, Table::ToolResponses, Table::RatingResponses]
    }

    /// Delete order: children before the respondents they reference.
    pub fn delete_order() -> &'static [Table] {
        &[Table::ToolResponses, Table::RatingResponses, Table::Respondents]
    }

    /// Whether rows carry a `respondent_id` foreign key.
    pub fn is_child(&self) -> bool {
        !matches!(self, Table::Respondents)
    }

    /// Column that ties a row to its respondent.
    pub fn respondent_column(&self) -> &'static str {
        if self.is_child() {
            "respondent_id"
        } else {
            "id"
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ─────────────────────────────────────────────────────────────────
// RecordSink Trait
// ─────────────────────────────────────────────────────────────────

/// Destination for generated records.
///
/// Each call is independent; a failed call leaves rows written by earlier
/// calls untouched.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Append rows to a table.
    async fn insert(&self, table: Table, rows: &[Value]) -> Result<()>;

    /// All rows currently in a table.
    async fn select(&self, table: Table) -> Result<Vec<Value>>;

    /// Remove every row of a table.
    async fn delete_all(&self, table: Table) -> Result<()>;

    /// Remove the rows of one respondent from a table. Deleting rows that
    /// do not exist is not an error.
    async fn delete_for_respondent(&self, table: Table, respondent_id: &str) -> Result<()>;
}
