//! Database models for tapi.
//!
//! These are the row types returned by SQLx queries.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::Todo;
use crate::error::TodoError;

/// Database row for the todos table.
#[derive(Debug, Clone, FromRow)]
pub struct TodoRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<String>,
    pub estimated_minutes: Option<i64>,
    pub status: String,
    pub priority: i64,
    pub tags: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TodoError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TodoError::Internal(format!("bad stored timestamp '{}': {}", value, e)))
}

impl TryFrom<TodoRow> for Todo {
    type Error = TodoError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        Ok(Todo {
            id: Uuid::parse_str(&row.id).map_err(|e| TodoError::Internal(e.to_string()))?,
            title: row.title,
            description: row.description,
            due_at: row.due_at.as_deref().map(parse_timestamp).transpose()?,
            estimated_minutes: row.estimated_minutes,
            status: row.status,
            priority: row.priority,
            tags: row.tags.map(|t| serde_json::from_str(&t)).transpose()?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: row.updated_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}
