//! API request and response types.
//!
//! Request types are deserialized loosely and then validated into the
//! domain inputs the repository accepts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{
    NewTodo, Patch, TodoFilter, TodoPatch, DEFAULT_PRIORITY, MAX_PRIORITY, MIN_PRIORITY,
};
use crate::error::{TodoError, TodoResult};

// ==================== Create ====================

/// Request to create a todo.
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "title": "Complete project documentation",
    "description": "Write comprehensive API documentation with examples",
    "due_at": "2024-12-31T23:59:59Z",
    "estimated_minutes": 120,
    "priority": 2,
    "tags": ["work", "urgent", "documentation"]
}))]
pub struct CreateTodoRequest {
    /// The title of the todo item.
    pub title: String,
    /// Detailed description.
    #[serde(default)]
    pub description: Option<String>,
    /// Due date and time. A timestamp without an offset is read as UTC.
    #[serde(default, deserialize_with = "due_at::option")]
    pub due_at: Option<DateTime<Utc>>,
    /// Estimated time to complete in minutes.
    #[serde(default)]
    pub estimated_minutes: Option<i64>,
    /// Status, defaults to "todo".
    #[serde(default)]
    pub status: Option<String>,
    /// Priority level (1=highest, 5=lowest), defaults to 3.
    #[serde(default)]
    pub priority: Option<i64>,
    /// Tags for categorizing the todo.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl CreateTodoRequest {
    /// Validate the payload and apply defaults.
    pub fn validate(self) -> TodoResult<NewTodo> {
        let title = validate_title(self.title)?;
        let priority = self.priority.unwrap_or(DEFAULT_PRIORITY);
        validate_priority(priority)?;
        if let Some(minutes) = self.estimated_minutes {
            validate_estimate(minutes)?;
        }

        let mut new = NewTodo::new(title);
        if let Some(status) = self.status {
            new.status = status;
        }
        new.description = self.description;
        new.due_at = self.due_at;
        new.estimated_minutes = self.estimated_minutes;
        new.priority = priority;
        new.tags = self.tags;

        Ok(new)
    }
}

/// Timestamp parsing for `due_at`: RFC 3339, or a naive date-time taken as UTC.
mod due_at {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    use crate::domain::Patch;

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| raw.parse::<NaiveDateTime>().ok().map(|dt| dt.and_utc()))
    }

    struct Lenient(DateTime<Utc>);

    impl<'de> Deserialize<'de> for Lenient {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = String::deserialize(deserializer)?;
            parse(&raw).map(Lenient).ok_or_else(|| {
                serde::de::Error::custom(format!("'{}' is not a valid date-time", raw))
            })
        }
    }

    pub(super) fn option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Lenient>::deserialize(deserializer)?.map(|l| l.0))
    }

    pub(super) fn patch<'de, D>(deserializer: D) -> Result<Patch<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Patch::<Lenient>::deserialize(deserializer)?.map(|l| l.0))
    }
}

// ==================== Update ====================

/// Request to partially update a todo. All fields are optional; only keys
/// present in the payload are applied, and `null` clears nullable fields.
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "status": "in_progress",
    "priority": 1,
    "tags": ["work", "completed"]
}))]
pub struct UpdateTodoRequest {
    /// New title. Cannot be null or empty.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub title: Patch<String>,
    /// New description, or null to clear.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub description: Patch<String>,
    /// New due date, or null to clear.
    #[serde(default, deserialize_with = "due_at::patch")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub due_at: Patch<DateTime<Utc>>,
    /// New estimate in minutes, or null to clear.
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub estimated_minutes: Patch<i64>,
    /// New status. Cannot be null.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub status: Patch<String>,
    /// New priority (1-5). Cannot be null.
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub priority: Patch<i64>,
    /// New tag list, or null to clear.
    #[serde(default)]
    #[schema(value_type = Option<Vec<String>>)]
    pub tags: Patch<Vec<String>>,
}

impl UpdateTodoRequest {
    /// Validate the payload into a patch, keeping absent and null distinct.
    pub fn validate(self) -> TodoResult<TodoPatch> {
        let title = required("title", self.title)?
            .map(validate_title)
            .transpose()?;
        let status = required("status", self.status)?;
        let priority = required("priority", self.priority)?;
        if let Some(priority) = priority {
            validate_priority(priority)?;
        }
        if let Patch::Value(minutes) = self.estimated_minutes {
            validate_estimate(minutes)?;
        }

        Ok(TodoPatch {
            title,
            description: self.description,
            due_at: self.due_at,
            estimated_minutes: self.estimated_minutes,
            status,
            priority,
            tags: self.tags,
        })
    }
}

/// Fields backed by NOT NULL columns may be omitted but not nulled.
fn required<T>(field: &str, patch: Patch<T>) -> TodoResult<Option<T>> {
    match patch {
        Patch::Absent => Ok(None),
        Patch::Null => Err(TodoError::InvalidArgument(format!(
            "{} cannot be null",
            field
        ))),
        Patch::Value(v) => Ok(Some(v)),
    }
}

fn validate_title(title: String) -> TodoResult<String> {
    if title.trim().is_empty() {
        return Err(TodoError::InvalidArgument(
            "title must not be empty".to_string(),
        ));
    }
    Ok(title)
}

fn validate_priority(priority: i64) -> TodoResult<()> {
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        return Err(TodoError::InvalidArgument(format!(
            "priority must be between {} and {}, got {}",
            MIN_PRIORITY, MAX_PRIORITY, priority
        )));
    }
    Ok(())
}

fn validate_estimate(minutes: i64) -> TodoResult<()> {
    if minutes < 0 {
        return Err(TodoError::InvalidArgument(format!(
            "estimated_minutes must be non-negative, got {}",
            minutes
        )));
    }
    Ok(())
}

// ==================== List ====================

/// Query parameters for listing todos.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTodosQuery {
    /// Case-insensitive title search.
    #[serde(default)]
    pub q: Option<String>,
    /// Only todos carrying this tag.
    #[serde(default)]
    pub tag: Option<String>,
    /// Only todos with this status.
    #[serde(default)]
    pub status: Option<String>,
    /// Maximum results (default 100, clamped into 0..=1000).
    #[serde(default)]
    pub limit: Option<i64>,
}

impl ListTodosQuery {
    /// Build the repository filter. Empty parameters impose no constraint.
    pub fn into_filter(self) -> TodoFilter {
        fn non_empty(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        TodoFilter {
            q: non_empty(self.q),
            tag: non_empty(self.tag),
            status: non_empty(self.status),
            limit: TodoFilter::clamp_limit(self.limit.unwrap_or(TodoFilter::DEFAULT_LIMIT)),
        }
    }
}

/// Parse a path identifier. Malformed ids are client errors, not misses.
pub fn parse_todo_id(raw: &str) -> TodoResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| TodoError::InvalidArgument(format!("'{}' is not a valid todo id", raw)))
}

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Database connectivity.
    pub database: String,
    /// Timestamp.
    pub timestamp: String,
}
