//! Todo domain models.
//!
//! A todo is the only persisted entity. Creation assigns the id and
//! `created_at`; updates are field-by-field merges that always refresh
//! `updated_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Status assigned when none is given on create.
pub const DEFAULT_STATUS: &str = "todo";

/// Priority assigned when none is given on create.
pub const DEFAULT_PRIORITY: i64 = 3;

/// Highest urgency.
pub const MIN_PRIORITY: i64 = 1;

/// Lowest urgency.
pub const MAX_PRIORITY: i64 = 5;

/// A stored todo item.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Todo {
    /// Unique identifier.
    pub id: Uuid,
    /// Short title.
    pub title: String,
    /// Longer free-form description.
    pub description: Option<String>,
    /// When the todo is due.
    pub due_at: Option<DateTime<Utc>>,
    /// Estimated time to complete, in minutes.
    pub estimated_minutes: Option<i64>,
    /// Free-form status, e.g. "todo", "in_progress", "done".
    pub status: String,
    /// Priority from 1 (highest) to 5 (lowest).
    pub priority: i64,
    /// Tags used for categorizing.
    pub tags: Option<Vec<String>>,
    /// When the todo was created.
    pub created_at: DateTime<Utc>,
    /// When the todo was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Validated input for creating a todo.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i64>,
    pub status: String,
    pub priority: i64,
    pub tags: Option<Vec<String>>,
}

impl NewTodo {
    /// Create input with only a title; everything else takes its default.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_at: None,
            estimated_minutes: None,
            status: DEFAULT_STATUS.to_string(),
            priority: DEFAULT_PRIORITY,
            tags: None,
        }
    }

    /// Materialize the record, assigning its id and creation time.
    pub fn into_todo(self) -> Todo {
        Todo {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            due_at: self.due_at,
            estimated_minutes: self.estimated_minutes,
            status: self.status,
            priority: self.priority,
            tags: self.tags,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// A single field of a partial update.
///
/// `Absent` means the key was not in the payload and the stored value is
/// kept. `Null` means the key was present with an explicit `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    /// Convert to the value the column should hold, or `None` if untouched.
    ///
    /// The outer `Option` is "touched?", the inner one is the new value.
    pub fn into_update(self) -> Option<Option<T>> {
        match self {
            Patch::Absent => None,
            Patch::Null => Some(None),
            Patch::Value(v) => Some(Some(v)),
        }
    }

    /// Transform a supplied value, keeping `Absent` and `Null` as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }
}

// Only reached when the key is present; `#[serde(default)]` yields `Absent`.
impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

/// Validated partial update. Non-nullable columns take plain `Option`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Patch<String>,
    pub due_at: Patch<DateTime<Utc>>,
    pub estimated_minutes: Patch<i64>,
    pub status: Option<String>,
    pub priority: Option<i64>,
    pub tags: Patch<Vec<String>>,
}

/// Filters for listing todos. Present fields are ANDed together.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoFilter {
    /// Case-insensitive substring of the title.
    pub q: Option<String>,
    /// Exact tag that must be contained in the tag list.
    pub tag: Option<String>,
    /// Exact status.
    pub status: Option<String>,
    /// Maximum number of results, already clamped to the ceiling.
    pub limit: i64,
}

impl TodoFilter {
    /// Results returned when no limit is requested.
    pub const DEFAULT_LIMIT: i64 = 100;

    /// Hard ceiling on results; larger requests are clamped to it.
    pub const MAX_LIMIT: i64 = 1000;

    /// Clamp a requested limit into `[0, MAX_LIMIT]`. Zero yields no rows.
    pub fn clamp_limit(requested: i64) -> i64 {
        requested.clamp(0, Self::MAX_LIMIT)
    }
}

impl Default for TodoFilter {
    fn default() -> Self {
        Self {
            q: None,
            tag: None,
            status: None,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}
