//! Repository layer for database operations.

use chrono::Utc;
use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::domain::{NewTodo, Todo, TodoFilter, TodoPatch};
use crate::error::{TodoError, TodoResult};
use crate::storage::models::TodoRow;

const TODO_COLUMNS: &str = "id, title, description, due_at, estimated_minutes, status, priority, \
                            tags, created_at, updated_at";

/// Repository for all todo database operations.
#[derive(Clone)]
pub struct TodoRepository {
    pool: SqlitePool,
}

impl TodoRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the database schema.
    pub async fn init_schema(&self) -> TodoResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                title_folded TEXT NOT NULL,
                description TEXT,
                due_at TEXT,
                estimated_minutes INTEGER CHECK (estimated_minutes IS NULL OR estimated_minutes >= 0),
                status TEXT NOT NULL DEFAULT 'todo',
                priority INTEGER NOT NULL DEFAULT 3 CHECK (priority BETWEEN 1 AND 5),
                tags TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_todos_status ON todos(status);
            CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos(created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Check that a connection can be acquired and used.
    pub async fn ping(&self) -> TodoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a new todo and return the stored record.
    pub async fn create(&self, new: NewTodo) -> TodoResult<Todo> {
        let todo = new.into_todo();

        sqlx::query(
            r#"
            INSERT INTO todos (
                id, title, title_folded, description, due_at, estimated_minutes,
                status, priority, tags, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(todo.id.to_string())
        .bind(&todo.title)
        .bind(fold(&todo.title))
        .bind(&todo.description)
        .bind(todo.due_at.map(|dt| dt.to_rfc3339()))
        .bind(todo.estimated_minutes)
        .bind(&todo.status)
        .bind(todo.priority)
        .bind(todo.tags.as_ref().map(serde_json::to_string).transpose()?)
        .bind(todo.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(todo)
    }

    /// Get a todo by ID.
    pub async fn get(&self, id: Uuid) -> TodoResult<Todo> {
        let row: TodoRow = sqlx::query_as(&format!(
            "SELECT {} FROM todos WHERE id = ?",
            TODO_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))?;

        row.try_into()
    }

    /// List todos matching every supplied filter, in insertion order.
    pub async fn list(&self, filter: &TodoFilter) -> TodoResult<Vec<Todo>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM todos WHERE 1 = 1", TODO_COLUMNS));

        if let Some(q) = &filter.q {
            // instr() keeps % and _ literal, unlike LIKE. SQLite's lower()
            // only folds ASCII, so both sides are folded here instead.
            query
                .push(" AND instr(title_folded, ")
                .push_bind(fold(q))
                .push(") > 0");
        }

        if let Some(tag) = &filter.tag {
            push_tag_contains(&mut query, tag);
        }

        if let Some(status) = &filter.status {
            query.push(" AND status = ").push_bind(status.clone());
        }

        query
            .push(" ORDER BY rowid LIMIT ")
            .push_bind(TodoFilter::clamp_limit(filter.limit));

        let rows: Vec<TodoRow> = query
            .build_query_as::<TodoRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Merge the supplied fields into an existing todo.
    ///
    /// Runs as one `UPDATE ... RETURNING` statement, so the read-modify-write
    /// is atomic and a missing row surfaces as `NotFound`.
    pub async fn update(&self, id: Uuid, patch: TodoPatch) -> TodoResult<Todo> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE todos SET updated_at = ");
        query.push_bind(Utc::now().to_rfc3339());

        if let Some(title) = patch.title {
            query
                .push(", title_folded = ")
                .push_bind(fold(&title))
                .push(", title = ")
                .push_bind(title);
        }
        if let Some(description) = patch.description.into_update() {
            query.push(", description = ").push_bind(description);
        }
        if let Some(due_at) = patch.due_at.into_update() {
            query
                .push(", due_at = ")
                .push_bind(due_at.map(|dt| dt.to_rfc3339()));
        }
        if let Some(estimated_minutes) = patch.estimated_minutes.into_update() {
            query
                .push(", estimated_minutes = ")
                .push_bind(estimated_minutes);
        }
        if let Some(status) = patch.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(priority) = patch.priority {
            query.push(", priority = ").push_bind(priority);
        }
        if let Some(tags) = patch.tags.into_update() {
            let encoded = tags.as_ref().map(serde_json::to_string).transpose()?;
            query.push(", tags = ").push_bind(encoded);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id.to_string())
            .push(" RETURNING ")
            .push(TODO_COLUMNS);

        let row: TodoRow = query
            .build_query_as::<TodoRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))?;

        row.try_into()
    }

    /// Permanently delete a todo.
    pub async fn delete(&self, id: Uuid) -> TodoResult<()> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }
}

/// Restrict the query to rows whose `tags` array contains `tag` exactly.
///
/// Relies on SQLite's JSON1 `json_each`; engines without JSON containment
/// would need a join table instead.
fn push_tag_contains(query: &mut QueryBuilder<'_, Sqlite>, tag: &str) {
    query
        .push(" AND EXISTS (SELECT 1 FROM json_each(todos.tags) WHERE json_each.value = ")
        .push_bind(tag.to_string())
        .push(")");
}

/// Case folding used for title search.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

fn not_found(id: Uuid) -> TodoError {
    TodoError::NotFound(format!("Todo {} not found", id))
}
