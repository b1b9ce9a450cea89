use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Connection, Sqlite};

use crate::config::PoolConfig;
use crate::core::{Changeset, Todo, TodoDraft, TodoError, TodoId};
use crate::storage::{statements, TodoStore};

#[cfg(feature = "tracing")]
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        completed BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE INDEX IF NOT EXISTS idx_todos_completed ON todos(completed)",
    "CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos(created_at)",
];

// Timestamps are stored as RFC 3339 text with a variable number of fractional
// digits, so they are compared through julianday() rather than as strings.
const ORDER_BY: &str = "julianday(created_at) DESC, id DESC";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str, config: &PoolConfig) -> Result<Self, TodoError> {
        if is_in_memory(url) {
            return Self::in_memory().await;
        }
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .max_lifetime(config.max_lifetime)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        #[cfg(feature = "tracing")]
        info!(url = %url, "Opened SQLite database");
        Ok(store)
    }

    /// A private database living in a single pooled connection that is never recycled.
    pub async fn in_memory() -> Result<Self, TodoError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), TodoError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[async_trait]
impl TodoStore for SqliteStore {
    async fn list(&self, completed: Option<bool>) -> Result<Vec<Todo>, TodoError> {
        let mut query = statements::select_all::<Sqlite>(completed, ORDER_BY);
        let todos = query.build_query_as::<Todo>().fetch_all(&self.pool).await?;
        Ok(todos)
    }

    async fn get(&self, id: TodoId) -> Result<Option<Todo>, TodoError> {
        let mut query = statements::select_one::<Sqlite>(id);
        let todo = query.build_query_as::<Todo>().fetch_optional(&self.pool).await?;
        Ok(todo)
    }

    async fn create(&self, draft: TodoDraft) -> Result<Todo, TodoError> {
        let mut tx = self.pool.begin().await?;
        let mut query = statements::insert::<Sqlite>(draft);
        let todo = query.build_query_as::<Todo>().fetch_one(&mut *tx).await?;
        tx.commit().await?;
        #[cfg(feature = "tracing")]
        debug!(id = todo.id, "Inserted todo");
        Ok(todo)
    }

    async fn update(&self, id: TodoId, changeset: Changeset) -> Result<Option<Todo>, TodoError> {
        let mut tx = self.pool.begin().await?;
        let mut query = statements::update::<Sqlite>(id, changeset);
        let Some(todo) = query.build_query_as::<Todo>().fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };
        tx.commit().await?;
        Ok(Some(todo))
    }

    async fn delete(&self, id: TodoId) -> Result<bool, TodoError> {
        let mut tx = self.pool.begin().await?;
        let mut query = statements::delete::<Sqlite>(id);
        let affected = query.build().execute(&mut *tx).await?.rows_affected();
        if affected == 0 {
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn ping(&self) -> Result<(), TodoError> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{now, NewTodo};

    fn draft(title: &str) -> TodoDraft {
        NewTodo { title: title.into(), description: Some("notes".into()) }
            .into_draft(now())
            .unwrap()
    }

    #[tokio::test]
    async fn create_assigns_ids_and_keeps_timestamps() -> Result<(), Box<dyn std::error::Error>> {
        let store = SqliteStore::in_memory().await?;
        let first = store.create(draft("first")).await?;
        let second = store.create(draft("second")).await?;
        assert!(first.id > 0);
        assert!(second.id > first.id);
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(store.get(first.id).await?, Some(first));
        Ok(())
    }

    #[tokio::test]
    async fn update_of_missing_row_commits_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let store = SqliteStore::in_memory().await?;
        let mut changeset = Changeset::new();
        changeset.completed(true).touch(now());
        assert_eq!(store.update(404, changeset).await?, None);
        assert!(store.list(None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() -> Result<(), Box<dyn std::error::Error>> {
        let store = SqliteStore::in_memory().await?;
        let a = store.create(draft("a")).await?;
        let b = store.create(draft("b")).await?;
        let c = store.create(draft("c")).await?;
        for id in [a.id, c.id] {
            let mut changeset = Changeset::new();
            changeset.completed(true).touch(now());
            store.update(id, changeset).await?;
        }

        let all: Vec<TodoId> = store.list(None).await?.into_iter().map(|t| t.id).collect();
        assert_eq!(all, vec![c.id, b.id, a.id]);

        let done: Vec<TodoId> = store.list(Some(true)).await?.into_iter().map(|t| t.id).collect();
        assert_eq!(done, vec![c.id, a.id]);

        let open: Vec<TodoId> = store.list(Some(false)).await?.into_iter().map(|t| t.id).collect();
        assert_eq!(open, vec![b.id]);
        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() -> Result<(), Box<dyn std::error::Error>> {
        let store = SqliteStore::in_memory().await?;
        let todo = store.create(draft("gone soon")).await?;
        assert!(store.delete(todo.id).await?);
        assert!(!store.delete(todo.id).await?);
        assert_eq!(store.get(todo.id).await?, None);
        Ok(())
    }

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:todos?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://todos.db"));
    }
}
