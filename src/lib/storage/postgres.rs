use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Connection, Postgres};

use crate::config::PoolConfig;
use crate::core::{Changeset, Todo, TodoDraft, TodoError, TodoId};
use crate::storage::{statements, TodoStore};

#[cfg(feature = "tracing")]
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS todos (
        id SERIAL PRIMARY KEY,
        title VARCHAR NOT NULL,
        description TEXT,
        completed BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE INDEX IF NOT EXISTS idx_todos_completed ON todos(completed)",
    "CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos(created_at)",
];

const ORDER_BY: &str = "created_at DESC, id DESC";

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Opens a pool, checks one connection and creates the schema if missing.
    pub async fn connect(url: &str, config: &PoolConfig) -> Result<Self, TodoError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .max_lifetime(config.max_lifetime)
            .acquire_timeout(config.acquire_timeout)
            .connect(url)
            .await?;
        let store = Self::new(pool);
        store.ping().await?;
        store.migrate().await?;
        #[cfg(feature = "tracing")]
        info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(store)
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), TodoError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TodoStore for PostgresStore {
    async fn list(&self, completed: Option<bool>) -> Result<Vec<Todo>, TodoError> {
        let mut query = statements::select_all::<Postgres>(completed, ORDER_BY);
        let todos = query.build_query_as::<Todo>().fetch_all(&self.pool).await?;
        Ok(todos)
    }

    async fn get(&self, id: TodoId) -> Result<Option<Todo>, TodoError> {
        let mut query = statements::select_one::<Postgres>(id);
        let todo = query.build_query_as::<Todo>().fetch_optional(&self.pool).await?;
        Ok(todo)
    }

    async fn create(&self, draft: TodoDraft) -> Result<Todo, TodoError> {
        let mut tx = self.pool.begin().await?;
        let mut query = statements::insert::<Postgres>(draft);
        let todo = query.build_query_as::<Todo>().fetch_one(&mut *tx).await?;
        tx.commit().await?;
        #[cfg(feature = "tracing")]
        debug!(id = todo.id, "Inserted todo");
        Ok(todo)
    }

    async fn update(&self, id: TodoId, changeset: Changeset) -> Result<Option<Todo>, TodoError> {
        let mut tx = self.pool.begin().await?;
        let mut query = statements::update::<Postgres>(id, changeset);
        let Some(todo) = query.build_query_as::<Todo>().fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };
        tx.commit().await?;
        Ok(Some(todo))
    }

    async fn delete(&self, id: TodoId) -> Result<bool, TodoError> {
        let mut tx = self.pool.begin().await?;
        let mut query = statements::delete::<Postgres>(id);
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
