pub mod memory;
pub mod postgres;
pub mod sqlite;
pub mod statements;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use crate::core::{Changeset, Todo, TodoDraft, TodoError, TodoId};

/// Persistence seam for todos. Every mutating call runs in its own transaction.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All todos, optionally filtered by `completed`, newest first.
    async fn list(&self, completed: Option<bool>) -> Result<Vec<Todo>, TodoError>;
    async fn get(&self, id: TodoId) -> Result<Option<Todo>, TodoError>;
    async fn create(&self, draft: TodoDraft) -> Result<Todo, TodoError>;
    /// `None` when no row has `id`; nothing is committed in that case.
    async fn update(&self, id: TodoId, changeset: Changeset) -> Result<Option<Todo>, TodoError>;
    /// `false` when no row has `id`.
    async fn delete(&self, id: TodoId) -> Result<bool, TodoError>;
    async fn ping(&self) -> Result<(), TodoError>;
}
