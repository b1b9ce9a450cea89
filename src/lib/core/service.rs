use std::sync::Arc;

use crate::core::{now, NewTodo, Todo, TodoError, TodoId, TodoPatch};
use crate::storage::TodoStore;

#[cfg(feature = "tracing")]
use tracing::{debug, instrument};

/// Validates requests and runs each one as a single store round-trip.
pub struct TodoService<S: TodoStore + 'static> {
    store: Arc<S>,
}

impl<S: TodoStore + 'static> Clone for TodoService<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone() }
    }
}

impl<S: TodoStore + 'static> TodoService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn list(&self, completed: Option<bool>) -> Result<Vec<Todo>, TodoError> {
        self.store.list(completed).await
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn get(&self, id: TodoId) -> Result<Todo, TodoError> {
        self.store.get(id).await?.ok_or(TodoError::NotFound(id))
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, input)))]
    pub async fn create(&self, input: NewTodo) -> Result<Todo, TodoError> {
        let draft = input.into_draft(now())?;
        let todo = self.store.create(draft).await?;
        #[cfg(feature = "tracing")]
        debug!(id = todo.id, "Created todo");
        Ok(todo)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, patch)))]
    pub async fn update(&self, id: TodoId, patch: TodoPatch) -> Result<Todo, TodoError> {
        let changeset = patch.into_changeset(now())?;
        #[cfg(feature = "tracing")]
        debug!(id = id, columns = changeset.len(), "Updating todo");
        self.store
            .update(id, changeset)
            .await?
            .ok_or(TodoError::NotFound(id))
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn delete(&self, id: TodoId) -> Result<(), TodoError> {
        if self.store.delete(id).await? {
            Ok(())
        } else {
            Err(TodoError::NotFound(id))
        }
    }

    pub async fn health(&self) -> Result<(), TodoError> {
        self.store.ping().await
    }
}
