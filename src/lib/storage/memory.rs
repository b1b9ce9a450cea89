use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::{Changeset, Todo, TodoDraft, TodoError, TodoId};

use super::TodoStore;

/// Process-local store for tests and quick local runs. Nothing is persisted.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: TodoId,
    todos: BTreeMap<TodoId, Todo>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn list(&self, completed: Option<bool>) -> Result<Vec<Todo>, TodoError> {
        let state = self.state.read().await;
        let mut todos: Vec<Todo> = state
            .todos
            .values()
            .filter(|todo| completed.is_none_or(|c| todo.completed == c))
            .cloned()
            .collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(todos)
    }

    async fn get(&self, id: TodoId) -> Result<Option<Todo>, TodoError> {
        Ok(self.state.read().await.todos.get(&id).cloned())
    }

    async fn create(&self, draft: TodoDraft) -> Result<Todo, TodoError> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let todo = Todo {
            id: state.last_id,
            title: draft.title,
            description: draft.description,
            completed: draft.completed,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        };
        state.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn update(&self, id: TodoId, changeset: Changeset) -> Result<Option<Todo>, TodoError> {
        let mut state = self.state.write().await;
        Ok(state.todos.get_mut(&id).map(|todo| {
            changeset.apply_to(todo);
            todo.clone()
        }))
    }

    async fn delete(&self, id: TodoId) -> Result<bool, TodoError> {
        Ok(self.state.write().await.todos.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), TodoError> {
        Ok(())
    }
}
