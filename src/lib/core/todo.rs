use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::TodoError;

pub type TodoId = i32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /todos`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTodo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewTodo {
    /// Validates the input and stamps it with server-assigned fields.
    pub fn into_draft(self, now: DateTime<Utc>) -> Result<TodoDraft, TodoError> {
        if self.title.trim().is_empty() {
            return Err(TodoError::EmptyTitle);
        }
        Ok(TodoDraft {
            title: self.title,
            description: self.description,
            completed: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// A validated todo that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /todos/{id}`. A field that is absent or `null` is left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn into_changeset(self, now: DateTime<Utc>) -> Result<Changeset, TodoError> {
        let mut changeset = Changeset::new();
        if let Some(title) = self.title {
            if title.trim().is_empty() {
                return Err(TodoError::EmptyTitle);
            }
            changeset.title(title);
        }
        if let Some(description) = self.description {
            changeset.description(description);
        }
        if let Some(completed) = self.completed {
            changeset.completed(completed);
        }
        if !changeset.has_changes() {
            return Err(TodoError::NoFieldsToUpdate);
        }
        changeset.touch(now);
        Ok(changeset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Title,
    Description,
    Completed,
    UpdatedAt,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Title => "title",
            Column::Description => "description",
            Column::Completed => "completed",
            Column::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

/// Ordered mapping from column to the value it is set to.
///
/// Only the fixed identifiers of [`Column`] ever reach SQL text; every
/// [`Value`] is bound as a statement parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    assignments: Vec<(Column, Value)>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.set(Column::Title, Value::Text(title.into()))
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.set(Column::Description, Value::Text(description.into()))
    }

    pub fn completed(&mut self, completed: bool) -> &mut Self {
        self.set(Column::Completed, Value::Bool(completed))
    }

    pub fn touch(&mut self, now: DateTime<Utc>) -> &mut Self {
        self.set(Column::UpdatedAt, Value::Timestamp(now))
    }

    fn set(&mut self, column: Column, value: Value) -> &mut Self {
        match self.assignments.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.assignments.push((column, value)),
        }
        self
    }

    /// True when a user-visible field is set; `updated_at` alone does not count.
    pub fn has_changes(&self) -> bool {
        self.assignments.iter().any(|(c, _)| *c != Column::UpdatedAt)
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Column, Value)> {
        self.assignments.iter()
    }

    pub fn apply_to(&self, todo: &mut Todo) {
        for (column, value) in &self.assignments {
            match (column, value) {
                (Column::Title, Value::Text(title)) => todo.title = title.clone(),
                (Column::Description, Value::Text(description)) => {
                    todo.description = Some(description.clone())
                }
                (Column::Completed, Value::Bool(completed)) => todo.completed = *completed,
                (Column::UpdatedAt, Value::Timestamp(at)) => todo.updated_at = *at,
                _ => {}
            }
        }
    }
}

impl IntoIterator for Changeset {
    type Item = (Column, Value);
    type IntoIter = std::vec::IntoIter<(Column, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.assignments.into_iter()
    }
}

/// Current time at the microsecond precision every backend stores.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn parse_id(raw: &str) -> Result<TodoId, TodoError> {
    raw.parse::<TodoId>()
        .map_err(|_| TodoError::InvalidId(raw.to_string()))
}

/// Boolean query values, with the same spellings `strconv.ParseBool` style parsers accept.
pub fn parse_bool(raw: &str) -> Result<bool, TodoError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(TodoError::InvalidFilter(raw.to_string())),
    }
}
