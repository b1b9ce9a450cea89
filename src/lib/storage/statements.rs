//! Statement builders shared by the SQL stores.
//!
//! Each builder is generic over the sqlx database so placeholders come out as
//! `$n` on PostgreSQL and `?` on SQLite. Only fixed identifiers are pushed as
//! SQL text; every value goes through `push_bind`.

use chrono::{DateTime, Utc};
use sqlx::{Database, Encode, QueryBuilder, Type};

use crate::core::{Changeset, TodoDraft, TodoId, Value};

pub const COLUMNS: &str = "id, title, description, completed, created_at, updated_at";

pub fn select_all<'args, DB>(completed: Option<bool>, order_by: &'static str) -> QueryBuilder<'args, DB>
where
    DB: Database,
    bool: Encode<'args, DB> + Type<DB>,
{
    let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS} FROM todos"));
    if let Some(completed) = completed {
        builder.push(" WHERE completed = ").push_bind(completed);
    }
    builder.push(" ORDER BY ").push(order_by);
    builder
}

pub fn select_one<'args, DB>(id: TodoId) -> QueryBuilder<'args, DB>
where
    DB: Database,
    TodoId: Encode<'args, DB> + Type<DB>,
{
    let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS} FROM todos WHERE id = "));
    builder.push_bind(id);
    builder
}

pub fn insert<'args, DB>(draft: TodoDraft) -> QueryBuilder<'args, DB>
where
    DB: Database,
    String: Encode<'args, DB> + Type<DB>,
    Option<String>: Encode<'args, DB> + Type<DB>,
    bool: Encode<'args, DB> + Type<DB>,
    DateTime<Utc>: Encode<'args, DB> + Type<DB>,
{
    let mut builder = QueryBuilder::new(
        "INSERT INTO todos (title, description, completed, created_at, updated_at) VALUES (",
    );
    builder
        .push_bind(draft.title)
        .push(", ")
        .push_bind(draft.description)
        .push(", ")
        .push_bind(draft.completed)
        .push(", ")
        .push_bind(draft.created_at)
        .push(", ")
        .push_bind(draft.updated_at)
        .push(") RETURNING ")
        .push(COLUMNS);
    builder
}

pub fn update<'args, DB>(id: TodoId, changeset: Changeset) -> QueryBuilder<'args, DB>
where
    DB: Database,
    String: Encode<'args, DB> + Type<DB>,
    bool: Encode<'args, DB> + Type<DB>,
    DateTime<Utc>: Encode<'args, DB> + Type<DB>,
    TodoId: Encode<'args, DB> + Type<DB>,
{
    debug_assert!(!changeset.is_empty());
    let mut builder = QueryBuilder::new("UPDATE todos SET ");
    for (index, (column, value)) in changeset.into_iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        builder.push(column.as_str()).push(" = ");
        match value {
            Value::Text(text) => builder.push_bind(text),
            Value::Bool(flag) => builder.push_bind(flag),
            Value::Timestamp(at) => builder.push_bind(at),
        };
    }
    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(COLUMNS);
    builder
}

pub fn delete<'args, DB>(id: TodoId) -> QueryBuilder<'args, DB>
where
    DB: Database,
    TodoId: Encode<'args, DB> + Type<DB>,
{
    let mut builder = QueryBuilder::new("DELETE FROM todos WHERE id = ");
    builder.push_bind(id);
    builder
}
