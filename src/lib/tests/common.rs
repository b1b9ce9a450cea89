use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use crate::adapters::HttpServer;
use crate::core::{Changeset, Todo, TodoDraft, TodoError, TodoId};
use crate::storage::{SqliteStore, TodoStore};

pub type TestResult = Result<(), Box<dyn Error>>;

pub async fn sqlite_router() -> Result<Router, Box<dyn Error>> {
    let store = SqliteStore::in_memory().await?;
    Ok(HttpServer::new(Arc::new(store)).router())
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> Result<(StatusCode, Value), Box<dyn Error>> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = router.clone().oneshot(builder.body(body)?).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

pub async fn create(router: &Router, body: &str) -> Result<Value, Box<dyn Error>> {
    let (status, todo) = send(router, Method::POST, "/todos", Some(body)).await?;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {todo}");
    Ok(todo)
}

/// A store whose database is always unreachable.
pub struct FailingStore;

fn unreachable_database() -> TodoError {
    TodoError::Storage(sqlx::Error::Protocol(
        "connection to 10.0.0.5:5432 refused for user admin".into(),
    ))
}

#[async_trait]
impl TodoStore for FailingStore {
    async fn list(&self, _completed: Option<bool>) -> Result<Vec<Todo>, TodoError> {
        Err(unreachable_database())
    }

    async fn get(&self, _id: TodoId) -> Result<Option<Todo>, TodoError> {
        Err(unreachable_database())
    }

    async fn create(&self, _draft: TodoDraft) -> Result<Todo, TodoError> {
        Err(unreachable_database())
    }

    async fn update(&self, _id: TodoId, _changeset: Changeset) -> Result<Option<Todo>, TodoError> {
        Err(unreachable_database())
    }

    async fn delete(&self, _id: TodoId) -> Result<bool, TodoError> {
        Err(unreachable_database())
    }

    async fn ping(&self) -> Result<(), TodoError> {
        Err(unreachable_database())
    }
}
