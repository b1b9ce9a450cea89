use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::error;

#[derive(Error, Debug)]
pub enum TodoError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Title is required")]
    EmptyTitle,
    #[error("Invalid ID: {0}")]
    InvalidId(String),
    #[error("Invalid completed parameter: {0}")]
    InvalidFilter(String),
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
    #[error("Invalid path")]
    InvalidPath,
    #[error("No fields to update")]
    NoFieldsToUpdate,
    #[error("Todo {0} not found")]
    NotFound(i32),
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl TodoError {
    pub fn status(&self) -> StatusCode {
        match self {
            TodoError::InvalidBody(_)
            | TodoError::EmptyTitle
            | TodoError::InvalidId(_)
            | TodoError::InvalidFilter(_)
            | TodoError::InvalidQuery(_)
            | TodoError::InvalidPath
            | TodoError::NoFieldsToUpdate => StatusCode::BAD_REQUEST,
            TodoError::NotFound(_) => StatusCode::NOT_FOUND,
            TodoError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            TodoError::Storage(e) => {
                #[cfg(feature = "tracing")]
                error!(error = %e, "Storage failure");
                #[cfg(not(feature = "tracing"))]
                eprintln!("Storage failure: {}", e);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
