use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;

use crate::core::{parse_bool, parse_id, NewTodo, Todo, TodoError, TodoPatch, TodoService};
use crate::storage::TodoStore;

#[cfg(feature = "tracing")]
use tracing::{info, info_span, warn};
#[cfg(feature = "tracing")]
use tower_http::trace::TraceLayer;

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub completed: Option<String>,
}

pub struct HttpServer<S: TodoStore + 'static> {
    service: TodoService<S>,
}

impl<S: TodoStore + 'static> HttpServer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            service: TodoService::new(store),
        }
    }

    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/health", get(Self::health))
            .route("/todos", get(Self::list_todos).post(Self::create_todo))
            .route(
                "/todos/{id}",
                get(Self::get_todo)
                    .put(Self::update_todo)
                    .delete(Self::delete_todo),
            )
            .fallback(Self::fallback)
            .with_state(self.service.clone());

        #[cfg(feature = "tracing")]
        let router = router.layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::extract::Request| {
                let uri = request.uri().to_string();
                info_span!("http_request", method = ?request.method(), uri)
            },
        ));

        router
    }

    /// Serves until ctrl-c, letting in-flight requests finish.
    pub async fn serve(&self, config: &HttpConfig) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(&config.addr)
            .await
            .with_context(|| format!("failed to listen on {}", config.addr))?;
        #[cfg(feature = "tracing")]
        info!(addr = %config.addr, "HTTP server started");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("received error from running server")?;
        Ok(())
    }

    async fn health(State(service): State<TodoService<S>>) -> Response {
        match service.health().await {
            Ok(()) => (StatusCode::OK, Json(json!({ "status": "healthy" }))).into_response(),
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %e, "Health check failed");
                #[cfg(not(feature = "tracing"))]
                eprintln!("Health check failed: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "status": "unhealthy" })),
                )
                    .into_response()
            }
        }
    }

    async fn list_todos(
        State(service): State<TodoService<S>>,
        query: Result<Query<ListParams>, QueryRejection>,
    ) -> Result<Json<Vec<Todo>>, TodoError> {
        let Query(params) = query.map_err(|rejection| TodoError::InvalidQuery(rejection.body_text()))?;
        let completed = match params.completed.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(parse_bool(raw)?),
        };
        Ok(Json(service.list(completed).await?))
    }

    async fn get_todo(
        State(service): State<TodoService<S>>,
        Path(id): Path<String>,
    ) -> Result<Json<Todo>, TodoError> {
        let id = parse_id(&id)?;
        Ok(Json(service.get(id).await?))
    }

    async fn create_todo(
        State(service): State<TodoService<S>>,
        body: Bytes,
    ) -> Result<(StatusCode, Json<Todo>), TodoError> {
        let input: NewTodo = parse_body(&body)?;
        let todo = service.create(input).await?;
        Ok((StatusCode::CREATED, Json(todo)))
    }

    async fn update_todo(
        State(service): State<TodoService<S>>,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Json<Todo>, TodoError> {
        let id = parse_id(&id)?;
        let patch: TodoPatch = parse_body(&body)?;
        Ok(Json(service.update(id, patch).await?))
    }

    async fn delete_todo(
        State(service): State<TodoService<S>>,
        Path(id): Path<String>,
    ) -> Result<StatusCode, TodoError> {
        let id = parse_id(&id)?;
        service.delete(id).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// Handles paths no route matched. `/todos/{id}/` (trailing slashes) is
    /// served as `/todos/{id}`; anything else under `/todos/` is a bad path.
    async fn fallback(
        State(service): State<TodoService<S>>,
        method: Method,
        uri: Uri,
        body: Bytes,
    ) -> Response {
        let Some(rest) = uri.path().strip_prefix("/todos/") else {
            return (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response();
        };
        let id = rest.trim_end_matches('/');
        if id.is_empty() || id.contains('/') || id.len() == rest.len() {
            return TodoError::InvalidPath.into_response();
        }
        let id = Path(id.to_string());
        match method {
            Method::GET | Method::HEAD => Self::get_todo(State(service), id).await.into_response(),
            Method::PUT => Self::update_todo(State(service), id, body).await.into_response(),
            Method::DELETE => Self::delete_todo(State(service), id).await.into_response(),
            _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
        }
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, TodoError> {
    serde_json::from_slice(body).map_err(|e| TodoError::InvalidBody(e.to_string()))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        #[cfg(feature = "tracing")]
        info!("Shutdown signal received");
    }
}
