use axum::{
    http::{header, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::Database;
use crate::error::ApiError;
use crate::handlers::{index, todos};

/// Shared, immutable per-process state. Holds connection settings only;
/// every request opens its own connection.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
}

impl AppState {
    pub fn new(db: impl Database + 'static) -> Self {
        Self { db: Arc::new(db) }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(index::root))
        .route("/health", get(index::health))
        .merge(todo_routes())
        .fallback(index::not_found)
        // Global middleware
        .layer(map_response(json_method_not_allowed))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn todo_routes() -> Router<AppState> {
    use axum::routing::put;

    Router::new()
        .route("/todos/:user_id", get(todos::list).post(todos::create))
        .route("/todos/:user_id/:todo_id", put(todos::update).delete(todos::delete))
}

/// Axum answers 405 with an empty body; give it the same JSON shape as
/// every other error.
async fn json_method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut replacement = ApiError::method_not_allowed("Method not allowed").into_response();
    if let Some(allow) = allow {
        replacement.headers_mut().insert(header::ALLOW, allow);
    }
    replacement
}
