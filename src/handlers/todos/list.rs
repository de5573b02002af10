use axum::{
    extract::State,
    Json,
};
use tracing::info;

use crate::app::AppState;
use crate::database::{procedures, TodoItem};
use crate::error::ApiError;

use super::utils::{parse_id, PathParams};

/// GET /todos/:user_id - All to-do items for a user
pub async fn list(
    State(state): State<AppState>,
    PathParams(user_id): PathParams<String>,
) -> Result<Json<Vec<TodoItem>>, ApiError> {
    let user_id = parse_id(&user_id, "user id")?;
    info!(user_id, "Listing to-dos");

    let conn = state.db.acquire().await?;
    let todos = procedures::get_todos(conn, user_id).await?;

    Ok(Json(todos))
}
