use axum::{
    extract::State,
    http::StatusCode,
};
use tracing::info;

use crate::app::AppState;
use crate::database::procedures;
use crate::error::ApiError;

use super::utils::{ensure_presence, parse_id, Expect, PathParams};

/// DELETE /todos/:user_id/:todo_id - Remove a to-do item
pub async fn delete(
    State(state): State<AppState>,
    PathParams((user_id, todo_id)): PathParams<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_id(&user_id, "user id")?;
    let todo_id = parse_id(&todo_id, "todo id")?;
    info!(user_id, todo_id, "Deleting to-do");

    let conn = state.db.acquire().await?;
    let conn = ensure_presence(conn, user_id, todo_id, Expect::Present).await?;
    procedures::delete_todo(conn, user_id, todo_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
