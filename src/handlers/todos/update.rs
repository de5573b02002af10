use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use tracing::info;

use crate::app::AppState;
use crate::database::{procedures, TodoItem, TodoUpdate};
use crate::error::ApiError;

use super::utils::{ensure_presence, parse_id, parse_json_body, require_json, Expect, PathParams};

/// PUT /todos/:user_id/:todo_id - Replace an existing to-do item
///
/// The id in the response is always the one from the path.
pub async fn update(
    State(state): State<AppState>,
    PathParams((user_id, todo_id)): PathParams<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TodoItem>, ApiError> {
    require_json(&headers)?;
    let update = TodoUpdate::from_json(&parse_json_body(&body)?)?;
    let user_id = parse_id(&user_id, "user id")?;
    let todo_id = parse_id(&todo_id, "todo id")?;
    info!(user_id, todo_id, "Updating to-do");

    let conn = state.db.acquire().await?;
    let conn = ensure_presence(conn, user_id, todo_id, Expect::Present).await?;

    let item = update.into_item(todo_id);
    procedures::update_todo(conn, user_id, &item).await?;

    Ok(Json(item))
}
