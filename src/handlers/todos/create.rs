use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use tracing::info;

use crate::app::AppState;
use crate::database::{procedures, TodoItem};
use crate::error::ApiError;

use super::utils::{ensure_presence, parse_id, parse_json_body, require_json, Expect, PathParams};

/// POST /todos/:user_id - Add a to-do item and echo it back
///
/// Checks run in a fixed order and stop at the first failure: content type,
/// body, path id, existence, then the `add` procedure. The existence check
/// only gives a friendlier answer; a duplicate key from the store is still
/// reported as 409.
///
/// The `add` procedure has no timestamp parameter, so a timestamp sent with
/// the item is written by a follow-up `update` call.
pub async fn create(
    State(state): State<AppState>,
    PathParams(user_id): PathParams<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TodoItem>, ApiError> {
    require_json(&headers)?;
    let item = TodoItem::from_json(&parse_json_body(&body)?)?;
    let user_id = parse_id(&user_id, "user id")?;
    info!(user_id, todo_id = item.id, "Adding to-do");

    let conn = state.db.acquire().await?;
    let conn = ensure_presence(conn, user_id, item.id, Expect::Absent).await?;
    procedures::add_todo(conn, user_id, &item).await?;

    if item.completed_timestamp.is_some() {
        let conn = state.db.acquire().await?;
        procedures::update_todo(conn, user_id, &item).await?;
    }

    Ok(Json(item))
}
