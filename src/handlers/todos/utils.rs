use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path};
use axum::http::{header::CONTENT_TYPE, request::Parts, HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::database::TodoConnection;
use crate::error::ApiError;

/// `Path` whose rejections use the JSON error body. Segments are taken as raw
/// strings; the handlers parse ids themselves once the body has been checked.
pub struct PathParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(PathParams(params))
    }
}

/// Accepts `application/json`, with or without parameters such as charset.
pub fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|media| media.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false);

    if is_json {
        Ok(())
    } else {
        Err(ApiError::bad_request("Content-Type not supported, expected application/json"))
    }
}

pub fn parse_json_body(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected malformed JSON body: {}", e);
        ApiError::invalid_json("Request body is not valid JSON")
    })
}

/// Path identifiers must be positive integers
pub fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request(format!("{} must be a positive integer", what))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Present,
    Absent,
}

/// Run the existence check and hand the connection back when the todo is in
/// the expected state. On any other outcome the connection is closed here.
pub async fn ensure_presence(
    mut conn: Box<dyn TodoConnection>,
    user_id: i64,
    todo_id: i64,
    expect: Expect,
) -> Result<Box<dyn TodoConnection>, ApiError> {
    let outcome = match (conn.exists(user_id, todo_id).await, expect) {
        (Ok(true), Expect::Present) | (Ok(false), Expect::Absent) => Ok(()),
        (Ok(false), Expect::Present) => Err(ApiError::not_found(format!(
            "To-do item {} not found for user {}",
            todo_id, user_id
        ))),
        (Ok(true), Expect::Absent) => Err(ApiError::conflict(format!(
            "To-do item {} already exists for user {}",
            todo_id, user_id
        ))),
        (Err(e), _) => {
            tracing::error!(user_id, todo_id, "Existence check failed: {}", e);
            Err(e.into())
        }
    };

    match outcome {
        Ok(()) => Ok(conn),
        Err(e) => {
            conn.close().await;
            Err(e)
        }
    }
}
