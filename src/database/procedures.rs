//! Stored procedure calls. Arguments are positional, so each helper below is
//! the single place that fixes the argument order for its procedure.

use crate::database::manager::{DatabaseError, TodoConnection};
use crate::database::models::TodoItem;

pub const GET_TODOS: &str = "get_todos_for_user_id";
pub const ADD_TODO: &str = "add_todo_for_user_id";
pub const UPDATE_TODO: &str = "update_todo_for_user_id";
pub const DELETE_TODO: &str = "delete_todo_for_user_id";

/// One positional procedure argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcArg {
    Int(i64),
    Text(String),
    Bool(bool),
    OptInt(Option<i64>),
}

/// Procedure names are spliced into SQL, so only plain identifiers pass.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 64 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `CALL name(?, ?, …)` with one placeholder per argument
pub fn call_statement(procedure: &str, arity: usize) -> Result<String, DatabaseError> {
    if !is_valid_identifier(procedure) {
        return Err(DatabaseError::InvalidProcedure(procedure.to_string()));
    }
    let placeholders = vec!["?"; arity].join(", ");
    Ok(format!("CALL {}({})", procedure, placeholders))
}

/// Call `procedure` and close the connection, whatever the outcome.
pub async fn invoke_procedure(
    mut conn: Box<dyn TodoConnection>,
    procedure: &str,
    args: Vec<ProcArg>,
) -> Result<Vec<TodoItem>, DatabaseError> {
    let result = conn.call(procedure, &args).await;
    conn.close().await;

    if let Err(e) = &result {
        tracing::error!(procedure, args = ?args, code = ?e.code(), "Stored procedure failed: {}", e);
    }
    result
}

pub async fn get_todos(conn: Box<dyn TodoConnection>, user_id: i64) -> Result<Vec<TodoItem>, DatabaseError> {
    invoke_procedure(conn, GET_TODOS, vec![ProcArg::Int(user_id)]).await
}

/// The add procedure takes no timestamp; callers store one with `update_todo`.
pub async fn add_todo(
    conn: Box<dyn TodoConnection>,
    user_id: i64,
    item: &TodoItem,
) -> Result<(), DatabaseError> {
    let args = vec![
        ProcArg::Int(user_id),
        ProcArg::Int(item.id),
        ProcArg::Text(item.data.clone()),
        ProcArg::Bool(item.completed),
    ];
    invoke_procedure(conn, ADD_TODO, args).await.map(|_| ())
}

pub async fn update_todo(
    conn: Box<dyn TodoConnection>,
    user_id: i64,
    item: &TodoItem,
) -> Result<(), DatabaseError> {
    let args = vec![
        ProcArg::Int(user_id),
        ProcArg::Int(item.id),
        ProcArg::Text(item.data.clone()),
        ProcArg::Bool(item.completed),
        ProcArg::OptInt(item.completed_timestamp),
    ];
    invoke_procedure(conn, UPDATE_TODO, args).await.map(|_| ())
}

pub async fn delete_todo(
    conn: Box<dyn TodoConnection>,
    user_id: i64,
    todo_id: i64,
) -> Result<(), DatabaseError> {
    let args = vec![ProcArg::Int(user_id), ProcArg::Int(todo_id)];
    invoke_procedure(conn, DELETE_TODO, args).await.map(|_| ())
}
