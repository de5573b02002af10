use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::collections::BTreeMap;

/// A single entry on a user's to-do list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TodoItem {
    #[sqlx(rename = "todo_id")]
    pub id: i64,
    pub data: String,
    pub completed: bool,
    pub completed_timestamp: Option<i64>,
}

/// Body of a PUT: everything but the id, which always comes from the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoUpdate {
    pub data: String,
    pub completed: bool,
    pub completed_timestamp: Option<i64>,
}

/// Errors that can occur while validating API input
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("expected a JSON object")]
    NotAnObject,
    #[error("invalid fields: {0:?}")]
    Fields(BTreeMap<String, String>),
}

const REQUIRED: &str = "field required";

impl TodoItem {
    /// Validate a POST body. Every field is checked so the client sees all
    /// problems at once; missing and mistyped fields are reported alike.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let map = value.as_object().ok_or(ValidationError::NotAnObject)?;
        let mut errors = BTreeMap::new();

        let id = match map.get("id") {
            None | Some(Value::Null) => {
                errors.insert("id".to_string(), REQUIRED.to_string());
                None
            }
            Some(v) => match v.as_i64().filter(|id| *id > 0) {
                Some(id) => Some(id),
                None => {
                    errors.insert("id".to_string(), "must be a positive integer".to_string());
                    None
                }
            },
        };
        let fields = check_fields(map, &mut errors);

        match (id, fields) {
            (Some(id), Some(fields)) if errors.is_empty() => Ok(fields.into_item(id)),
            _ => Err(ValidationError::Fields(errors)),
        }
    }
}

impl TodoUpdate {
    /// Validate a PUT body. Any `id` present is ignored.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let map = value.as_object().ok_or(ValidationError::NotAnObject)?;
        let mut errors = BTreeMap::new();

        match check_fields(map, &mut errors) {
            Some(fields) if errors.is_empty() => Ok(fields),
            _ => Err(ValidationError::Fields(errors)),
        }
    }

    pub fn into_item(self, id: i64) -> TodoItem {
        TodoItem {
            id,
            data: self.data,
            completed: self.completed,
            completed_timestamp: self.completed_timestamp,
        }
    }
}

fn check_fields(map: &Map<String, Value>, errors: &mut BTreeMap<String, String>) -> Option<TodoUpdate> {
    let data = match map.get("data") {
        None | Some(Value::Null) => {
            errors.insert("data".to_string(), REQUIRED.to_string());
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.insert("data".to_string(), "must be a string".to_string());
            None
        }
    };

    let completed = match map.get("completed") {
        None | Some(Value::Null) => {
            errors.insert("completed".to_string(), REQUIRED.to_string());
            None
        }
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            errors.insert("completed".to_string(), "must be a boolean".to_string());
            None
        }
    };

    let completed_timestamp = match map.get("completed_timestamp") {
        None | Some(Value::Null) => Some(None),
        Some(v) => match v.as_i64() {
            Some(ts) => Some(Some(ts)),
            None => {
                errors.insert(
                    "completed_timestamp".to_string(),
                    "must be an integer or null".to_string(),
                );
                None
            }
        },
    };

    Some(TodoUpdate {
        data: data?,
        completed: completed?,
        completed_timestamp: completed_timestamp?,
    })
}
