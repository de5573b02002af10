pub mod todo;

pub use todo::{TodoItem, TodoUpdate, ValidationError};
