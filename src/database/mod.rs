pub mod manager;
pub mod models;
pub mod procedures;

pub use manager::{Database, DatabaseError, MySqlDatabase, TodoConnection};
pub use models::{TodoItem, TodoUpdate};
pub use procedures::{invoke_procedure, ProcArg};
