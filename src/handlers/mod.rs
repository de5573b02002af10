pub mod index;
pub mod todos;
