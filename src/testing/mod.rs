use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::database::manager::{Database, DatabaseError, TodoConnection, ER_DUP_ENTRY};
use crate::database::models::TodoItem;
use crate::database::procedures::{call_statement, ProcArg, ADD_TODO, DELETE_TODO, GET_TODOS, UPDATE_TODO};

/// In-memory stand-in for the MySQL store, scoped to a single test.
///
/// Behaves like the stored procedures and also tracks every connection it
/// hands out, so tests can assert that handlers close what they open.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    todos: BTreeMap<(i64, i64), TodoItem>,
    calls: Vec<(String, Vec<ProcArg>)>,
    acquired: usize,
    open: usize,
    fail_code: Option<u16>,
    refuse_connections: bool,
    blind_existence_check: bool,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, user_id: i64, item: TodoItem) {
        self.lock().todos.insert((user_id, item.id), item);
    }

    pub fn get(&self, user_id: i64, todo_id: i64) -> Option<TodoItem> {
        self.lock().todos.get(&(user_id, todo_id)).cloned()
    }

    /// Every procedure call, in order, with its positional arguments
    pub fn calls(&self) -> Vec<(String, Vec<ProcArg>)> {
        self.lock().calls.clone()
    }

    /// Connections handed out so far
    pub fn acquired(&self) -> usize {
        self.lock().acquired
    }

    /// Connections handed out and not yet closed
    pub fn open_connections(&self) -> usize {
        self.lock().open
    }

    /// Make every subsequent procedure call fail with this MySQL error number
    pub fn fail_calls_with_code(&self, code: u16) {
        self.lock().fail_code = Some(code);
    }

    pub fn refuse_connections(&self) {
        self.lock().refuse_connections = true;
    }

    /// Existence checks always report "absent", as when another request
    /// inserts between our check and our call.
    pub fn blind_existence_check(&self) {
        self.lock().blind_existence_check = true;
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn acquire(&self) -> Result<Box<dyn TodoConnection>, DatabaseError> {
        let mut state = self.lock();
        if state.refuse_connections {
            return Err(DatabaseError::Connection(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))));
        }
        state.acquired += 1;
        state.open += 1;

        Ok(Box::new(MemoryConnection {
            db: self.clone(),
            open: true,
        }))
    }
}

struct MemoryConnection {
    db: MemoryDatabase,
    open: bool,
}

impl MemoryConnection {
    fn ensure_open(&self) -> Result<(), DatabaseError> {
        if self.open {
            Ok(())
        } else {
            Err(DatabaseError::Closed)
        }
    }
}

#[async_trait]
impl TodoConnection for MemoryConnection {
    async fn exists(&mut self, user_id: i64, todo_id: i64) -> Result<bool, DatabaseError> {
        self.ensure_open()?;
        let state = self.db.lock();
        Ok(!state.blind_existence_check && state.todos.contains_key(&(user_id, todo_id)))
    }

    async fn call(&mut self, procedure: &str, args: &[ProcArg]) -> Result<Vec<TodoItem>, DatabaseError> {
        self.ensure_open()?;
        call_statement(procedure, args.len())?;

        let mut state = self.db.lock();
        state.calls.push((procedure.to_string(), args.to_vec()));

        if let Some(code) = state.fail_code {
            return Err(DatabaseError::Backend {
                code: Some(code),
                message: "simulated failure".to_string(),
            });
        }

        match (procedure, args) {
            (GET_TODOS, [ProcArg::Int(user_id)]) => Ok(state
                .todos
                .iter()
                .filter(|((user, _), _)| user == user_id)
                .map(|(_, item)| item.clone())
                .collect()),
            (ADD_TODO, [ProcArg::Int(user_id), ProcArg::Int(id), ProcArg::Text(data), ProcArg::Bool(completed)]) => {
                if state.todos.contains_key(&(*user_id, *id)) {
                    return Err(DatabaseError::DuplicateKey {
                        code: Some(ER_DUP_ENTRY),
                        message: format!("Duplicate entry '{}-{}' for key 'PRIMARY'", user_id, id),
                    });
                }
                let item = TodoItem {
                    id: *id,
                    data: data.clone(),
                    completed: *completed,
                    completed_timestamp: None,
                };
                state.todos.insert((*user_id, *id), item);
                Ok(vec![])
            }
            (
                UPDATE_TODO,
                [ProcArg::Int(user_id), ProcArg::Int(id), ProcArg::Text(data), ProcArg::Bool(completed), ProcArg::OptInt(ts)],
            ) => {
                if let Some(item) = state.todos.get_mut(&(*user_id, *id)) {
                    item.data = data.clone();
                    item.completed = *completed;
                    item.completed_timestamp = *ts;
                }
                Ok(vec![])
            }
            (DELETE_TODO, [ProcArg::Int(user_id), ProcArg::Int(id)]) => {
                state.todos.remove(&(*user_id, *id));
                Ok(vec![])
            }
            _ => Err(DatabaseError::Backend {
                code: Some(1318),
                message: format!("Incorrect number of arguments for PROCEDURE {}", procedure),
            }),
        }
    }

    async fn ping(&mut self) -> Result<(), DatabaseError> {
        self.ensure_open()
    }

    async fn close(&mut self) {
        if self.open {
            self.open = false;
            self.db.lock().open -= 1;
        }
    }
}
