use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlDatabaseError};
use sqlx::query::Query;
use sqlx::{Connection, FromRow, MySql};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::database::models::TodoItem;
use crate::database::procedures::{call_statement, ProcArg};

/// MySQL's ER_DUP_ENTRY
pub const ER_DUP_ENTRY: u16 = 1062;

const EXISTS_SQL: &str = "SELECT todo_id FROM tbl_todo WHERE user_id = ? AND todo_id = ? LIMIT 1";

/// Errors from the data access layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Connection already closed")]
    Closed,

    #[error("Invalid procedure name: {0:?}")]
    InvalidProcedure(String),

    #[error("Duplicate key (code {code:?}): {message}")]
    DuplicateKey { code: Option<u16>, message: String },

    #[error("Backend error (code {code:?}): {message}")]
    Backend { code: Option<u16>, message: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Classify a driver error, keeping the MySQL error number when present.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let code = db_err
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(|e| e.number());
            let message = db_err.message().to_string();

            return if code == Some(ER_DUP_ENTRY) || db_err.is_unique_violation() {
                DatabaseError::DuplicateKey { code, message }
            } else {
                DatabaseError::Backend { code, message }
            };
        }

        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => DatabaseError::Connection(err),
            _ => DatabaseError::Sqlx(err),
        }
    }

    /// Backend error number, if the store reported one
    pub fn code(&self) -> Option<u16> {
        match self {
            DatabaseError::DuplicateKey { code, .. } | DatabaseError::Backend { code, .. } => *code,
            _ => None,
        }
    }
}

/// Source of per-request connections. Nothing is pooled: every call to
/// `acquire` opens a new connection.
#[async_trait]
pub trait Database: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn TodoConnection>, DatabaseError>;
}

/// A single live connection to the to-do store.
#[async_trait]
pub trait TodoConnection: Send {
    /// `LIMIT 1` lookup of a `(user_id, todo_id)` pair. Leaves the
    /// connection open.
    async fn exists(&mut self, user_id: i64, todo_id: i64) -> Result<bool, DatabaseError>;

    /// Run `CALL procedure(args…)` in a transaction, commit, and return the
    /// result set. Callers go through `procedures::invoke_procedure`, which
    /// also closes the connection.
    async fn call(&mut self, procedure: &str, args: &[ProcArg]) -> Result<Vec<TodoItem>, DatabaseError>;

    async fn ping(&mut self) -> Result<(), DatabaseError>;

    /// Close the connection. Safe to call more than once.
    async fn close(&mut self);
}

/// Opens a fresh MySQL connection per request
#[derive(Debug, Clone)]
pub struct MySqlDatabase {
    options: MySqlConnectOptions,
}

impl MySqlDatabase {
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        Self { options }
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn acquire(&self) -> Result<Box<dyn TodoConnection>, DatabaseError> {
        let conn = MySqlConnection::connect_with(&self.options)
            .await
            .map_err(DatabaseError::Connection)?;
        debug!("Opened database connection");
        Ok(Box::new(MySqlTodoConnection { inner: Some(conn) }))
    }
}

pub struct MySqlTodoConnection {
    inner: Option<MySqlConnection>,
}

impl MySqlTodoConnection {
    fn conn(&mut self) -> Result<&mut MySqlConnection, DatabaseError> {
        self.inner.as_mut().ok_or(DatabaseError::Closed)
    }
}

fn bind_arg<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    arg: &'q ProcArg,
) -> Query<'q, MySql, MySqlArguments> {
    match arg {
        ProcArg::Int(v) => query.bind(*v),
        ProcArg::Text(v) => query.bind(v.as_str()),
        ProcArg::Bool(v) => query.bind(*v),
        ProcArg::OptInt(v) => query.bind(*v),
    }
}

#[async_trait]
impl TodoConnection for MySqlTodoConnection {
    async fn exists(&mut self, user_id: i64, todo_id: i64) -> Result<bool, DatabaseError> {
        let row = sqlx::query(EXISTS_SQL)
            .bind(user_id)
            .bind(todo_id)
            .fetch_optional(self.conn()?)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        Ok(row.is_some())
    }

    async fn call(&mut self, procedure: &str, args: &[ProcArg]) -> Result<Vec<TodoItem>, DatabaseError> {
        let sql = call_statement(procedure, args.len())?;
        let conn = self.conn()?;

        let mut tx = conn.begin().await.map_err(DatabaseError::from_sqlx)?;
        let query = args.iter().fold(sqlx::query(&sql), bind_arg);
        let rows = query.fetch_all(&mut *tx).await.map_err(DatabaseError::from_sqlx)?;
        tx.commit().await.map_err(DatabaseError::from_sqlx)?;

        rows.iter()
            .map(|row| TodoItem::from_row(row).map_err(DatabaseError::from_sqlx))
            .collect()
    }

    async fn ping(&mut self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(self.conn()?)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(conn) = self.inner.take() {
            match conn.close().await {
                Ok(()) => debug!("Closed database connection"),
                Err(e) => warn!("Error while closing database connection: {}", e),
            }
        }
    }
}
