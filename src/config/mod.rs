use once_cell::sync::Lazy;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Connection settings for the MySQL store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Emit debug-level events instead of info
    pub debug: bool,
    /// Running behind a front-end server that collects our stderr
    pub behind_proxy: bool,
    /// Optional file that receives a copy of every log line
    pub file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
}

impl DatabaseConfig {
    pub const DEFAULT_HOST: &'static str = "localhost";
    pub const DEFAULT_PORT: u16 = 3306;
    pub const DEFAULT_USER: &'static str = "todo_user";
    pub const DEFAULT_PASSWORD: &'static str = "";
    pub const DEFAULT_DATABASE: &'static str = "db_todo";

    /// Fixed local defaults, used whenever the environment is incomplete.
    pub fn local() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
            user: Self::DEFAULT_USER.to_string(),
            password: Self::DEFAULT_PASSWORD.to_string(),
            database: Self::DEFAULT_DATABASE.to_string(),
        }
    }

    /// Host, user, password and database are taken together: if any one of
    /// them is missing or empty all four revert to the local defaults.
    pub fn from_vars(
        host: Option<String>,
        user: Option<String>,
        password: Option<String>,
        database: Option<String>,
        port: Option<String>,
    ) -> Self {
        let port = port
            .and_then(|p| p.parse().ok())
            .unwrap_or(Self::DEFAULT_PORT);

        match (host, user, password, database) {
            (Some(host), Some(user), Some(password), Some(database))
                if [&host, &user, &password, &database].iter().all(|v| !v.is_empty()) =>
            {
                Self { host, port, user, password, database }
            }
            _ => Self { port, ..Self::local() },
        }
    }

    pub fn from_env() -> Self {
        Self::from_vars(
            env::var("MYSQLDB_HOST").ok(),
            env::var("MYSQLDB_USER").ok(),
            env::var("MYSQLDB_PASSWORD").ok(),
            env::var("MYSQLDB_DB").ok(),
            env::var("MYSQLDB_PORT").ok(),
        )
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        self.database = DatabaseConfig::from_env();

        // Logging overrides
        if let Ok(v) = env::var("IS_PRODUCTION") {
            if v == "false" {
                self.logging.debug = true;
            }
        }
        if let Ok(v) = env::var("LOG_DEBUG") {
            self.logging.debug = v.parse().unwrap_or(self.logging.debug);
        }
        if let Ok(v) = env::var("LOG_BEHIND_PROXY") {
            self.logging.behind_proxy = v.parse().unwrap_or(self.logging.behind_proxy);
        }
        if let Ok(v) = env::var("LOG_FILE") {
            self.logging.file = Some(v).filter(|path| !path.trim().is_empty());
        }

        // Allow tests or deployments to override port via env
        if let Some(port) = env::var("TODO_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig::local(),
            logging: LoggingConfig {
                debug: true,
                behind_proxy: false,
                file: None,
            },
            api: ApiConfig { port: 3000 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig::local(),
            logging: LoggingConfig {
                debug: false,
                behind_proxy: true,
                file: None,
            },
            api: ApiConfig { port: 3000 },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.logging.debug);
        assert!(!config.logging.behind_proxy);
        assert_eq!(config.api.port, 3000);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.logging.debug);
        assert!(config.logging.behind_proxy);
    }

    #[test]
    fn complete_database_env_is_used() {
        let db = DatabaseConfig::from_vars(
            some("db.internal"),
            some("svc"),
            some("secret"),
            some("todos"),
            some("3307"),
        );
        assert_eq!(db.host, "db.internal");
        assert_eq!(db.user, "svc");
        assert_eq!(db.password, "secret");
        assert_eq!(db.database, "todos");
        assert_eq!(db.port, 3307);
    }

    #[test]
    fn partial_database_env_falls_back_entirely() {
        let db = DatabaseConfig::from_vars(some("db.internal"), some("svc"), None, some("todos"), None);
        assert_eq!(db, DatabaseConfig::local());
    }

    #[test]
    fn bad_port_keeps_default() {
        let db = DatabaseConfig::from_vars(None, None, None, None, some("not-a-port"));
        assert_eq!(db.port, DatabaseConfig::DEFAULT_PORT);
    }
}
