//! Runtime configuration read from environment variables.
//!
//! Every variable has a hard-coded default; empty values count as unset and
//! unparseable numbers are logged and ignored.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::error::Result;
use crate::repository::file::{default_data_dir, FileTaskRepository};
use crate::repository::sqlite::{PoolConfig, SqliteTaskRepository};
use crate::repository::TaskRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    File,
    Sqlite,
}

impl Backend {
    /// Unknown names fall back to the JSON file store.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "sqlite" | "sql" | "db" | "database" => Backend::Sqlite,
            _ => Backend::File,
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub pool: PoolConfig,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "admin".to_string(),
            password: "admin".to_string(),
            database: "todo".to_string(),
            pool: PoolConfig::default(),
        }
    }
}

impl DbConfig {
    /// Connection string with the password redacted, for logs and diagnostics.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password=*** dbname={}",
            self.host, self.port, self.user, self.database
        )
    }

    pub fn sqlite_path(&self, data_dir: &std::path::Path) -> PathBuf {
        data_dir.join(format!("{}.sqlite3", self.database))
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("pool", &self.pool)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppConfig {
    pub backend: Backend,
    /// `None` means `~/.todo`.
    pub data_dir: Option<PathBuf>,
    pub db: DbConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = AppConfig::default();

        if let Some(backend) = read("TODO_BACKEND") {
            config.backend = Backend::parse(&backend);
        }
        config.data_dir = read("TODO_DATA_DIR").map(PathBuf::from);

        let db = &mut config.db;
        if let Some(host) = read("TODO_DB_HOST") {
            db.host = host;
        }
        if let Some(port) = read_number(&read, "TODO_DB_PORT") {
            db.port = port;
        }
        if let Some(user) = read("TODO_DB_USER") {
            db.user = user;
        }
        if let Some(password) = read("TODO_DB_PASSWORD") {
            db.password = password;
        }
        if let Some(database) = read("TODO_DB_NAME") {
            db.database = database;
        }
        if let Some(max_open) = read_number(&read, "TODO_DB_MAX_OPEN") {
            db.pool.max_open = max_open;
        }
        if let Some(max_idle) = read_number(&read, "TODO_DB_MAX_IDLE") {
            db.pool.max_idle = max_idle;
        }
        if let Some(secs) = read_number(&read, "TODO_DB_MAX_LIFETIME_SECS") {
            db.pool.max_lifetime = Duration::from_secs(secs);
        }
        if let Some(secs) = read_number(&read, "TODO_DB_TIMEOUT_SECS") {
            db.pool.timeout = Duration::from_secs(secs);
        }

        config
    }

    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    /// Builds the configured repository.
    pub fn open_repository(&self) -> Result<Box<dyn TaskRepository>> {
        let dir = self.resolved_data_dir()?;
        match self.backend {
            Backend::File => Ok(Box::new(FileTaskRepository::in_data_dir(Some(dir))?)),
            Backend::Sqlite => {
                std::fs::create_dir_all(&dir)?;
                let path = self.db.sqlite_path(&dir);
                tracing::info!(
                    path = %path.display(),
                    connection = %self.db.connection_string(),
                    "using sqlite task store"
                );
                Ok(Box::new(SqliteTaskRepository::open(path, &self.db.pool)?))
            }
        }
    }
}

fn read_number<T, F>(read: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = read(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "invalid numeric env var, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.data_dir, None);
        assert_eq!(config.db.host, "localhost");
        assert_eq!(config.db.port, 5432);
        assert_eq!(config.db.user, "admin");
        assert_eq!(config.db.database, "todo");
        assert_eq!(config.db.pool, PoolConfig::default());
    }

    #[test]
    fn test_overrides_from_env() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("TODO_BACKEND", "sqlite"),
            ("TODO_DATA_DIR", "/tmp/todo-data"),
            ("TODO_DB_HOST", "db.internal"),
            ("TODO_DB_PORT", "6543"),
            ("TODO_DB_NAME", "personal"),
            ("TODO_DB_MAX_OPEN", "4"),
            ("TODO_DB_TIMEOUT_SECS", "2"),
        ]));
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/todo-data")));
        assert_eq!(config.db.host, "db.internal");
        assert_eq!(config.db.port, 6543);
        assert_eq!(config.db.pool.max_open, 4);
        assert_eq!(config.db.pool.timeout, Duration::from_secs(2));
        assert_eq!(
            config.db.sqlite_path(&PathBuf::from("/data")),
            PathBuf::from("/data/personal.sqlite3")
        );
    }

    #[test]
    fn test_empty_and_invalid_values_keep_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("TODO_DB_HOST", ""),
            ("TODO_DB_PORT", "not-a-port"),
            ("TODO_BACKEND", "mongodb"),
        ]));
        assert_eq!(config.db.host, "localhost");
        assert_eq!(config.db.port, 5432);
        assert_eq!(config.backend, Backend::File);
    }

    #[test]
    fn test_password_is_redacted() {
        let config = DbConfig {
            password: "hunter2".to_string(),
            ..DbConfig::default()
        };
        assert!(!config.connection_string().contains("hunter2"));
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_open_repository_for_each_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..AppConfig::default()
        };
        config.db.pool.max_idle = 0;

        let file_repo = config.open_repository().unwrap();
        assert!(file_repo.get_all().unwrap().is_empty());

        config.backend = Backend::Sqlite;
        let sql_repo = config.open_repository().unwrap();
        assert!(sql_repo.get_all().unwrap().is_empty());
        assert!(dir.path().join("todo.sqlite3").exists());
    }
}
