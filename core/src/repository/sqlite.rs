//! SQL-backed task storage.
//!
//! Uses an `r2d2` pool of `rusqlite` connections. Each task is one row of the
//! `tasks` table keyed by id. Besides the whole-collection
//! [`TaskRepository`] contract the repository offers keyed point operations.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::Result;
use crate::model::task::{Priority, Status, Task};
use crate::repository::traits::TaskRepository;

pub type ConnectionPool = Pool<SqliteConnectionManager>;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id         TEXT PRIMARY KEY,
    title      TEXT NOT NULL,
    body       TEXT NOT NULL DEFAULT '',
    completed  INTEGER NOT NULL DEFAULT 0,
    status     TEXT NOT NULL,
    priority   INTEGER NOT NULL,
    created_at TEXT,
    due        TEXT
);";

const COLUMNS: &str = "id, title, body, completed, status, priority, created_at, due";

/// Pool sizing and per-operation timeout.
#[derive(Clone, Debug, PartialEq)]
pub struct PoolConfig {
    pub max_open: u32,
    pub max_idle: u32,
    pub max_lifetime: Duration,
    pub timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_open: 20,
            max_idle: 10,
            max_lifetime: Duration::from_secs(3600),
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
struct BusyTimeout(Duration);

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for BusyTimeout {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.busy_timeout(self.0)
    }
}

#[derive(Clone, Debug)]
pub struct SqliteTaskRepository {
    pool: ConnectionPool,
}

impl SqliteTaskRepository {
    /// Opens (creating if needed) the database at `path` and ensures the schema.
    pub fn open(path: impl AsRef<Path>, config: &PoolConfig) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::builder()
            .max_size(config.max_open.max(1))
            .min_idle(Some(config.max_idle.min(config.max_open)))
            .max_lifetime(Some(config.max_lifetime))
            .connection_timeout(config.timeout)
            .connection_customizer(Box::new(BusyTimeout(config.timeout)))
            .build(manager)?;

        let repo = Self { pool };
        repo.migrate()?;
        debug!(path = %path.as_ref().display(), "opened sqlite task store");
        Ok(repo)
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn insert(&self, task: &Task) -> Result<()> {
        let conn = self.pool.get()?;
        insert_row(&conn, task)?;
        debug!(id = %task.id, "inserted task row");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Task>> {
        let conn = self.pool.get()?;
        let task = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    /// Returns whether a row with the task's id existed.
    pub fn update(&self, task: &Task) -> Result<bool> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE tasks
             SET title = ?2, body = ?3, completed = ?4, status = ?5,
                 priority = ?6, created_at = ?7, due = ?8
             WHERE id = ?1",
            params![
                task.id,
                task.title,
                task.body,
                task.completed,
                task.status.as_str(),
                task.priority.as_number(),
                task.created_at.map(format_timestamp),
                task.due.map(format_timestamp),
            ],
        )?;
        debug!(id = %task.id, changed, "updated task row");
        Ok(changed > 0)
    }

    /// Returns whether a row was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let removed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        debug!(id, removed, "deleted task row");
        Ok(removed > 0)
    }

    /// All rows in insertion order.
    pub fn list(&self) -> Result<Vec<Task>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM tasks ORDER BY rowid"))?;
        let tasks = stmt
            .query_map([], row_to_task)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn get_all(&self) -> Result<Vec<Task>> {
        self.list()
    }

    fn save_all(&self, tasks: &[Task]) -> Result<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM tasks", [])?;
        for task in tasks {
            insert_row(&tx, task)?;
        }
        tx.commit()?;
        debug!(count = tasks.len(), "replaced task rows");
        Ok(())
    }
}

fn insert_row(conn: &Connection, task: &Task) -> rusqlite::Result<usize> {
    conn.execute(
        &format!("INSERT INTO tasks ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
        params![
            task.id,
            task.title,
            task.body,
            task.completed,
            task.status.as_str(),
            task.priority.as_number(),
            task.created_at.map(format_timestamp),
            task.due.map(format_timestamp),
        ],
    )
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(4)?;
    let priority: i64 = row.get(5)?;
    let created_at: Option<String> = row.get(6)?;
    let due: Option<String> = row.get(7)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        completed: row.get(3)?,
        status: Status::parse(&status),
        priority: Priority::from_number(priority),
        created_at: created_at.map(|s| parse_timestamp(6, &s)).transpose()?,
        due: due.map(|s| parse_timestamp(7, &s)).transpose()?,
    })
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}
