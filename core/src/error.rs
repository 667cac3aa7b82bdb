use thiserror::Error;

/// Failures raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed task data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("repository lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task text is empty")]
    EmptyText,

    #[error("task id is empty")]
    EmptyId,

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("task not found: {0}")]
    NotFound(String),

    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TaskError {
    /// True for errors caused by the caller's input rather than by storage.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TaskError::EmptyText | TaskError::EmptyId | TaskError::InvalidDate(_)
        )
    }
}

impl From<std::io::Error> for TaskError {
    fn from(err: std::io::Error) -> Self {
        TaskError::Storage(StorageError::Io(err))
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(err: serde_json::Error) -> Self {
        TaskError::Storage(StorageError::Malformed(err))
    }
}

impl From<rusqlite::Error> for TaskError {
    fn from(err: rusqlite::Error) -> Self {
        TaskError::Storage(StorageError::Sqlite(err))
    }
}

impl From<r2d2::Error> for TaskError {
    fn from(err: r2d2::Error) -> Self {
        TaskError::Storage(StorageError::Pool(err))
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
