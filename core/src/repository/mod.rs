pub mod file;
pub mod sqlite;
pub mod traits;

// Re-export
pub use file::FileTaskRepository;
pub use sqlite::{PoolConfig, SqliteTaskRepository};
pub use traits::TaskRepository;
