pub mod app;
pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod repository;
pub mod service;
pub mod time;

pub use app::App;
pub use config::{AppConfig, Backend, DbConfig};
pub use error::{Result, StorageError, TaskError};
pub use input::{expand_key, parse_args, ParsedInput, TASK_KEYS};
pub use model::{Direction, Filter, Priority, SortKey, Status, Task, TaskQuery};
pub use repository::{FileTaskRepository, SqliteTaskRepository, TaskRepository};
pub use service::{filter_tasks, sort_tasks, TaskService};
pub use time::{parse_bound, parse_human_date};
