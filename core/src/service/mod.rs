pub mod task_service;
pub mod view;

pub use task_service::TaskService;
pub use view::{filter_tasks, query_tasks, sort_tasks};
