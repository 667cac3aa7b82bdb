//! Boundary between an external caller (UI bridge, CLI) and the service.
//!
//! Parameters arrive as loosely typed strings and numbers. They are parsed
//! here into closed enums, with a fallback for anything unrecognised, and
//! results leave as JSON where the caller expects text.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::error::{Result, TaskError};
use crate::model::query::{Direction, Filter, SortKey, TaskQuery};
use crate::model::task::{Priority, Status, Task};
use crate::repository::TaskRepository;
use crate::service::TaskService;
use crate::time::parse_bound;

pub struct App<R: TaskRepository> {
    service: TaskService<R>,
}

impl<R: TaskRepository> App<R> {
    pub fn new(repo: R) -> Self {
        Self {
            service: TaskService::new(repo),
        }
    }

    pub fn service(&self) -> &TaskService<R> {
        &self.service
    }

    /// Lists tasks for a named filter and sort, serialized as a JSON array.
    pub fn get_tasks(&self, filter: &str, sort: &str) -> Result<String> {
        let filter = Filter::parse(filter);
        let sort = SortKey::parse(sort);
        let tasks = logged("get_tasks", self.service.list_tasks(filter, sort))?;
        debug!(filter = filter.as_str(), sort = sort.as_str(), count = tasks.len(), "retrieved tasks");
        encode(&tasks)
    }

    /// Adds a task. `due_millis` is a Unix timestamp in milliseconds; zero or
    /// negative means no due date.
    pub fn add_task(&self, text: &str, priority: &str, due_millis: i64) -> Result<String> {
        let priority = Priority::parse(priority);
        let due = due_from_millis(due_millis);
        let task = logged("add_task", self.service.add_task(text, priority, due))?;
        encode(&task)
    }

    pub fn create_task(&self, task: Task) -> Result<Task> {
        if task.created_at.is_none() {
            debug!("created_at missing from caller, defaulting to now");
        }
        logged("create_task", self.service.create_task(task))
    }

    pub fn get_task(&self, id: &str) -> Result<Task> {
        logged("get_task", self.service.get_task(id))
    }

    pub fn update_task(&self, task: &Task) -> Result<()> {
        logged("update_task", self.service.update_task(task))
    }

    pub fn update_task_status(&self, id: &str, status: &str) -> Result<()> {
        let status = Status::parse(status);
        logged("update_task_status", self.service.update_task_status(id, status)).map(|_| ())
    }

    pub fn update_task_priority(&self, id: &str, priority: i64) -> Result<()> {
        let priority = Priority::from_number(priority);
        logged("update_task_priority", self.service.update_task_priority(id, priority)).map(|_| ())
    }

    pub fn toggle_task(&self, id: &str) -> Result<()> {
        logged("toggle_task", self.service.toggle_task(id)).map(|_| ())
    }

    pub fn delete_task(&self, id: &str) -> Result<()> {
        info!(id, "deleting task");
        logged("delete_task", self.service.delete_task(id))
    }

    /// Storage failures are logged and then returned; they are not masked
    /// as an empty result.
    pub fn get_filtered_and_sorted_tasks(
        &self,
        from: &str,
        to: &str,
        status: &str,
        order_by: &str,
        asc: bool,
    ) -> Result<Vec<Task>> {
        let query = parse_query(from, to, status, order_by, asc);
        logged(
            "get_filtered_and_sorted_tasks",
            self.service.get_filtered_and_sorted_tasks(&query),
        )
    }
}

/// Builds a listing query from raw parameters. Blank or unparseable bounds
/// are treated as unbounded; a blank status (or `all`) matches any status.
pub fn parse_query(from: &str, to: &str, status: &str, order_by: &str, asc: bool) -> TaskQuery {
    let status = match status.trim().to_lowercase().as_str() {
        "" | "all" => None,
        other => Some(Status::parse(other)),
    };
    TaskQuery {
        filter: Filter::All,
        from: parse_optional_bound("from", from),
        to: parse_optional_bound("to", to),
        status,
        sort: SortKey::parse(order_by),
        direction: Direction::from_ascending(asc),
    }
}

fn parse_optional_bound(name: &str, raw: &str) -> Option<DateTime<Utc>> {
    if raw.trim().is_empty() {
        return None;
    }
    match parse_bound(raw) {
        Ok(bound) => Some(bound),
        Err(err) => {
            warn!(bound = name, value = raw, error = %err, "ignoring unparseable date bound");
            None
        }
    }
}

fn due_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}

fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(TaskError::Encode)
}

fn logged<T>(method: &'static str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        error!(method, error = %err, "operation failed");
    }
    result
}
