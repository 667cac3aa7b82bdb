use std::sync::Arc;

use crate::error::Result;
use crate::model::task::Task;

/// Whole-collection storage contract used by the service.
pub trait TaskRepository {
    /// Returns every stored task, or an empty list when nothing has been saved yet.
    fn get_all(&self) -> Result<Vec<Task>>;
    /// Replaces the stored collection with `tasks`.
    fn save_all(&self, tasks: &[Task]) -> Result<()>;
}

impl<R: TaskRepository + ?Sized> TaskRepository for &R {
    fn get_all(&self) -> Result<Vec<Task>> {
        (**self).get_all()
    }

    fn save_all(&self, tasks: &[Task]) -> Result<()> {
        (**self).save_all(tasks)
    }
}

impl<R: TaskRepository + ?Sized> TaskRepository for Arc<R> {
    fn get_all(&self) -> Result<Vec<Task>> {
        (**self).get_all()
    }

    fn save_all(&self, tasks: &[Task]) -> Result<()> {
        (**self).save_all(tasks)
    }
}

impl<R: TaskRepository + ?Sized> TaskRepository for Box<R> {
    fn get_all(&self) -> Result<Vec<Task>> {
        (**self).get_all()
    }

    fn save_all(&self, tasks: &[Task]) -> Result<()> {
        (**self).save_all(tasks)
    }
}
