use chrono::{DateTime, Local, Utc};
use tracing::{debug, info};

use crate::error::{Result, TaskError};
use crate::model::query::{Direction, Filter, SortKey, TaskQuery};
use crate::model::task::{Priority, Status, Task};
use crate::repository::TaskRepository;
use crate::service::view::{filter_tasks, query_tasks, sort_tasks};

/// CRUD orchestration over a whole-collection repository. Every mutation
/// loads the full list, changes it, and saves it back.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn get_all_tasks(&self) -> Result<Vec<Task>> {
        self.repo.get_all()
    }

    pub fn get_task(&self, id: &str) -> Result<Task> {
        require_id(id)?;
        self.repo
            .get_all()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    pub fn add_task(&self, text: &str, priority: Priority, due: Option<DateTime<Utc>>) -> Result<Task> {
        if text.trim().is_empty() {
            return Err(TaskError::EmptyText);
        }
        self.append(Task::new(text.to_string(), priority, due))
    }

    /// Stores a caller-built task, generating an id and creation time if absent.
    pub fn create_task(&self, mut task: Task) -> Result<Task> {
        if task.title.trim().is_empty() {
            return Err(TaskError::EmptyText);
        }
        task.ensure_identity();
        self.append(task)
    }

    fn append(&self, task: Task) -> Result<Task> {
        let mut tasks = self.repo.get_all()?;
        tasks.push(task.clone());
        self.repo.save_all(&tasks)?;
        info!(id = %task.id, priority = task.priority.as_str(), "task created");
        Ok(task)
    }

    /// Replaces the task with the same id. An unknown id changes nothing.
    pub fn update_task(&self, task: &Task) -> Result<()> {
        require_id(&task.id)?;
        let mut tasks = self.repo.get_all()?;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task.clone();
                info!(id = %task.id, "task updated");
            }
            None => debug!(id = %task.id, "update for unknown task ignored"),
        }
        self.repo.save_all(&tasks)
    }

    /// Removes the first task with `id`. An unknown id leaves storage unchanged.
    pub fn delete_task(&self, id: &str) -> Result<()> {
        require_id(id)?;
        let mut tasks = self.repo.get_all()?;
        match tasks.iter().position(|t| t.id == id) {
            Some(pos) => {
                tasks.remove(pos);
                info!(id, "task deleted");
            }
            None => debug!(id, "delete for unknown task ignored"),
        }
        self.repo.save_all(&tasks)
    }

    pub fn update_task_status(&self, id: &str, status: Status) -> Result<Task> {
        let task = self.modify(id, |task| task.set_status(status))?;
        info!(id, status = status.as_str(), "task status changed");
        Ok(task)
    }

    pub fn update_task_priority(&self, id: &str, priority: Priority) -> Result<Task> {
        let task = self.modify(id, |task| task.priority = priority)?;
        info!(id, priority = priority.as_str(), "task priority changed");
        Ok(task)
    }

    pub fn toggle_task(&self, id: &str) -> Result<Task> {
        let task = self.modify(id, Task::toggle_completed)?;
        info!(id, completed = task.completed, "task toggled");
        Ok(task)
    }

    fn modify(&self, id: &str, change: impl FnOnce(&mut Task)) -> Result<Task> {
        require_id(id)?;
        let mut tasks = self.repo.get_all()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        change(task);
        let updated = task.clone();
        self.repo.save_all(&tasks)?;
        Ok(updated)
    }

    pub fn list_tasks(&self, filter: Filter, sort: SortKey) -> Result<Vec<Task>> {
        self.list_tasks_at(filter, sort, &Local::now())
    }

    pub fn list_tasks_at<Tz: chrono::TimeZone>(&self, filter: Filter, sort: SortKey, now: &DateTime<Tz>) -> Result<Vec<Task>> {
        let tasks = self.repo.get_all()?;
        let filtered = filter_tasks(&tasks, filter, now);
        Ok(sort_tasks(&filtered, sort, Direction::Descending))
    }

    /// Storage failures are returned to the caller, never turned into an empty list.
    pub fn get_filtered_and_sorted_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>> {
        self.get_filtered_and_sorted_tasks_at(query, &Local::now())
    }

    pub fn get_filtered_and_sorted_tasks_at<Tz: chrono::TimeZone>(
        &self,
        query: &TaskQuery,
        now: &DateTime<Tz>,
    ) -> Result<Vec<Task>> {
        let tasks = self.repo.get_all()?;
        let result = query_tasks(&tasks, query, now);
        debug!(total = tasks.len(), matched = result.len(), filter = query.filter.as_str(), "listed tasks");
        Ok(result)
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        Err(TaskError::EmptyId)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::repository::FileTaskRepository;
    use chrono::{Duration, TimeZone};
    use std::cell::{Cell, RefCell};

    struct MockTaskRepo {
        tasks: RefCell<Vec<Task>>,
        saves: Cell<usize>,
    }

    impl MockTaskRepo {
        fn with(tasks: Vec<Task>) -> Self {
            Self {
                tasks: RefCell::new(tasks),
                saves: Cell::new(0),
            }
        }
    }

    impl TaskRepository for MockTaskRepo {
        fn get_all(&self) -> Result<Vec<Task>> {
            Ok(self.tasks.borrow().clone())
        }

        fn save_all(&self, tasks: &[Task]) -> Result<()> {
            *self.tasks.borrow_mut() = tasks.to_vec();
            self.saves.set(self.saves.get() + 1);
            Ok(())
        }
    }

    struct BrokenRepo;

    impl TaskRepository for BrokenRepo {
        fn get_all(&self) -> Result<Vec<Task>> {
            Err(StorageError::LockPoisoned.into())
        }

        fn save_all(&self, _tasks: &[Task]) -> Result<()> {
            Err(StorageError::LockPoisoned.into())
        }
    }

    fn seeded(titles: &[&str]) -> Vec<Task> {
        titles
            .iter()
            .map(|title| {
                let mut t = Task::new(title.to_string(), Priority::Low, None);
                t.id = title.to_string();
                t
            })
            .collect()
    }

    #[test]
    fn test_add_task_persists_and_returns() {
        let repo = MockTaskRepo::with(Vec::new());
        let service = TaskService::new(&repo);

        let task = service.add_task("  Buy milk ", Priority::High, None).unwrap();

        assert_eq!(task.title, "  Buy milk ");
        assert_eq!(task.priority, Priority::High);
        assert!(task.created_at.is_some());
        assert_eq!(repo.tasks.borrow().as_slice(), &[task]);
    }

    #[test]
    fn test_add_task_rejects_empty_text_without_saving() {
        let repo = MockTaskRepo::with(seeded(&["existing"]));
        let service = TaskService::new(&repo);

        assert!(matches!(service.add_task("", Priority::Low, None), Err(TaskError::EmptyText)));
        assert!(matches!(service.add_task("   ", Priority::Low, None), Err(TaskError::EmptyText)));

        assert_eq!(repo.saves.get(), 0);
        assert_eq!(repo.tasks.borrow().len(), 1);
    }

    #[test]
    fn test_create_task_fills_identity() {
        let repo = MockTaskRepo::with(Vec::new());
        let service = TaskService::new(&repo);
        let mut incoming = Task::new("From caller".to_string(), Priority::Medium, None);
        incoming.id = String::new();
        incoming.created_at = None;

        let created = service.create_task(incoming).unwrap();
        assert!(!created.id.is_empty());
        assert!(created.created_at.is_some());

        let mut blank = Task::new(String::new(), Priority::Low, None);
        blank.title = " ".to_string();
        assert!(matches!(service.create_task(blank), Err(TaskError::EmptyText)));
    }

    #[test]
    fn test_update_replaces_matching_task() {
        let repo = MockTaskRepo::with(seeded(&["a", "b"]));
        let service = TaskService::new(&repo);

        let mut changed = service.get_task("b").unwrap();
        changed.title = "b, renamed".to_string();
        changed.body = "notes".to_string();
        service.update_task(&changed).unwrap();

        assert_eq!(service.get_task("b").unwrap(), changed);
        assert_eq!(service.get_task("a").unwrap().title, "a");
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let original = seeded(&["a"]);
        let repo = MockTaskRepo::with(original.clone());
        let service = TaskService::new(&repo);

        let mut stranger = Task::new("stranger".to_string(), Priority::High, None);
        stranger.id = "zzz".to_string();
        service.update_task(&stranger).unwrap();

        assert_eq!(*repo.tasks.borrow(), original);
    }

    #[test]
    fn test_delete_removes_first_match_only() {
        let mut tasks = seeded(&["a", "b"]);
        let mut duplicate = tasks[0].clone();
        duplicate.title = "second a".to_string();
        tasks.push(duplicate);
        let repo = MockTaskRepo::with(tasks);
        let service = TaskService::new(&repo);

        service.delete_task("a").unwrap();

        let remaining: Vec<String> = repo.tasks.borrow().iter().map(|t| t.title.clone()).collect();
        assert_eq!(remaining, vec!["b", "second a"]);
    }

    #[test]
    fn test_delete_unknown_id_leaves_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileTaskRepository::new(dir.path().join("tasks.json"));
        let service = TaskService::new(&repo);
        service.add_task("keep me", Priority::Low, None).unwrap();
        let before = repo.get_all().unwrap();

        service.delete_task("no-such-id").unwrap();

        assert_eq!(repo.get_all().unwrap(), before);
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let repo = MockTaskRepo::with(seeded(&["a"]));
        let service = TaskService::new(&repo);
        assert!(matches!(service.delete_task(""), Err(TaskError::EmptyId)));
        assert!(matches!(service.toggle_task(" "), Err(TaskError::EmptyId)));
        assert_eq!(repo.saves.get(), 0);
    }

    #[test]
    fn test_field_level_mutations() {
        let repo = MockTaskRepo::with(seeded(&["a"]));
        let service = TaskService::new(&repo);

        let started = service.update_task_status("a", Status::InProgress).unwrap();
        assert_eq!(started.status, Status::InProgress);
        assert!(!started.completed);

        let bumped = service.update_task_priority("a", Priority::High).unwrap();
        assert_eq!(bumped.priority, Priority::High);
        assert_eq!(bumped.status, Status::InProgress);

        let toggled = service.toggle_task("a").unwrap();
        assert!(toggled.completed);
        assert_eq!(toggled.status, Status::Done);

        assert_eq!(service.get_task("a").unwrap(), toggled);
        assert_eq!(repo.saves.get(), 3);
    }

    #[test]
    fn test_field_level_mutations_report_not_found() {
        let repo = MockTaskRepo::with(seeded(&["a"]));
        let service = TaskService::new(&repo);
        assert!(matches!(service.toggle_task("b"), Err(TaskError::NotFound(id)) if id == "b"));
        assert!(matches!(service.update_task_status("b", Status::Done), Err(TaskError::NotFound(_))));
        assert!(matches!(service.update_task_priority("b", Priority::Low), Err(TaskError::NotFound(_))));
        assert_eq!(repo.saves.get(), 0);
    }

    #[test]
    fn test_list_tasks_filters_then_sorts() {
        let now = Utc.with_ymd_and_hms(2024, 4, 10, 12, 0, 0).unwrap();
        let mut tasks = seeded(&["late low", "late high", "future", "done"]);
        tasks[0].due = Some(now - Duration::days(1));
        tasks[1].due = Some(now - Duration::days(2));
        tasks[1].priority = Priority::High;
        tasks[2].due = Some(now + Duration::days(1));
        tasks[3].due = Some(now - Duration::days(1));
        tasks[3].toggle_completed();
        let repo = MockTaskRepo::with(tasks);
        let service = TaskService::new(&repo);

        let overdue = service.list_tasks_at(Filter::Overdue, SortKey::Priority, &now).unwrap();
        let titles: Vec<&str> = overdue.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["late high", "late low"]);
    }

    #[test]
    fn test_filtered_listing_propagates_storage_failure() {
        // Listing must not degrade to an empty success when storage is broken.
        let service = TaskService::new(BrokenRepo);
        let result = service.get_filtered_and_sorted_tasks(&TaskQuery::default());
        assert!(matches!(result, Err(TaskError::Storage(StorageError::LockPoisoned))));
    }

    #[test]
    fn test_filtered_listing_applies_query() {
        let mut tasks = seeded(&["one", "two"]);
        tasks[1].set_status(Status::InProgress);
        let repo = MockTaskRepo::with(tasks);
        let service = TaskService::new(&repo);

        let query = TaskQuery {
            status: Some(Status::InProgress),
            ..TaskQuery::default()
        };
        let found = service.get_filtered_and_sorted_tasks(&query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "two");
    }
}
