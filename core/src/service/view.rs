//! Pure filtering and ordering over an in-memory task list.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::model::query::{Direction, Filter, SortKey, TaskQuery};
use crate::model::task::Task;
use crate::time::start_of_day;

/// Tasks matching `filter`, evaluated against `now`. Calendar days are taken
/// in `now`'s time zone.
pub fn filter_tasks<Tz: TimeZone>(tasks: &[Task], filter: Filter, now: &DateTime<Tz>) -> Vec<Task> {
    let window = Window::new(now);
    tasks
        .iter()
        .filter(|task| window.matches(task, filter))
        .cloned()
        .collect()
}

/// Applies the query's filter plus its optional due-date bounds and status.
pub fn query_tasks<Tz: TimeZone>(tasks: &[Task], query: &TaskQuery, now: &DateTime<Tz>) -> Vec<Task> {
    let window = Window::new(now);
    let selected: Vec<Task> = tasks
        .iter()
        .filter(|task| window.matches(task, query.filter))
        .filter(|task| within_bounds(task, query.from, query.to))
        .filter(|task| query.status.map_or(true, |status| task.status == status))
        .cloned()
        .collect();
    sort_tasks(&selected, query.sort, query.direction)
}

/// A sorted copy of `tasks`; the input is left untouched. The sort is stable.
pub fn sort_tasks(tasks: &[Task], key: SortKey, direction: Direction) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match direction {
            Direction::Descending => ordering,
            Direction::Ascending => ordering.reverse(),
        }
    });
    sorted
}

fn compare(a: &Task, b: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::Date => newest_first(a, b),
        SortKey::Priority => a
            .priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| newest_first(a, b)),
    }
}

// Tasks without a creation time go last.
fn newest_first(a: &Task, b: &Task) -> Ordering {
    match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn within_bounds(task: &Task, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(due) = task.due else {
        return false;
    };
    from.map_or(true, |from| due >= from) && to.map_or(true, |to| due < to)
}

struct Window {
    now: DateTime<Utc>,
    today_start: DateTime<Utc>,
    tomorrow_start: DateTime<Utc>,
    week_end: DateTime<Utc>,
}

impl Window {
    fn new<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let today = start_of_day(now);
        let tomorrow = start_of_day(&(today.clone() + Duration::hours(36)));
        let now = now.with_timezone(&Utc);
        Self {
            now,
            today_start: today.with_timezone(&Utc),
            tomorrow_start: tomorrow.with_timezone(&Utc),
            week_end: now + Duration::days(7),
        }
    }

    fn matches(&self, task: &Task, filter: Filter) -> bool {
        match filter {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
            Filter::Today => self.open_and_due(task, |due| due >= self.today_start && due < self.tomorrow_start),
            Filter::Week => self.open_and_due(task, |due| due > self.now && due < self.week_end),
            Filter::Overdue => self.open_and_due(task, |due| due < self.now),
        }
    }

    fn open_and_due(&self, task: &Task, predicate: impl Fn(DateTime<Utc>) -> bool) -> bool {
        !task.completed && task.due.is_some_and(predicate)
    }
}
