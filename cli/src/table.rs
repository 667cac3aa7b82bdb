use chrono::{DateTime, Local, Utc};
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};
use todo_core::{Status, Task};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "")]
    done: &'static str,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Pri")]
    priority: &'static str,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Title")]
    title: String,
}

pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn local(ts: Option<DateTime<Utc>>, fmt: &str) -> String {
    ts.map(|t| DateTime::<Local>::from(t).format(fmt).to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn render(tasks: &[Task]) -> String {
    let rows: Vec<TaskRow> = tasks
        .iter()
        .map(|task| TaskRow {
            id: short_id(&task.id).to_string(),
            done: if task.completed { "x" } else { " " },
            status: match task.status {
                Status::NotStarted => "todo",
                Status::InProgress => "doing",
                Status::Done => "done",
            },
            priority: task.priority.as_str(),
            due: local(task.due, "%Y-%m-%d %H:%M"),
            created: local(task.created_at, "%Y-%m-%d"),
            title: task.title.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    table.to_string()
}

pub fn render_detail(task: &Task) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", task.title, task.id));
    out.push_str(&format!("  Status:   {}\n", task.status.as_str()));
    out.push_str(&format!("  Priority: {}\n", task.priority.as_str()));
    out.push_str(&format!("  Due:      {}\n", local(task.due, "%Y-%m-%d %H:%M")));
    out.push_str(&format!("  Created:  {}\n", local(task.created_at, "%Y-%m-%d %H:%M")));
    if !task.body.is_empty() {
        out.push_str(&format!("\n{}\n", task.body));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_core::Priority;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_render_contains_rows() {
        let task = Task::new("Write tests".to_string(), Priority::High, None);
        let out = render(&[task.clone()]);
        assert!(out.contains("Write tests"));
        assert!(out.contains(short_id(&task.id)));
        assert!(out.contains("high"));
    }
}
