use serde::{Deserialize, Deserializer, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    /// Parses a priority name or number. Anything unrecognised is `Low`.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "2" | "m" | "med" | "medium" => Priority::Medium,
            "3" | "h" | "high" => Priority::High,
            _ => Priority::Low,
        }
    }

    pub fn from_number(value: i64) -> Self {
        match value {
            2 => Priority::Medium,
            3 => Priority::High,
            _ => Priority::Low,
        }
    }

    pub fn as_number(self) -> i64 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    /// Sort rank, lower comes first: high, medium, low.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

// JSON may hold either the name or the number.
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Number(i64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Name(name) => Priority::parse(&name),
            Repr::Number(n) => Priority::from_number(n),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

impl Status {
    /// Parses a status string. Anything unrecognised is `NotStarted`.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().replace('-', "_").as_str() {
            "in_progress" | "started" => Status::InProgress,
            "done" | "completed" => Status::Done,
            _ => Status::NotStarted,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::NotStarted => "not_started",
            Status::InProgress => "in_progress",
            Status::Done => "done",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(alias = "text")]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, alias = "done")]
    pub completed: bool,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, alias = "CreatedAt", alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "dueDate", alias = "deadline")]
    pub due: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(title: String, priority: Priority, due: Option<DateTime<Utc>>) -> Self {
        Self {
            id: generate_id(),
            title,
            body: String::new(),
            completed: false,
            status: Status::default(),
            priority,
            created_at: Some(Utc::now()),
            due,
        }
    }

    /// Fills in the id and creation time when the caller left them out.
    pub fn ensure_identity(&mut self) {
        if self.id.trim().is_empty() {
            self.id = generate_id();
        }
        if self.created_at.is_none() {
            self.created_at = Some(Utc::now());
        }
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.completed = status == Status::Done;
    }

    pub fn toggle_completed(&mut self) {
        if self.completed {
            self.set_status(Status::NotStarted);
        } else {
            self.set_status(Status::Done);
        }
    }
}

pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
