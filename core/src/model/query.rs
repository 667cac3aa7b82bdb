use chrono::{DateTime, Utc};

use crate::model::task::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
    Today,
    Week,
    Overdue,
}

impl Filter {
    /// Unknown names select every task.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "active" => Filter::Active,
            "completed" => Filter::Completed,
            "today" => Filter::Today,
            "week" => Filter::Week,
            "overdue" => Filter::Overdue,
            _ => Filter::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
            Filter::Today => "today",
            Filter::Week => "week",
            Filter::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Date,
    Priority,
}

impl SortKey {
    /// Unknown names sort by creation date.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "priority" => SortKey::Priority,
            _ => SortKey::Date,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Priority => "priority",
        }
    }
}

/// `Descending` is the natural order of each key: newest first, high priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Ascending,
    #[default]
    Descending,
}

impl Direction {
    pub fn from_ascending(asc: bool) -> Self {
        if asc {
            Direction::Ascending
        } else {
            Direction::Descending
        }
    }
}

/// Everything the listing operation can narrow or order by.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQuery {
    pub filter: Filter,
    /// Inclusive lower bound on the due date.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the due date.
    pub to: Option<DateTime<Utc>>,
    pub status: Option<Status>,
    pub sort: SortKey,
    pub direction: Direction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parse() {
        assert_eq!(Filter::parse("overdue"), Filter::Overdue);
        assert_eq!(Filter::parse(" Today "), Filter::Today);
        assert_eq!(Filter::parse("week"), Filter::Week);
        assert_eq!(Filter::parse("someday"), Filter::All);
        assert_eq!(Filter::parse(""), Filter::All);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(SortKey::parse("priority"), SortKey::Priority);
        assert_eq!(SortKey::parse("PRIORITY"), SortKey::Priority);
        assert_eq!(SortKey::parse("date"), SortKey::Date);
        assert_eq!(SortKey::parse("created_at"), SortKey::Date);
        assert_eq!(SortKey::parse("title"), SortKey::Date);
    }

    #[test]
    fn test_names_round_trip_through_parse() {
        for filter in [
            Filter::All,
            Filter::Active,
            Filter::Completed,
            Filter::Today,
            Filter::Week,
            Filter::Overdue,
        ] {
            assert_eq!(Filter::parse(filter.as_str()), filter);
        }
        assert_eq!(SortKey::parse(SortKey::Priority.as_str()), SortKey::Priority);
    }
}
