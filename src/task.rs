use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TaskId = i64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// The description, treating an empty string the same as a missing one.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low priority",
            Priority::Medium => "Medium priority",
            Priority::High => "High priority",
        }
    }

    pub fn cycle(self, step: isize) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(1) as isize;
        let len = Self::ALL.len() as isize;
        Self::ALL[(idx + step).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Status::Pending => Status::Completed,
            Status::Completed => Status::Pending,
        }
    }
}

/// Which statuses the list shows. Sent to the server as `?status=`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Pending,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Pending, Filter::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Pending => "pending",
            Filter::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} `{}`", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

macro_rules! from_str_via_as_str {
    ($ty:ty, $kind:literal, [$($variant:expr),+]) => {
        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| ParseEnumError { kind: $kind, value: s.to_string() })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

from_str_via_as_str!(Priority, "priority", [Priority::Low, Priority::Medium, Priority::High]);
from_str_via_as_str!(Status, "status", [Status::Pending, Status::Completed]);
from_str_via_as_str!(Filter, "filter", [Filter::All, Filter::Pending, Filter::Completed]);

/// Body of `POST /api/tasks`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

/// Body of `PUT /api/tasks/{id}`: a full replacement of the editable fields.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TaskReplace {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
}

/// What the server answers to a create. It may send a whole task or just
/// `{id, message}`; only the id is kept.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Created {
    pub id: TaskId,
}

pub mod timestamp {
    use super::*;
    use serde::de::Error;

    const SQLITE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    /// Accepts RFC 3339 as well as the zone-less text sqlite produces,
    /// which is read as UTC.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        SQLITE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp `{raw}`")))
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp `{raw}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decodes_minimal_task_without_description() {
        let json = r#"{"id":1,"title":"Buy milk","status":"pending","priority":"low","created_at":"2024-01-01T00:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, 1);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.created_at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(task.completed_at, None);
        assert_eq!(task.description(), None);
    }

    #[test]
    fn decodes_sqlite_timestamps_and_null_completion() {
        let json = r#"[
            {"id":2,"title":"a","description":"","status":"completed","priority":"high",
             "created_at":"2024-03-05 08:15:00","completed_at":"2024-03-06 09:00:00"},
            {"id":3,"title":"b","description":null,"status":"pending","priority":"medium",
             "created_at":"2024-03-05 08:15:00","completed_at":null}
        ]"#;
        let tasks: Vec<Task> = serde_json::from_str(json).unwrap();
        assert_eq!(tasks[0].completed_at, Some(Utc.with_ymd_and_hms(2024, 3, 6, 9, 0, 0).unwrap()));
        assert!(tasks[0].is_completed());
        assert_eq!(tasks[0].description(), None);
        assert_eq!(tasks[1].completed_at, None);
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let json = r#"{"id":1,"title":"x","status":"pending","priority":"low","created_at":"yesterday"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn parses_enums_from_cli_text() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("completed".parse::<Status>().unwrap(), Status::Completed);
        assert_eq!(" pending ".parse::<Filter>().unwrap(), Filter::Pending);
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.to_string(), "unknown priority `urgent`");
    }

    #[test]
    fn priority_cycles_in_both_directions() {
        assert_eq!(Priority::High.cycle(1), Priority::Low);
        assert_eq!(Priority::Low.cycle(-1), Priority::High);
        assert_eq!(Status::Pending.toggled(), Status::Completed);
    }

    #[test]
    fn create_response_may_be_a_bare_id() {
        let created: Created = serde_json::from_str(r#"{"id": 7, "message": "ok"}"#).unwrap();
        assert_eq!(created.id, 7);
    }
}
