//! Pure projection of a task list into something a surface can draw.
//!
//! Nothing here knows about terminals or markup; [`render`] only decides
//! which rows exist and what text each of them carries.

use crate::task::{Priority, Task, TaskId};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

pub const EMPTY_HEADING: &str = "No tasks yet";
pub const EMPTY_HINT: &str = "Add your first task to get started!";
pub const LOAD_ERROR_HEADING: &str = "Failed to load tasks";
pub const LOAD_ERROR_HINT: &str = "Check that the task server is running.";

#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    Empty,
    Rows(Vec<RowView>),
}

impl ListView {
    pub fn rows(&self) -> &[RowView] {
        match self {
            ListView::Empty => &[],
            ListView::Rows(rows) => rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// Resolves the task behind a row position, at the moment it is needed.
    pub fn task_id_at(&self, index: usize) -> Option<TaskId> {
        self.rows().get(index).map(|row| row.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub id: TaskId,
    pub completed: bool,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub created: String,
    pub completed_on: Option<String>,
}

impl RowView {
    pub fn priority_label(&self) -> &'static str {
        self.priority.label()
    }

    pub fn status_class(&self) -> &'static str {
        if self.completed {
            "completed"
        } else {
            "pending"
        }
    }

    pub fn has_description(&self) -> bool {
        self.description.is_some()
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn completed_text(&self) -> &str {
        self.completed_on.as_deref().unwrap_or_default()
    }
}

pub fn render<Tz>(tasks: &[Task], now: DateTime<Tz>) -> ListView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if tasks.is_empty() {
        return ListView::Empty;
    }
    ListView::Rows(tasks.iter().map(|task| render_row(task, &now)).collect())
}

fn render_row<Tz>(task: &Task, now: &DateTime<Tz>) -> RowView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    RowView {
        id: task.id,
        completed: task.is_completed(),
        title: task.title.clone(),
        description: task.description().map(str::to_string),
        priority: task.priority,
        created: format_date(task.created_at, now),
        completed_on: task.completed_at.map(|at| format_date(at, now)),
    }
}

/// Short, relative label for a timestamp: `Today 14:05`, `Yesterday`,
/// `3 days ago`, or `Jan 5` for anything a week or more away.
pub fn format_date<Tz>(at: DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let local = at.with_timezone(&now.timezone());
    let days = (now.clone().with_timezone(&Utc) - at).num_days().abs();
    match days {
        0 => format!("Today {}", local.format("%H:%M")),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        _ => local.format("%b %-d").to_string(),
    }
}
