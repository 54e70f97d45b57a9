use crate::stats::Stats;
use crate::task::{Priority, Status, Task};
use crate::view::ListView;

/// Contents of the "new task" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateForm {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

/// Contents of the edit surface, pre-filled from a server task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditForm {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
}

impl From<&Task> for EditForm {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: task.priority,
            status: task.status,
        }
    }
}

/// Whatever the user is looking at. The controller writes to it and asks it
/// the occasional question; it never reads task state back out of it.
pub trait Surface {
    fn show_tasks(&mut self, view: &ListView);

    /// Replaces the list with an explanatory panel.
    fn show_load_error(&mut self, reason: &str);

    fn show_stats(&mut self, stats: Stats);

    fn reset_create_form(&mut self);

    fn open_edit(&mut self, form: &EditForm);

    fn close_edit(&mut self);

    /// Non-blocking confirmation that something went through.
    fn notify(&mut self, message: &str);

    /// Blocking acknowledgment dialog.
    fn alert(&mut self, message: &str);

    fn confirm(&mut self, question: &str) -> bool;
}
