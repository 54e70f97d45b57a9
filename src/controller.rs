//! The client sync controller.
//!
//! Every mutation is forwarded to the server and followed by a full reload;
//! the controller never patches its view of the tasks locally.

use crate::api::TaskApi;
use crate::config::FailureVisibility;
use crate::error::SyncError;
use crate::stats::Stats;
use crate::surface::{CreateForm, EditForm, Surface};
use crate::task::{Filter, NewTask, Task, TaskId, TaskReplace};
use crate::view;
use chrono::Local;
use log::{debug, error, info, warn};

pub const TITLE_REQUIRED: &str = "Please enter a task title.";
pub const TASK_ADDED: &str = "Task added.";
pub const DELETE_QUESTION: &str = "Delete this task?";

/// The edit surface. At most one task can be open at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditSurface {
    #[default]
    Closed,
    Open(TaskId),
}

impl EditSurface {
    pub fn is_open(self) -> bool {
        matches!(self, EditSurface::Open(_))
    }

    pub fn task_id(self) -> Option<TaskId> {
        match self {
            EditSurface::Open(id) => Some(id),
            EditSurface::Closed => None,
        }
    }
}

/// A row-level user intent. Rows only carry their task id; the action name
/// comes from whatever was triggered (`data-action` in markup, a key on the
/// board) and is resolved when the event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Toggle(TaskId),
    Edit(TaskId),
    Delete(TaskId),
}

impl Action {
    pub fn named(name: &str, id: TaskId) -> Option<Self> {
        match name {
            "toggle" => Some(Action::Toggle(id)),
            "edit" => Some(Action::Edit(id)),
            "delete" => Some(Action::Delete(id)),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Toggle(_) => "toggle",
            Action::Edit(_) => "edit",
            Action::Delete(_) => "delete",
        }
    }

    pub fn task_id(self) -> TaskId {
        match self {
            Action::Toggle(id) | Action::Edit(id) | Action::Delete(id) => id,
        }
    }
}

pub struct Controller<A, S> {
    api: A,
    surface: S,
    filter: Filter,
    editing: EditSurface,
    toggle_failures: FailureVisibility,
}

impl<A: TaskApi, S: Surface> Controller<A, S> {
    pub fn new(api: A, surface: S) -> Self {
        Self {
            api,
            surface,
            filter: Filter::All,
            editing: EditSurface::Closed,
            toggle_failures: FailureVisibility::default(),
        }
    }

    pub fn with_toggle_failures(mut self, visibility: FailureVisibility) -> Self {
        self.toggle_failures = visibility;
        self
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn editing(&self) -> EditSurface {
        self.editing
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub async fn set_filter(&mut self, filter: Filter) -> bool {
        self.filter = filter;
        self.reload().await
    }

    /// Fetches the list for the active filter and redraws list and stats.
    /// Returns false when the list could not be loaded.
    pub async fn reload(&mut self) -> bool {
        debug!("loading tasks with filter {}", self.filter);
        match self.api.list(self.filter).await {
            Ok(tasks) => {
                debug!("loaded {} tasks", tasks.len());
                let list = view::render(&tasks, Local::now());
                self.surface.show_tasks(&list);
                self.update_stats(&tasks).await;
                true
            }
            Err(err) => {
                error!("failed to load tasks: {err}");
                self.surface.show_load_error(&err.to_string());
                false
            }
        }
    }

    /// A filtered list would undercount, so anything but `all` is re-fetched.
    async fn update_stats(&mut self, current: &[Task]) {
        let stats = if self.filter == Filter::All {
            Stats::from_tasks(current)
        } else {
            match self.api.list(Filter::All).await {
                Ok(all) => Stats::from_tasks(&all),
                Err(err) => {
                    error!("failed to update stats: {err}");
                    return;
                }
            }
        };
        self.surface.show_stats(stats);
    }

    pub async fn create(&mut self, form: &CreateForm) -> bool {
        let title = form.title.trim();
        if title.is_empty() {
            self.reject(SyncError::Validation(TITLE_REQUIRED.to_string()));
            return false;
        }
        let task = NewTask {
            title: title.to_string(),
            description: form.description.trim().to_string(),
            priority: form.priority,
        };
        debug!("creating task {:?}", task.title);
        match self.api.create(&task).await {
            Ok(created) => {
                info!("created task {}", created.id);
                self.surface.reset_create_form();
                self.reload().await;
                self.surface.notify(TASK_ADDED);
                true
            }
            Err(err) => {
                error!("failed to create task: {err}");
                self.surface.alert(&format!("Could not add task: {err}"));
                false
            }
        }
    }

    pub async fn toggle(&mut self, id: TaskId) -> bool {
        match self.api.toggle(id).await {
            Ok(()) => {
                info!("toggled task {id}");
                self.reload().await;
                true
            }
            Err(err) => {
                error!("failed to toggle task {id}: {err}");
                if self.toggle_failures == FailureVisibility::Alert {
                    self.surface.alert(&format!("Could not update task: {err}"));
                }
                false
            }
        }
    }

    /// Opens the edit surface for `id`, pre-filled from the server's
    /// unfiltered list. Stays closed if the task cannot be found.
    pub async fn open_edit(&mut self, id: TaskId) -> bool {
        let tasks = match self.api.list(Filter::All).await {
            Ok(tasks) => tasks,
            Err(err) => {
                error!("failed to load task {id} for editing: {err}");
                return false;
            }
        };
        match tasks.iter().find(|t| t.id == id) {
            Some(task) => {
                self.editing = EditSurface::Open(id);
                self.surface.open_edit(&EditForm::from(task));
                true
            }
            None => {
                warn!("task {id} is gone, not opening editor");
                false
            }
        }
    }

    /// Sends a full replacement for the open task. On failure the edit
    /// surface stays open.
    pub async fn submit_edit(&mut self, form: &EditForm) -> bool {
        let EditSurface::Open(id) = self.editing else {
            return false;
        };
        let title = form.title.trim();
        if title.is_empty() {
            self.reject(SyncError::Validation(TITLE_REQUIRED.to_string()));
            return false;
        }
        let replacement = TaskReplace {
            title: title.to_string(),
            description: form.description.trim().to_string(),
            priority: form.priority,
            status: form.status,
        };
        match self.api.replace(id, &replacement).await {
            Ok(()) => {
                info!("updated task {id}");
                self.close_edit();
                self.reload().await;
                true
            }
            Err(err) => {
                error!("failed to update task {id}: {err}");
                self.surface.alert(&format!("Could not save task: {err}"));
                false
            }
        }
    }

    fn reject(&mut self, err: SyncError) {
        warn!("rejected before sending: {err}");
        self.surface.alert(&err.to_string());
    }

    pub fn close_edit(&mut self) {
        self.editing = EditSurface::Closed;
        self.surface.close_edit();
    }

    /// A click landed somewhere while the edit surface may be open.
    pub fn click(&mut self, inside_edit_surface: bool) {
        if self.editing.is_open() && !inside_edit_surface {
            self.close_edit();
        }
    }

    pub async fn delete(&mut self, id: TaskId) -> bool {
        if !self.surface.confirm(DELETE_QUESTION) {
            debug!("delete of task {id} cancelled");
            return false;
        }
        match self.api.delete(id).await {
            Ok(()) => {
                info!("deleted task {id}");
                self.reload().await;
                true
            }
            Err(err) => {
                error!("failed to delete task {id}: {err}");
                self.surface.alert(&format!("Could not delete task: {err}"));
                false
            }
        }
    }

    pub async fn dispatch(&mut self, action: Action) -> bool {
        match action {
            Action::Toggle(id) => self.toggle(id).await,
            Action::Edit(id) => self.open_edit(id).await,
            Action::Delete(id) => self.delete(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_resolve_by_name() {
        assert_eq!(Action::named("toggle", 4), Some(Action::Toggle(4)));
        assert_eq!(Action::named("edit", 12), Some(Action::Edit(12)));
        assert_eq!(Action::named("archive", 1), None);
        for action in [Action::Toggle(1), Action::Edit(2), Action::Delete(3)] {
            assert_eq!(Action::named(action.name(), action.task_id()), Some(action));
        }
    }

    #[test]
    fn edit_surface_reports_open_task() {
        assert!(!EditSurface::Closed.is_open());
        assert_eq!(EditSurface::Open(3).task_id(), Some(3));
        assert_eq!(EditSurface::default(), EditSurface::Closed);
    }
}
