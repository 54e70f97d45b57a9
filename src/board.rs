use crate::stats::Stats;
use crate::surface::{CreateForm, EditForm};
use crate::task::{Filter, Priority, Status, TaskId};
use crate::view::{ListView, RowView};
use crossterm::event::KeyCode;
use ratatui::layout::Rect;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListPanel {
    #[default]
    Loading,
    Tasks(ListView),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Alert(String),
    Confirm(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Priority,
    Status,
}

/// A form being typed into. Create forms have no status field.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Option<Status>,
    pub focus: Field,
}

impl FormState {
    pub fn create() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: Priority::default(),
            status: None,
            focus: Field::Title,
        }
    }

    pub fn edit(form: &EditForm) -> Self {
        Self {
            title: form.title.clone(),
            description: form.description.clone(),
            priority: form.priority,
            status: Some(form.status),
            focus: Field::Title,
        }
    }

    pub fn fields(&self) -> &'static [Field] {
        if self.status.is_some() {
            &[Field::Title, Field::Description, Field::Priority, Field::Status]
        } else {
            &[Field::Title, Field::Description, Field::Priority]
        }
    }

    fn move_focus(&mut self, step: isize) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0) as isize;
        self.focus = fields[(idx + step).rem_euclid(fields.len() as isize) as usize];
    }

    fn cycle(&mut self, step: isize) {
        match self.focus {
            Field::Priority => self.priority = self.priority.cycle(step),
            Field::Status => self.status = self.status.map(Status::toggled),
            Field::Title | Field::Description => {}
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Title => Some(&mut self.title),
            Field::Description => Some(&mut self.description),
            Field::Priority | Field::Status => None,
        }
    }

    /// Applies an editing key. Enter and Esc are left to the caller.
    pub fn apply_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Tab | KeyCode::Down => self.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(-1),
            KeyCode::Left => self.cycle(-1),
            KeyCode::Right => self.cycle(1),
            KeyCode::Backspace => {
                if let Some(text) = self.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => match self.text_mut() {
                Some(text) => text.push(c),
                None if c == ' ' => self.cycle(1),
                None => {}
            },
            _ => {}
        }
    }

    pub fn to_create_form(&self) -> CreateForm {
        CreateForm {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
        }
    }

    pub fn to_edit_form(&self) -> EditForm {
        EditForm {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            status: self.status.unwrap_or_default(),
        }
    }
}

/// Everything the terminal board shows.
#[derive(Debug, Default)]
pub struct Board {
    pub list: ListPanel,
    pub stats: Stats,
    pub filter: Filter,
    pub selected: usize,
    pub create: Option<FormState>,
    pub edit: Option<FormState>,
    pub dialog: Option<Dialog>,
    pub status_line: Option<String>,
    /// A controller request is in flight.
    pub busy: bool,
    /// Where the edit form was last drawn, for click-outside detection.
    pub edit_area: Option<Rect>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[RowView] {
        match &self.list {
            ListPanel::Tasks(view) => view.rows(),
            ListPanel::Loading | ListPanel::Failed(_) => &[],
        }
    }

    pub fn set_tasks(&mut self, view: ListView) {
        self.list = ListPanel::Tasks(view);
        self.selected = self.selected.min(self.rows().len().saturating_sub(1));
    }

    pub fn move_selection(&mut self, direction: isize) {
        let max = self.rows().len().saturating_sub(1) as isize;
        self.selected = (self.selected as isize + direction).clamp(0, max) as usize;
    }

    pub fn selected_task(&self) -> Option<TaskId> {
        match &self.list {
            ListPanel::Tasks(view) => view.task_id_at(self.selected),
            ListPanel::Loading | ListPanel::Failed(_) => None,
        }
    }

    pub fn open_create(&mut self) {
        if self.create.is_none() {
            self.create = Some(FormState::create());
        }
    }

    pub fn is_inside_edit(&self, column: u16, row: u16) -> bool {
        self.edit_area.is_some_and(|area| {
            column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: i64) -> ListView {
        ListView::Rows(
            (1..=n)
                .map(|id| RowView {
                    id,
                    completed: false,
                    title: format!("task {id}"),
                    description: None,
                    priority: Priority::Low,
                    created: "Today 09:00".into(),
                    completed_on: None,
                })
                .collect(),
        )
    }

    #[test]
    fn selection_is_clamped_to_rows() {
        let mut board = Board::new();
        board.set_tasks(rows(3));
        board.move_selection(5);
        assert_eq!(board.selected, 2);
        assert_eq!(board.selected_task(), Some(3));
        board.set_tasks(rows(1));
        assert_eq!(board.selected, 0);
        board.move_selection(-1);
        assert_eq!(board.selected_task(), Some(1));
    }

    #[test]
    fn nothing_selected_without_tasks() {
        let mut board = Board::new();
        assert_eq!(board.selected_task(), None);
        board.set_tasks(ListView::Empty);
        assert_eq!(board.selected_task(), None);
        board.list = ListPanel::Failed("HTTP 500".into());
        assert_eq!(board.selected_task(), None);
    }

    #[test]
    fn create_form_typing_and_cycling() {
        let mut form = FormState::create();
        for c in "Buy milk".chars() {
            form.apply_key(KeyCode::Char(c));
        }
        form.apply_key(KeyCode::Backspace);
        form.apply_key(KeyCode::Tab);
        form.apply_key(KeyCode::Char('2'));
        form.apply_key(KeyCode::Tab);
        form.apply_key(KeyCode::Right);
        form.apply_key(KeyCode::Tab);
        assert_eq!(form.focus, Field::Title);

        let created = form.to_create_form();
        assert_eq!(created.title, "Buy mil");
        assert_eq!(created.description, "2");
        assert_eq!(created.priority, Priority::High);
    }

    #[test]
    fn edit_form_has_status_field() {
        let mut form = FormState::edit(&EditForm {
            title: "t".into(),
            description: String::new(),
            priority: Priority::Low,
            status: Status::Pending,
        });
        form.apply_key(KeyCode::BackTab);
        assert_eq!(form.focus, Field::Status);
        form.apply_key(KeyCode::Char(' '));
        assert_eq!(form.to_edit_form().status, Status::Completed);
    }

    #[test]
    fn click_hit_testing() {
        let mut board = Board::new();
        assert!(!board.is_inside_edit(1, 1));
        board.edit_area = Some(Rect::new(10, 5, 20, 8));
        assert!(board.is_inside_edit(10, 5));
        assert!(board.is_inside_edit(29, 12));
        assert!(!board.is_inside_edit(30, 12));
        assert!(!board.is_inside_edit(9, 6));
    }
}
