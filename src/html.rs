//! Markup rendering for browser surfaces.
//!
//! User text only ever reaches the output through askama's HTML escaper.
//! Rows carry `data-task-id` / `data-action` attributes for delegated
//! event binding; see [`crate::controller::Action::named`].

use crate::stats::Stats;
use crate::surface::{EditForm, Surface};
use crate::view::{self, ListView, RowView};
use askama::Template;
use log::{error, info, warn};
use std::io::Write;

#[derive(Template)]
#[template(path = "task_list.html")]
struct TaskListTemplate<'a> {
    rows: &'a [RowView],
    empty_heading: &'a str,
    empty_hint: &'a str,
}

#[derive(Template)]
#[template(path = "load_error.html")]
struct LoadErrorTemplate<'a> {
    heading: &'a str,
    reason: &'a str,
    hint: &'a str,
}

#[derive(Template)]
#[template(path = "stats.html")]
struct StatsTemplate {
    stats: Stats,
}

pub fn render_list(view: &ListView) -> askama::Result<String> {
    TaskListTemplate {
        rows: view.rows(),
        empty_heading: view::EMPTY_HEADING,
        empty_hint: view::EMPTY_HINT,
    }
    .render()
}

pub fn render_load_error(reason: &str) -> askama::Result<String> {
    LoadErrorTemplate {
        heading: view::LOAD_ERROR_HEADING,
        reason,
        hint: view::LOAD_ERROR_HINT,
    }
    .render()
}

pub fn render_stats(stats: Stats) -> askama::Result<String> {
    StatsTemplate { stats }.render()
}

/// Writes a markup fragment for everything the controller shows. There is
/// nobody to answer questions, so confirmations are declined.
pub struct HtmlSurface<W> {
    out: W,
}

impl<W: Write> HtmlSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    fn emit(&mut self, markup: askama::Result<String>) {
        let result = match markup {
            Ok(markup) => writeln!(self.out, "{markup}"),
            Err(err) => {
                error!("failed to render markup: {err}");
                return;
            }
        };
        if let Err(err) = result {
            error!("failed to write markup: {err}");
        }
    }
}

impl<W: Write> Surface for HtmlSurface<W> {
    fn show_tasks(&mut self, view: &ListView) {
        self.emit(render_list(view));
    }

    fn show_load_error(&mut self, reason: &str) {
        self.emit(render_load_error(reason));
    }

    fn show_stats(&mut self, stats: Stats) {
        self.emit(render_stats(stats));
    }

    fn reset_create_form(&mut self) {}

    fn open_edit(&mut self, _form: &EditForm) {}

    fn close_edit(&mut self) {}

    fn notify(&mut self, message: &str) {
        info!("{message}");
    }

    fn alert(&mut self, message: &str) {
        warn!("{message}");
    }

    fn confirm(&mut self, question: &str) -> bool {
        warn!("declining {question:?}, markup output cannot ask");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Action;
    use crate::task::Priority;

    fn row(id: i64, title: &str) -> RowView {
        RowView {
            id,
            completed: false,
            title: title.to_string(),
            description: None,
            priority: Priority::High,
            created: "Today 10:00".into(),
            completed_on: None,
        }
    }

    #[test]
    fn empty_view_has_message_and_no_rows() {
        let html = render_list(&ListView::Empty).unwrap();
        assert!(html.contains(view::EMPTY_HEADING));
        assert!(!html.contains("task-item"));
    }

    #[test]
    fn titles_are_escaped() {
        let html = render_list(&ListView::Rows(vec![row(1, "<b>x</b>")])).unwrap();
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn descriptions_are_escaped() {
        let mut r = row(1, "t");
        r.description = Some("<script>alert(1)</script>".into());
        let html = render_list(&ListView::Rows(vec![r])).unwrap();
        assert!(html.contains("task-description"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn one_row_per_task_with_data_attributes() {
        let mut done = row(2, "two");
        done.completed = true;
        done.completed_on = Some("Yesterday".into());
        let html = render_list(&ListView::Rows(vec![row(1, "one"), done])).unwrap();
        assert_eq!(html.matches("class=\"task-item").count(), 2);
        assert!(html.contains("data-task-id=\"1\""));
        assert!(html.contains("data-task-id=\"2\""));
        assert_eq!(html.matches("data-action=\"delete\"").count(), 2);
        assert_eq!(html.matches(" checked").count(), 1);
        assert!(html.contains("High priority"));
        assert!(html.contains("Yesterday"));
        assert!(!html.contains("onclick"));
    }

    #[test]
    fn row_actions_use_resolvable_names() {
        let html = render_list(&ListView::Rows(vec![row(5, "five")])).unwrap();
        for action in [Action::Toggle(5), Action::Edit(5), Action::Delete(5)] {
            assert!(html.contains(&format!("data-action=\"{}\"", action.name())));
        }
    }

    #[test]
    fn surface_writes_fragments_and_declines_questions() {
        let mut surface = HtmlSurface::new(Vec::new());
        surface.show_load_error("HTTP 503: <down>");
        surface.show_stats(Stats { total: 3, pending: 2, completed: 1 });
        assert!(!surface.confirm("Delete this task?"));
        let html = String::from_utf8(surface.output().clone()).unwrap();
        assert!(html.contains("&lt;down&gt;"));
        assert!(html.contains("id=\"total-tasks\">3<"));
        assert!(html.contains("id=\"completed-tasks\">1<"));
    }

    #[test]
    fn load_error_panel_escapes_reason() {
        let html = render_load_error("HTTP 500: <oops>").unwrap();
        assert!(html.contains(view::LOAD_ERROR_HEADING));
        assert!(html.contains("&lt;oops&gt;"));
    }
}
