use crate::api::TaskApi;
use crate::stats::Stats;
use crate::surface::{EditForm, Surface};
use crate::task::Filter;
use crate::view::{self, ListView};
use log::error;
use std::io::{self, BufRead, Write};

/// Line-oriented surface for one-shot commands.
pub struct ConsoleSurface<R, W> {
    input: R,
    out: W,
    show_list: bool,
    assume_yes: bool,
    /// Filled in when the controller opens the edit surface.
    pub edit: Option<EditForm>,
}

impl<R: BufRead, W: Write> ConsoleSurface<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self {
            input,
            out,
            show_list: true,
            assume_yes: false,
            edit: None,
        }
    }

    pub fn hide_list(mut self) -> Self {
        self.show_list = false;
        self
    }

    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    fn say(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}") {
            error!("failed to write to console: {err}");
        }
    }
}

impl<R: BufRead, W: Write> Surface for ConsoleSurface<R, W> {
    fn show_tasks(&mut self, list: &ListView) {
        if !self.show_list {
            return;
        }
        match list {
            ListView::Empty => {
                self.say(view::EMPTY_HEADING);
                self.say(view::EMPTY_HINT);
            }
            ListView::Rows(rows) => {
                for row in rows {
                    let mark = if row.completed { "x" } else { " " };
                    let mut line = format!("[{mark}] #{} {} ({}, {}", row.id, row.title, row.priority_label(), row.created);
                    if let Some(done) = &row.completed_on {
                        line.push_str(&format!(", done {done}"));
                    }
                    line.push(')');
                    self.say(&line);
                    if let Some(description) = &row.description {
                        self.say(&format!("      {description}"));
                    }
                }
            }
        }
    }

    fn show_load_error(&mut self, reason: &str) {
        self.say(&format!("{}: {reason}", view::LOAD_ERROR_HEADING));
        self.say(view::LOAD_ERROR_HINT);
    }

    fn show_stats(&mut self, stats: Stats) {
        self.say(&format!(
            "total: {}  pending: {}  completed: {}",
            stats.total, stats.pending, stats.completed
        ));
    }

    fn reset_create_form(&mut self) {}

    fn open_edit(&mut self, form: &EditForm) {
        self.edit = Some(form.clone());
    }

    fn close_edit(&mut self) {
        self.edit = None;
    }

    fn notify(&mut self, message: &str) {
        self.say(message);
    }

    fn alert(&mut self, message: &str) {
        self.say(message);
    }

    fn confirm(&mut self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if let Err(err) = write!(self.out, "{question} [y/N] ").and_then(|_| self.out.flush()) {
            error!("failed to write to console: {err}");
        }
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
            Err(err) => {
                error!("failed to read answer: {err}");
                false
            }
        }
    }
}

/// Checks that the server answers and that its filtered lists agree with the
/// full one. Returns whether everything looked healthy.
pub async fn check<A: TaskApi, W: Write>(api: &A, server_url: &str, out: &mut W) -> io::Result<bool> {
    writeln!(out, "Checking task server at {server_url}")?;
    let all = match api.list(Filter::All).await {
        Ok(all) => all,
        Err(err) => {
            writeln!(out, "FAIL  list tasks: {err}")?;
            writeln!(out, "      {}", view::LOAD_ERROR_HINT)?;
            return Ok(false);
        }
    };
    writeln!(out, "ok    list tasks: {} tasks", all.len())?;

    let stats = Stats::from_tasks(&all);
    let mut healthy = true;
    for (filter, expected) in [(Filter::Pending, stats.pending), (Filter::Completed, stats.completed)] {
        match api.list(filter).await {
            Ok(tasks) if tasks.len() == expected => {
                writeln!(out, "ok    {filter} filter: {} tasks", tasks.len())?;
            }
            Ok(tasks) => {
                healthy = false;
                writeln!(out, "FAIL  {filter} filter: {} tasks, expected {expected}", tasks.len())?;
            }
            Err(err) => {
                healthy = false;
                writeln!(out, "FAIL  {filter} filter: {err}")?;
            }
        }
    }
    Ok(healthy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SyncError};
    use crate::task::{Created, NewTask, Priority, Status, Task, TaskId, TaskReplace};
    use crate::view::RowView;
    use async_trait::async_trait;
    use chrono::Utc;

    fn surface(input: &str) -> ConsoleSurface<&[u8], Vec<u8>> {
        ConsoleSurface::new(input.as_bytes(), Vec::new())
    }

    fn printed(surface: &ConsoleSurface<&[u8], Vec<u8>>) -> String {
        String::from_utf8(surface.output().clone()).unwrap()
    }

    #[test]
    fn prints_rows_with_marks() {
        let mut s = surface("");
        s.show_tasks(&ListView::Rows(vec![RowView {
            id: 4,
            completed: true,
            title: "Ship it".into(),
            description: Some("today".into()),
            priority: Priority::High,
            created: "Yesterday".into(),
            completed_on: Some("Today 08:00".into()),
        }]));
        s.show_stats(Stats { total: 1, pending: 0, completed: 1 });
        let out = printed(&s);
        assert!(out.contains("[x] #4 Ship it (High priority, Yesterday, done Today 08:00)"));
        assert!(out.contains("      today"));
        assert!(out.contains("total: 1  pending: 0  completed: 1"));
    }

    #[test]
    fn hidden_list_prints_only_stats() {
        let mut s = surface("").hide_list();
        s.show_tasks(&ListView::Empty);
        assert!(printed(&s).is_empty());
    }

    #[test]
    fn confirm_reads_an_answer() {
        assert!(surface("y\n").confirm("Delete?"));
        assert!(!surface("n\n").confirm("Delete?"));
        assert!(!surface("").confirm("Delete?"));
        assert!(surface("").assume_yes(true).confirm("Delete?"));
    }

    struct SkewedApi;

    #[async_trait]
    impl TaskApi for SkewedApi {
        async fn list(&self, filter: Filter) -> Result<Vec<Task>> {
            let task = |id, status| Task {
                id,
                title: "t".into(),
                description: None,
                priority: Priority::Medium,
                status,
                created_at: Utc::now(),
                completed_at: None,
            };
            Ok(match filter {
                Filter::All => vec![task(1, Status::Pending), task(2, Status::Completed)],
                Filter::Pending => vec![task(1, Status::Pending)],
                // The server forgets to filter.
                Filter::Completed => vec![task(1, Status::Pending), task(2, Status::Completed)],
            })
        }
        async fn create(&self, _: &NewTask) -> Result<Created> {
            Err(SyncError::Validation("unused".into()))
        }
        async fn toggle(&self, _: TaskId) -> Result<()> {
            Ok(())
        }
        async fn replace(&self, _: TaskId, _: &TaskReplace) -> Result<()> {
            Ok(())
        }
        async fn delete(&self, _: TaskId) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn check_flags_inconsistent_filters() {
        let mut out = Vec::new();
        let healthy = check(&SkewedApi, "http://tasks", &mut out).await.unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(!healthy);
        assert!(out.contains("ok    list tasks: 2 tasks"));
        assert!(out.contains("ok    pending filter: 1 tasks"));
        assert!(out.contains("FAIL  completed filter: 2 tasks, expected 1"));
    }
}
