use crate::api::TaskApi;
use crate::board::{Board, Dialog, Field, FormState, ListPanel};
use crate::config::FailureVisibility;
use crate::controller::{Action, Controller};
use crate::stats::Stats;
use crate::surface::{CreateForm, EditForm, Surface};
use crate::task::{Filter, Priority};
use crate::view::{self, ListView};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, error};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::rc::Rc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// How often the board redraws and reads input while a request is in flight.
const TICK: Duration = Duration::from_millis(50);

pub struct Screen<B: Backend> {
    terminal: Terminal<B>,
    pub board: Board,
}

impl<B: Backend> Screen<B> {
    pub fn draw(&mut self) -> io::Result<()> {
        let board = &mut self.board;
        self.terminal.draw(|f| draw(f, board))?;
        Ok(())
    }
}

/// The full-screen board as a [`Surface`]. The screen is shared with the
/// event loop, which keeps drawing it while the controller awaits the server.
pub struct TerminalSurface<B: Backend> {
    screen: Rc<RefCell<Screen<B>>>,
}

impl<B: Backend> TerminalSurface<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self {
            screen: Rc::new(RefCell::new(Screen {
                terminal,
                board: Board::new(),
            })),
        }
    }

    pub fn screen(&self) -> Rc<RefCell<Screen<B>>> {
        Rc::clone(&self.screen)
    }

    fn update(&mut self, change: impl FnOnce(&mut Board)) {
        let mut screen = self.screen.borrow_mut();
        change(&mut screen.board);
        if let Err(err) = screen.draw() {
            error!("failed to draw board: {err}");
        }
    }

    fn ask(&mut self, dialog: Dialog) -> KeyCode {
        self.update(|board| board.dialog = Some(dialog));
        let key = read_key().unwrap_or_else(|err| {
            error!("failed to read key: {err}");
            KeyCode::Esc
        });
        self.update(|board| board.dialog = None);
        key
    }
}

impl<B: Backend> Surface for TerminalSurface<B> {
    fn show_tasks(&mut self, view: &ListView) {
        self.update(|board| board.set_tasks(view.clone()));
    }

    fn show_load_error(&mut self, reason: &str) {
        self.update(|board| board.list = ListPanel::Failed(reason.to_string()));
    }

    fn show_stats(&mut self, stats: Stats) {
        self.update(|board| board.stats = stats);
    }

    fn reset_create_form(&mut self) {
        self.update(|board| board.create = None);
    }

    fn open_edit(&mut self, form: &EditForm) {
        self.update(|board| board.edit = Some(FormState::edit(form)));
    }

    fn close_edit(&mut self) {
        self.update(|board| {
            board.edit = None;
            board.edit_area = None;
        });
    }

    fn notify(&mut self, message: &str) {
        self.update(|board| board.status_line = Some(message.to_string()));
    }

    fn alert(&mut self, message: &str) {
        self.ask(Dialog::Alert(message.to_string()));
    }

    fn confirm(&mut self, question: &str) -> bool {
        matches!(
            self.ask(Dialog::Confirm(question.to_string())),
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter
        )
    }
}

fn read_key() -> io::Result<KeyCode> {
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(key.code);
            }
        }
    }
}

/// Sets up the terminal, runs the board until the user quits and restores
/// the terminal afterwards.
pub fn run_board<A: TaskApi>(rt: &Runtime, api: A, toggle_failures: FailureVisibility) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let surface = TerminalSurface::new(Terminal::new(CrosstermBackend::new(stdout))?);
    let screen = surface.screen();

    let mut controller = Controller::new(api, surface).with_toggle_failures(toggle_failures);
    let result = run_app(rt, &mut controller);

    disable_raw_mode()?;
    let mut guard = screen.borrow_mut();
    execute!(guard.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    guard.terminal.show_cursor()?;
    result
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Controller work requested from the board. Jobs run one at a time, in the
/// order they were asked for.
#[derive(Debug, Clone, PartialEq)]
enum Job {
    Reload,
    SetFilter(Filter),
    Create(CreateForm),
    SubmitEdit(EditForm),
    CloseEdit,
    Click { inside: bool },
    Row(Action),
}

impl Job {
    async fn run<A: TaskApi, S: Surface>(self, controller: &mut Controller<A, S>) -> bool {
        match self {
            Job::Reload => controller.reload().await,
            Job::SetFilter(filter) => controller.set_filter(filter).await,
            Job::Create(form) => controller.create(&form).await,
            Job::SubmitEdit(form) => controller.submit_edit(&form).await,
            Job::CloseEdit => {
                controller.close_edit();
                true
            }
            Job::Click { inside } => {
                controller.click(inside);
                true
            }
            Job::Row(action) => controller.dispatch(action).await,
        }
    }
}

pub fn run_app<A: TaskApi, B: Backend>(rt: &Runtime, controller: &mut Controller<A, TerminalSurface<B>>) -> io::Result<()> {
    let screen = controller.surface().screen();
    rt.block_on(event_loop(controller, screen))
}

async fn event_loop<A: TaskApi, B: Backend>(
    controller: &mut Controller<A, TerminalSurface<B>>,
    screen: Rc<RefCell<Screen<B>>>,
) -> io::Result<()> {
    let mut jobs = VecDeque::from([Job::Reload]);
    loop {
        let Some(job) = jobs.pop_front() else {
            screen.borrow_mut().draw()?;
            if event::poll(TICK)? && handle_event(&mut screen.borrow_mut().board, event::read()?, &mut jobs) == Flow::Quit {
                return Ok(());
            }
            continue;
        };

        debug!("running {job:?}");
        {
            let mut guard = screen.borrow_mut();
            guard.board.busy = true;
            guard.draw()?;
        }
        let finished = drive(job.run(&mut *controller), || {
            screen.borrow_mut().draw()?;
            while event::poll(Duration::ZERO)? {
                if handle_event(&mut screen.borrow_mut().board, event::read()?, &mut jobs) == Flow::Quit {
                    return Ok(Flow::Quit);
                }
            }
            Ok(Flow::Continue)
        })
        .await?;
        if finished.is_none() {
            return Ok(());
        }
        screen.borrow_mut().board.busy = false;
    }
}

/// Polls `work` to completion, calling `tick` every [`TICK`] while it is
/// pending. Returns `None` if `tick` asked to quit; `work` is dropped then.
async fn drive<F: Future>(work: F, mut tick: impl FnMut() -> io::Result<Flow>) -> io::Result<Option<F::Output>> {
    tokio::pin!(work);
    loop {
        tokio::select! {
            output = &mut work => return Ok(Some(output)),
            _ = tokio::time::sleep(TICK) => {
                if tick()? == Flow::Quit {
                    return Ok(None);
                }
            }
        }
    }
}

fn handle_event(board: &mut Board, event: Event, jobs: &mut VecDeque<Job>) -> Flow {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(board, key.code, jobs),
        Event::Mouse(mouse) if matches!(mouse.kind, MouseEventKind::Down(_)) => {
            if board.edit.is_some() {
                let inside = board.is_inside_edit(mouse.column, mouse.row);
                jobs.push_back(Job::Click { inside });
            }
            Flow::Continue
        }
        _ => Flow::Continue,
    }
}

/// Maps row keys to the same action names the markup rows carry.
fn row_action(code: KeyCode) -> Option<&'static str> {
    match code {
        KeyCode::Char(' ') => Some("toggle"),
        KeyCode::Char('e') => Some("edit"),
        KeyCode::Char('d') => Some("delete"),
        _ => None,
    }
}

fn handle_key(board: &mut Board, code: KeyCode, jobs: &mut VecDeque<Job>) -> Flow {
    board.status_line = None;

    if let Some(form) = board.edit.as_mut() {
        match code {
            KeyCode::Esc => jobs.push_back(Job::CloseEdit),
            KeyCode::Enter => jobs.push_back(Job::SubmitEdit(form.to_edit_form())),
            other => form.apply_key(other),
        }
        return Flow::Continue;
    }

    if let Some(form) = board.create.as_mut() {
        match code {
            KeyCode::Esc => board.create = None,
            KeyCode::Enter => jobs.push_back(Job::Create(form.to_create_form())),
            other => form.apply_key(other),
        }
        return Flow::Continue;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
        KeyCode::Char('a') => board.open_create(),
        KeyCode::Up | KeyCode::Char('k') => board.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => board.move_selection(1),
        KeyCode::Char('r') => jobs.push_back(Job::Reload),
        KeyCode::Char(c @ '1'..='3') => {
            let filter = Filter::ALL[(c as u8 - b'1') as usize];
            board.filter = filter;
            jobs.push_back(Job::SetFilter(filter));
        }
        other => {
            // Resolved against whatever row is selected when the key lands.
            let action = row_action(other)
                .zip(board.selected_task())
                .and_then(|(name, id)| Action::named(name, id));
            if let Some(action) = action {
                jobs.push_back(Job::Row(action));
            }
        }
    }
    Flow::Continue
}

pub fn draw(f: &mut Frame, board: &mut Board) {
    let form_height = if board.create.is_some() { 5 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Length(form_height),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, chunks[0], board);
    if let Some(form) = &board.create {
        draw_form(f, chunks[1], form, " New task ");
    }
    draw_list(f, chunks[2], board);
    draw_footer(f, chunks[3], board);

    board.edit_area = None;
    if let Some(form) = &board.edit {
        let area = centered(f.area(), 60, 8);
        f.render_widget(Clear, area);
        draw_form(f, area, form, " Edit task ");
        board.edit_area = Some(area);
    }

    if let Some(dialog) = &board.dialog {
        let (title, text, color) = match dialog {
            Dialog::Alert(msg) => (" Notice ", format!("{msg}\n\n[any key]"), Color::Yellow),
            Dialog::Confirm(msg) => (" Confirm ", format!("{msg}\n\n[y]es / [n]o"), Color::Red),
        };
        let area = centered(f.area(), 50, 7);
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(text)
                .wrap(Wrap { trim: true })
                .block(Block::default().title(title).borders(Borders::ALL).border_style(Style::default().fg(color))),
            area,
        );
    }
}

fn draw_header(f: &mut Frame, area: Rect, board: &Board) {
    let mut spans = Vec::new();
    for (i, filter) in Filter::ALL.iter().enumerate() {
        let style = if *filter == board.filter {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {}:{} ", i + 1, filter), style));
    }
    let Stats { total, pending, completed } = board.stats;
    spans.push(Span::raw(format!("   total {total}  pending {pending}  completed {completed}")));
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().title(" Tasks ").borders(Borders::ALL)),
        area,
    );
}

fn draw_list(f: &mut Frame, area: Rect, board: &Board) {
    let block = Block::default().borders(Borders::ALL);
    match &board.list {
        ListPanel::Loading => f.render_widget(Paragraph::new("Loading...").block(block), area),
        ListPanel::Failed(reason) => {
            let text = vec![
                Line::styled(view::LOAD_ERROR_HEADING, Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                Line::raw(reason.as_str()),
                Line::styled(view::LOAD_ERROR_HINT, Style::default().fg(Color::DarkGray)),
            ];
            f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }).block(block), area);
        }
        ListPanel::Tasks(ListView::Empty) => {
            let text = vec![
                Line::styled(view::EMPTY_HEADING, Style::default().add_modifier(Modifier::BOLD)),
                Line::raw(view::EMPTY_HINT),
            ];
            f.render_widget(Paragraph::new(text).block(block), area);
        }
        ListPanel::Tasks(ListView::Rows(rows)) => {
            let items: Vec<ListItem> = rows
                .iter()
                .map(|row| {
                    let mark = if row.completed { "[x] " } else { "[ ] " };
                    let mut meta = format!(" ({}, {}", row.priority_label(), row.created);
                    if let Some(done) = &row.completed_on {
                        meta.push_str(&format!(", done {done}"));
                    }
                    meta.push(')');
                    let title_style = if row.completed {
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    let mut lines = vec![Line::from(vec![
                        Span::raw(mark),
                        Span::styled(row.title.as_str(), title_style),
                        Span::styled(meta, Style::default().fg(priority_color(row.priority))),
                    ])];
                    if let Some(description) = &row.description {
                        lines.push(Line::styled(format!("    {description}"), Style::default().fg(Color::Gray)));
                    }
                    ListItem::new(lines)
                })
                .collect();
            let mut state = ListState::default().with_selected(Some(board.selected));
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));
            f.render_stateful_widget(list, area, &mut state);
        }
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Green,
        Priority::Medium => Color::Yellow,
        Priority::High => Color::Red,
    }
}

fn draw_form(f: &mut Frame, area: Rect, form: &FormState, title: &str) {
    let line = |field: Field, label: &str, value: String| {
        let focused = form.focus == field;
        let style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cursor = if focused && matches!(field, Field::Title | Field::Description) { "_" } else { "" };
        Line::from(vec![Span::styled(format!("{label:<12}"), style), Span::raw(format!("{value}{cursor}"))])
    };
    let mut lines = vec![
        line(Field::Title, "Title", form.title.clone()),
        line(Field::Description, "Description", form.description.clone()),
        line(Field::Priority, "Priority", format!("< {} >", form.priority)),
    ];
    if let Some(status) = form.status {
        lines.push(line(Field::Status, "Status", format!("< {status} >")));
    }
    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

fn draw_footer(f: &mut Frame, area: Rect, board: &Board) {
    let text = match (&board.status_line, board.edit.is_some() || board.create.is_some()) {
        _ if board.busy => Line::styled("Working...", Style::default().fg(Color::Yellow)),
        (Some(msg), _) => Line::styled(msg.as_str(), Style::default().fg(Color::Green)),
        (None, true) => Line::raw("Tab: next field  ←/→: change  Enter: save  Esc: cancel"),
        (None, false) => Line::raw("a: add  space: toggle  e: edit  d: delete  1-3: filter  r: reload  q: quit"),
    };
    f.render_widget(Paragraph::new(text), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
