mod ui;
mod widgets;
pub(crate) mod worker;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info};

use crate::api::{fallback, QuizApi};
use crate::models::{AttemptDetail, Identity, ResultSummary, Subject};
use crate::report::{self, ReportMeta};
use crate::session::{Phase, SessionController, SessionError};
use worker::{Request, Response, Worker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Subjects,
    Test,
    Results,
    ResultDetail,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Subjects => View::Results,
            View::Test => View::Test,
            View::Results => View::Subjects,
            View::ResultDetail => View::Results,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Subjects => View::Results,
            View::Test => View::Test,
            View::Results => View::Subjects,
            View::ResultDetail => View::Results,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn first(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    fn last(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(self.items.len() - 1);
        }
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// One-line notice under the content area.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub text: String,
    pub kind: StatusKind,
}

pub struct DetailState {
    pub id: i64,
    /// Subject from the results list, used when the detail omits it.
    pub listed_subject: Subject,
    pub detail: Option<AttemptDetail>,
    pub scroll: u16,
}

impl DetailState {
    pub fn subject_name(&self) -> &str {
        self.detail
            .as_ref()
            .and_then(|d| d.subject.as_ref())
            .unwrap_or(&self.listed_subject)
            .name()
    }
}

pub struct App {
    worker: Worker,
    identity: Identity,
    export_dir: PathBuf,
    pub view: View,
    pub subjects: StatefulList<Subject>,
    pub subjects_loading: bool,
    pub controller: Option<SessionController>,
    pub results: StatefulList<ResultSummary>,
    pub results_loading: bool,
    pub detail: Option<DetailState>,
    pub jump_mode: bool,
    pub jump_input: String,
    pub status: Option<Status>,
    pub should_quit: bool,
}

impl App {
    pub fn new(api: Arc<dyn QuizApi>, identity: Identity, export_dir: PathBuf) -> Self {
        let mut app = Self {
            worker: Worker::new(api),
            identity,
            export_dir,
            view: View::Subjects,
            subjects: StatefulList::with_items(Vec::new()),
            subjects_loading: false,
            controller: None,
            results: StatefulList::with_items(Vec::new()),
            results_loading: false,
            detail: None,
            jump_mode: false,
            jump_input: String::new(),
            status: None,
            should_quit: false,
        };
        app.refresh_subjects();
        app
    }

    pub fn email(&self) -> &str {
        &self.identity.email
    }

    fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            kind,
        });
    }

    fn refresh_subjects(&mut self) {
        self.subjects_loading = true;
        self.worker.dispatch(Request::Subjects);
    }

    fn refresh_results(&mut self) {
        self.results_loading = true;
        self.worker.dispatch(Request::Results {
            email: self.identity.email.clone(),
        });
    }

    fn refresh_view(&mut self) {
        match self.view {
            View::Subjects => self.refresh_subjects(),
            View::Results => self.refresh_results(),
            View::ResultDetail => {
                if let Some(id) = self.detail.as_ref().map(|d| d.id) {
                    self.worker.dispatch(Request::Detail { id });
                }
            }
            View::Test => {}
        }
    }

    fn switch_view(&mut self, view: View) {
        if view == View::Results && self.view != View::Results && self.results.items.is_empty() {
            self.refresh_results();
        }
        self.view = view;
    }

    pub fn start_test(&mut self, subject: Subject) {
        self.leave_test();
        info!(target: "insightqa::tui", subject = %subject, "starting test");

        let mut controller = SessionController::new(self.identity.clone(), subject);
        debug!(target: "insightqa::tui", session = ?controller.id(), "loading questions");
        match controller.begin_load() {
            Ok(ticket) => self.worker.dispatch(Request::Questions(ticket)),
            Err(e) => self.set_status(StatusKind::Error, e.to_string()),
        }
        self.controller = Some(controller);
        self.jump_mode = false;
        self.status = None;
        self.view = View::Test;
    }

    fn leave_test(&mut self) {
        if let Some(mut controller) = self.controller.take() {
            controller.tear_down();
        }
        self.jump_mode = false;
        self.jump_input.clear();
    }

    fn open_detail(&mut self) {
        if let Some(summary) = self.results.selected_item() {
            let id = summary.id;
            self.detail = Some(DetailState {
                id,
                listed_subject: summary.subject.clone(),
                detail: None,
                scroll: 0,
            });
            self.worker.dispatch(Request::Detail { id });
            self.view = View::ResultDetail;
        }
    }

    fn submit(&mut self) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        match controller.begin_submit() {
            Ok(ticket) => {
                self.set_status(StatusKind::Info, "Submitting...");
                self.worker.dispatch(Request::Submit(ticket));
            }
            Err(SessionError::AlreadySubmitting) => {
                self.set_status(StatusKind::Info, "Submission already in progress");
            }
            Err(e) => debug!(target: "insightqa::tui", error = %e, "submit ignored"),
        }
    }

    fn export_report(&mut self) {
        if self.detail.as_ref().is_some_and(|s| s.detail.is_none()) {
            self.set_status(StatusKind::Info, "Results are still loading");
            return;
        }
        let Some((state, detail)) = self
            .detail
            .as_ref()
            .and_then(|s| s.detail.as_ref().map(|d| (s, d)))
        else {
            return;
        };

        let meta = ReportMeta {
            subject: Some(state.subject_name().to_string()),
            user_label: Some(self.identity.email.clone()),
        };
        let outcome = report::generate(&detail.results, &meta)
            .and_then(|report| report.write_to(&self.export_dir));

        match outcome {
            Ok(path) => self.set_status(StatusKind::Success, format!("Report saved to {}", path.display())),
            Err(e) => self.set_status(StatusKind::Error, format!("Failed to export report: {}", e)),
        }
    }

    /// Applies every response that has arrived since the last tick.
    pub fn poll_responses(&mut self) {
        for response in self.worker.drain() {
            self.handle_response(response);
        }
    }

    fn handle_response(&mut self, response: Response) {
        match response {
            Response::Subjects(result) => {
                self.subjects_loading = false;
                match result {
                    Ok(subjects) => self.subjects = StatefulList::with_items(subjects),
                    Err(e) => self.set_status(StatusKind::Error, e.user_message(fallback::SUBJECTS)),
                }
            }
            Response::Questions { session, result } => {
                let Some(controller) = self.controller.as_mut() else {
                    debug!(target: "insightqa::tui", "questions arrived after the test was left");
                    return;
                };
                match controller.complete_load(session, result) {
                    Ok(Phase::LoadFailed) => {
                        let message = controller.message().unwrap_or(fallback::QUESTIONS).to_string();
                        self.set_status(StatusKind::Error, message);
                    }
                    Ok(_) => {}
                    Err(e) => debug!(target: "insightqa::tui", error = %e, "dropping question response"),
                }
            }
            Response::Submitted { session, result } => {
                let Some(controller) = self.controller.as_mut() else {
                    debug!(target: "insightqa::tui", "submission finished after the test was left");
                    return;
                };
                match controller.complete_submit(session, result) {
                    Ok(Phase::Submitted) => {
                        let message = controller.message().unwrap_or_default().to_string();
                        self.leave_test();
                        self.set_status(StatusKind::Success, message);
                        self.view = View::Results;
                        self.refresh_results();
                    }
                    Ok(_) => {
                        let message = controller.message().unwrap_or(fallback::SUBMIT).to_string();
                        self.set_status(StatusKind::Error, message);
                    }
                    Err(e) => debug!(target: "insightqa::tui", error = %e, "dropping submit response"),
                }
            }
            Response::Results(result) => {
                self.results_loading = false;
                match result {
                    Ok(results) => self.results = StatefulList::with_items(results),
                    Err(e) => self.set_status(StatusKind::Error, e.user_message(fallback::RESULTS)),
                }
            }
            Response::Detail { id, result } => {
                let Some(state) = self.detail.as_mut().filter(|d| d.id == id) else {
                    debug!(target: "insightqa::tui", id, "dropping detail for a closed result");
                    return;
                };
                match result {
                    Ok(detail) => state.detail = Some(detail),
                    Err(e) => self.set_status(StatusKind::Error, e.user_message(fallback::DETAIL)),
                }
            }
        }
    }

    fn session_op(&mut self, result: Result<(), SessionError>) {
        match result {
            Ok(()) => {}
            Err(e @ SessionError::IndexOutOfRange { .. }) => {
                self.set_status(StatusKind::Error, e.to_string());
            }
            Err(e) => debug!(target: "insightqa::tui", error = %e, "ignored input"),
        }
    }

    fn current_answer(&self) -> Option<String> {
        self.controller
            .as_ref()
            .and_then(SessionController::current_question)
            .map(|q| q.user_answer.clone())
    }

    fn edit_current_answer(&mut self, edit: impl FnOnce(&mut String)) {
        let Some(mut text) = self.current_answer() else {
            return;
        };
        edit(&mut text);
        if let Some(controller) = self.controller.as_mut() {
            let result = controller.edit_answer(text);
            self.session_op(result);
        }
    }

    fn handle_jump_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.jump_mode = false;
                self.jump_input.clear();
            }
            KeyCode::Enter => {
                self.jump_mode = false;
                let input = std::mem::take(&mut self.jump_input);
                match input.trim().parse::<usize>() {
                    Ok(number) if number >= 1 => {
                        if let Some(controller) = self.controller.as_mut() {
                            let result = controller.go_to(number - 1);
                            self.session_op(result);
                        }
                    }
                    _ => self.set_status(StatusKind::Error, format!("Not a question number: {}", input)),
                }
            }
            KeyCode::Backspace => {
                self.jump_input.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.jump_input.push(c);
            }
            _ => {}
        }
    }

    fn handle_test_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        let phase = self.controller.as_ref().map(SessionController::phase);

        match key {
            KeyCode::Esc => {
                self.leave_test();
                self.view = View::Subjects;
            }

            KeyCode::Char('n') if ctrl => {
                if let Some(controller) = self.controller.as_mut() {
                    let result = controller.go_next();
                    self.session_op(result);
                }
            }
            KeyCode::PageDown => {
                if let Some(controller) = self.controller.as_mut() {
                    let result = controller.go_next();
                    self.session_op(result);
                }
            }
            KeyCode::Char('p') if ctrl => {
                if let Some(controller) = self.controller.as_mut() {
                    let result = controller.go_previous();
                    self.session_op(result);
                }
            }
            KeyCode::PageUp => {
                if let Some(controller) = self.controller.as_mut() {
                    let result = controller.go_previous();
                    self.session_op(result);
                }
            }

            // Jump to a question number: Ctrl+g
            KeyCode::Char('g') if ctrl => {
                if phase.is_some_and(|p| p.is_editable()) {
                    self.jump_mode = true;
                    self.jump_input.clear();
                }
            }

            KeyCode::Char('s') if ctrl => self.submit(),

            // Retry after a failed load with a fresh session
            KeyCode::Char('r') if ctrl => {
                if phase == Some(Phase::LoadFailed) {
                    if let Some(subject) = self.controller.as_ref().map(|c| c.subject().clone()) {
                        self.start_test(subject);
                    }
                }
            }

            KeyCode::Backspace => self.edit_current_answer(|text| {
                text.pop();
            }),
            KeyCode::Enter => self.edit_current_answer(|text| text.push('\n')),
            KeyCode::Char(c) if !ctrl => self.edit_current_answer(|text| text.push(c)),

            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.jump_mode {
            self.handle_jump_key(key);
            return;
        }

        if self.view == View::Test {
            self.handle_test_key(key, modifiers);
            return;
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => self.refresh_view(),

            KeyCode::Esc => {
                if self.view == View::ResultDetail {
                    self.view = View::Results;
                    self.detail = None;
                }
            }

            KeyCode::Char('h') | KeyCode::Left => match self.view {
                View::ResultDetail => {
                    self.view = View::Results;
                    self.detail = None;
                }
                _ => self.switch_view(self.view.prev()),
            },
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Subjects => {
                    if let Some(subject) = self.subjects.selected_item().cloned() {
                        self.start_test(subject);
                    }
                }
                View::Results => self.open_detail(),
                _ => {}
            },

            KeyCode::Tab | KeyCode::BackTab => {
                let next = if key == KeyCode::BackTab {
                    self.view.prev()
                } else {
                    self.view.next()
                };
                self.switch_view(next);
            }

            KeyCode::Char('j') | KeyCode::Down => match self.view {
                View::Subjects => self.subjects.next(),
                View::Results => self.results.next(),
                View::ResultDetail => {
                    if let Some(state) = self.detail.as_mut() {
                        state.scroll = state.scroll.saturating_add(1);
                    }
                }
                View::Test => {}
            },
            KeyCode::Char('k') | KeyCode::Up => match self.view {
                View::Subjects => self.subjects.previous(),
                View::Results => self.results.previous(),
                View::ResultDetail => {
                    if let Some(state) = self.detail.as_mut() {
                        state.scroll = state.scroll.saturating_sub(1);
                    }
                }
                View::Test => {}
            },

            KeyCode::Char('g') => match self.view {
                View::Subjects => self.subjects.first(),
                View::Results => self.results.first(),
                _ => {}
            },
            KeyCode::Char('G') => match self.view {
                View::Subjects => self.subjects.last(),
                View::Results => self.results.last(),
                _ => {}
            },

            KeyCode::Char('e') if self.view == View::ResultDetail => self.export_report(),

            KeyCode::Enter => match self.view {
                View::Subjects => {
                    if let Some(subject) = self.subjects.selected_item().cloned() {
                        self.start_test(subject);
                    }
                }
                View::Results => self.open_detail(),
                _ => {}
            },

            _ => {}
        }
    }
}

/// Opens the terminal UI, optionally straight into a test.
pub fn run(
    api: Arc<dyn QuizApi>,
    identity: Identity,
    export_dir: PathBuf,
    start: Option<Subject>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(api, identity, export_dir);
    if let Some(subject) = start {
        app.start_test(subject);
    }

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.poll_responses();
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            if let Some(mut controller) = app.controller.take() {
                controller.tear_down();
            }
            return Ok(());
        }
    }
}
