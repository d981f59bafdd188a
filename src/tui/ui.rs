use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{result_detail, results, subjects, test};
use super::{App, StatusKind, View};
use crate::session::Phase;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);
    draw_help_bar(f, app, chunks[3]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Subjects", "Test", "Results"];
    let selected = match app.view {
        View::Subjects => 0,
        View::Test => 1,
        View::Results | View::ResultDetail => 2,
    };

    let tabs = Tabs::new(tab_titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" InsightQA · {} ", app.email())),
        )
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Subjects => subjects::draw(f, app, area),
        View::Test => test::draw(f, app, area),
        View::Results => results::draw(f, app, area),
        View::ResultDetail => result_detail::draw(f, app, area),
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let Some(status) = &app.status else {
        return;
    };
    let color = match status.kind {
        StatusKind::Info => Color::Cyan,
        StatusKind::Success => Color::Green,
        StatusKind::Error => Color::Red,
    };
    let line = Paragraph::new(Span::styled(
        status.text.as_str(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ));
    f.render_widget(line, area);
}

fn key(label: &'static str) -> Span<'static> {
    Span::styled(label, Style::default().fg(Color::Cyan))
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.jump_mode {
        vec![
            Span::styled("Go to #", Style::default().fg(Color::Yellow)),
            Span::raw(app.jump_input.as_str()),
            Span::styled("█", Style::default().fg(Color::Yellow)),
            Span::raw(" | "),
            key("<CR>"),
            Span::raw(" Jump  "),
            key("<Esc>"),
            Span::raw(" Cancel"),
        ]
    } else {
        let mut spans = Vec::new();

        match app.view {
            View::Subjects => {
                spans.extend(vec![
                    key("j/k"),
                    Span::raw(" Nav  "),
                    key("l/<CR>"),
                    Span::raw(" Start  "),
                    key("<Tab>"),
                    Span::raw(" Results  "),
                    key("^r"),
                    Span::raw(" Refresh  "),
                ]);
            }
            View::Test => {
                let phase = app.controller.as_ref().map(|c| c.phase());
                if phase == Some(Phase::LoadFailed) {
                    spans.extend(vec![key("^r"), Span::raw(" Retry  ")]);
                } else {
                    spans.extend(vec![
                        key("^n/^p"),
                        Span::raw(" Next/Prev  "),
                        key("^g"),
                        Span::raw(" Go to  "),
                    ]);
                    if phase != Some(Phase::Submitting) {
                        spans.extend(vec![key("^s"), Span::raw(" Submit  ")]);
                    }
                }
                spans.extend(vec![key("<Esc>"), Span::raw(" Leave  ")]);
            }
            View::Results => {
                spans.extend(vec![
                    key("j/k"),
                    Span::raw(" Nav  "),
                    key("l/<CR>"),
                    Span::raw(" Review  "),
                    key("<Tab>"),
                    Span::raw(" Subjects  "),
                    key("^r"),
                    Span::raw(" Refresh  "),
                ]);
            }
            View::ResultDetail => {
                spans.extend(vec![
                    key("h/<Esc>"),
                    Span::raw(" Back  "),
                    key("j/k"),
                    Span::raw(" Scroll  "),
                    key("e"),
                    Span::raw(" Export PDF  "),
                ]);
            }
        }

        if app.view == View::Test {
            spans.extend(vec![key("^c"), Span::raw(" Quit")]);
        } else {
            spans.extend(vec![key("q"), Span::raw(" Quit")]);
        }

        spans
    };

    let help = Paragraph::new(Line::from(help_text)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
