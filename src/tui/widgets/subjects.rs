use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::truncate;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Available Tests ")
        .title_style(Style::default().fg(Color::Cyan));

    if app.subjects.items.is_empty() {
        let text = if app.subjects_loading {
            "Loading subjects..."
        } else {
            "No subjects available. Press ^r to refresh."
        };
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let name_width = area.width.saturating_sub(24).max(10) as usize;
    let items: Vec<ListItem> = app
        .subjects
        .items
        .iter()
        .map(|subject| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<width$}", truncate(subject.name(), name_width), width = name_width),
                    Style::default().fg(Color::White),
                ),
                Span::styled("Start Test", Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.subjects.selected);

    f.render_stateful_widget(list, area, &mut state);
}
