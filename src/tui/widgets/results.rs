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
    let title = if app.results.items.is_empty() {
        " Test Results ".to_string()
    } else {
        format!(" Test Results ({}) ", app.results.items.len())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    if app.results.items.is_empty() {
        let text = if app.results_loading {
            "Loading results..."
        } else {
            "No test results found."
        };
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .results
        .items
        .iter()
        .map(|summary| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<28}", truncate(summary.subject.name(), 26)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<32}", summary.date_label()),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(format!("#{}", summary.id), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let header = Line::from(vec![
        Span::styled(
            format!("{:<28}", "Subject"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{:<32}", "Date"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.results.selected);

    let inner = block.inner(area);
    f.render_widget(block, area);

    // Header on the first inner row, aligned past the highlight symbol
    let header_area = Rect {
        x: inner.x + 2,
        y: inner.y,
        width: inner.width.saturating_sub(2),
        height: inner.height.min(1),
    };
    f.render_widget(Paragraph::new(header), header_area);

    let list_area = Rect {
        x: inner.x,
        y: inner.y + 1,
        width: inner.width,
        height: inner.height.saturating_sub(1),
    };

    f.render_stateful_widget(list, list_area, &mut state);
}
