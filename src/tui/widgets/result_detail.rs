use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::tier_color;
use crate::models::GradedResult;
use crate::report::layout::NO_ANSWER;
use crate::scoring::{format_marks, format_similarity, is_passing_marks, tier, ScoreTotal};
use crate::tui::{App, DetailState};

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(state) = &app.detail else {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Detailed Results ");
        let paragraph = Paragraph::new("No result selected").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Summary
            Constraint::Min(0),    // Questions
        ])
        .split(area);

    draw_summary(f, state, chunks[0]);
    draw_questions(f, state, chunks[1]);
}

fn draw_summary(f: &mut Frame, state: &DetailState, area: Rect) {
    let total = state
        .detail
        .as_ref()
        .map(|d| ScoreTotal::of(&d.results).to_string())
        .unwrap_or_else(|| "-".to_string());

    let text = Line::from(vec![
        Span::styled("Total Score: ", Style::default().fg(Color::Gray)),
        Span::styled(
            total,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} · Result #{} ", state.subject_name(), state.id))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn result_lines(index: usize, result: &GradedResult) -> Vec<Line<'_>> {
    let similarity_color = tier_color(tier(result.similarity));
    let (glyph, glyph_color) = if is_passing_marks(result.marks) {
        ("✓", Color::Green)
    } else {
        ("✗", Color::Red)
    };
    let user_answer = if result.user_answer.is_empty() {
        NO_ANSWER
    } else {
        result.user_answer.as_str()
    };

    vec![
        Line::from(vec![
            Span::styled(
                format!("Q{}. ", index + 1),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(result.question.as_str(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("  Your answer:  ", Style::default().fg(Color::Gray)),
            Span::raw(user_answer),
        ]),
        Line::from(vec![
            Span::styled("  Model answer: ", Style::default().fg(Color::Gray)),
            Span::raw(result.answer.as_str()),
        ]),
        Line::from(vec![
            Span::styled("  Similarity: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_similarity(result.similarity),
                Style::default().fg(similarity_color),
            ),
            Span::styled("  Marks: ", Style::default().fg(Color::Gray)),
            Span::styled(format_marks(result.marks), Style::default().fg(Color::White)),
            Span::raw(" "),
            Span::styled(glyph, Style::default().fg(glyph_color)),
        ]),
        Line::from(""),
    ]
}

fn draw_questions(f: &mut Frame, state: &DetailState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Questions ")
        .title_style(Style::default().fg(Color::Cyan));

    let Some(detail) = &state.detail else {
        let paragraph = Paragraph::new("Loading results...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    };

    if detail.results.is_empty() {
        let paragraph = Paragraph::new("No graded answers for this attempt.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let lines: Vec<Line> = detail
        .results
        .iter()
        .enumerate()
        .flat_map(|(i, r)| result_lines(i, r))
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0));
    f.render_widget(paragraph, area);
}
