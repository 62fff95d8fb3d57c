use itertools::Itertools;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Screen};
use crate::session::SessionPhase;

const HORIZONTAL_MARGIN: u16 = 5;

pub fn draw(app: &App, f: &mut Frame) {
    match app.screen {
        Screen::Typing => draw_typing(app, f),
        Screen::Results => draw_results(app, f),
    }
}

fn draw_typing(app: &App, f: &mut Frame) {
    let area = f.area();
    let session = &app.session;

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let target = session.target_text();
    let prompt_occupied_lines =
        ((target.width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1)
            + target.matches('\n').count() as u16;

    let top_pad = (area
        .height
        .saturating_sub(prompt_occupied_lines)
        .saturating_sub(3))
        / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(top_pad),
                Constraint::Min(1),
            ]
            .as_ref(),
        )
        .split(area);

    f.render_widget(
        Paragraph::new(stat_line(app)).alignment(Alignment::Center),
        chunks[0],
    );

    if let Some(banner) = app.banner() {
        f.render_widget(
            Paragraph::new(Span::styled(
                banner.to_string(),
                Style::default().add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center),
            chunks[1],
        );
    }

    if session.phase() == SessionPhase::Paused {
        f.render_widget(
            Paragraph::new(Span::styled(
                "PAUSED - ctrl-p to resume",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            ))
            .alignment(Alignment::Center),
            chunks[2],
        );
    }

    let lines = prompt_lines(session.typed_chars(), session.target_chars());
    let single_line = lines.len() == 1 && prompt_occupied_lines == 1;
    f.render_widget(
        Paragraph::new(lines)
            .alignment(if single_line {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: false }),
        chunks[4],
    );
}

fn draw_results(app: &App, f: &mut Frame) {
    let area = f.area();
    let session = &app.session;

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);
    let magenta = Style::default().fg(Color::Magenta);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled("Session complete", bold.fg(Color::Green))),
        Line::default(),
    ];

    if let Some(result) = session.result() {
        lines.push(Line::from(vec![
            Span::styled(format!("{} wpm", result.wpm), bold),
            Span::raw("   "),
            Span::styled(format!("{}% accuracy", result.accuracy_percent), bold),
        ]));
        lines.push(Line::from(Span::raw(format!(
            "{} chars in {}s, {} errors",
            result.character_count, result.duration_secs, result.errors
        ))));

        let worst = result
            .key_errors
            .iter()
            .sorted_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)))
            .take(5)
            .map(|(key, count)| format!("{} ×{}", printable_key(*key), count))
            .join("   ");
        if !worst.is_empty() {
            lines.push(Line::default());
            lines.push(Line::from(vec![
                Span::styled("missed keys: ", dim),
                Span::styled(worst, magenta),
            ]));
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        match session.phase() {
            SessionPhase::Submitted => "(r)etry  (esc)ape",
            _ => "(enter) save result  (r)etry  (esc)ape",
        },
        dim.add_modifier(Modifier::ITALIC),
    )));

    if let Some(status) = &app.status {
        lines.push(Line::from(Span::styled(status.clone(), magenta)));
    }

    let top_pad = area.height.saturating_sub(lines.len() as u16) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(top_pad), Constraint::Min(1)].as_ref())
        .split(area);

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        chunks[1],
    );
}

fn stat_line(app: &App) -> Line<'static> {
    let session = &app.session;
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    Line::from(vec![
        Span::styled(format!("{}s left", session.remaining_secs()), bold),
        Span::styled("   ", dim),
        Span::styled(format!("{} wpm", session.wpm()), bold),
        Span::styled("   ", dim),
        Span::styled(format!("{}% acc", session.accuracy_percent()), bold),
        Span::styled("   ", dim),
        Span::styled(
            format!("{}% done", session.progress_percent().round() as u32),
            bold,
        ),
    ])
}

/// Build the styled prompt: typed characters colored by correctness, the
/// cursor underlined, the untyped remainder dimmed. Target newlines break
/// lines; a mistyped character is shown as typed, with wrong spaces drawn
/// as a middle dot.
pub fn prompt_lines(typed: &[char], target: &[char]) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let green = bold.fg(Color::Green);
    let red = bold.fg(Color::Red);
    let dim = bold.add_modifier(Modifier::DIM);
    let cursor = dim.add_modifier(Modifier::UNDERLINED);

    let mut lines = Vec::new();
    let mut spans: Vec<Span> = Vec::new();

    for (idx, &expected) in target.iter().enumerate() {
        let (shown, style) = if idx < typed.len() {
            if typed[idx] == expected {
                (plain(expected), green)
            } else {
                // show what was typed, with wrong whitespace made visible
                (printable_key(typed[idx]), red)
            }
        } else if idx == typed.len() {
            (plain(expected), cursor)
        } else {
            (plain(expected), dim)
        };

        spans.push(Span::styled(shown, style));
        if expected == '\n' {
            lines.push(Line::from(std::mem::take(&mut spans)));
        }
    }

    lines.push(Line::from(spans));
    lines
}

fn printable_key(c: char) -> String {
    match c {
        ' ' => "·".to_string(),
        '\n' => "⏎".to_string(),
        c => c.to_string(),
    }
}

fn plain(c: char) -> String {
    match c {
        '\n' => "⏎".to_string(),
        c => c.to_string(),
    }
}
