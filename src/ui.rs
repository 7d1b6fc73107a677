pub mod form_view;
pub mod screen;
pub mod stats_view;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
    Frame,
};

use crate::{
    app::App,
    grid::{Cell, LetterStatus},
    session::{MatchSession, Phase},
    util::format_time,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Draws the screen for the app's current state.
pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

/// Match screen: timer, guess grid, messages and key legend.
pub struct MatchView<'a> {
    pub session: &'a MatchSession,
    pub cursor_col: usize,
}

impl<'a> MatchView<'a> {
    pub fn new(session: &'a MatchSession, cursor_col: usize) -> Self {
        Self {
            session,
            cursor_col,
        }
    }
}

/// Two lines per attempt: the letters and a spacer.
fn grid_height(total_attempts: usize) -> u16 {
    u16::try_from(total_attempts.saturating_mul(2)).unwrap_or(u16::MAX)
}

fn cell_style(cell: &Cell, editable: bool) -> Style {
    let base = Style::default().add_modifier(Modifier::BOLD);
    match cell.status {
        LetterStatus::Correct => base.fg(Color::Black).bg(Color::Green),
        LetterStatus::Present => base.fg(Color::Black).bg(Color::Yellow),
        LetterStatus::Absent => base.fg(Color::White).bg(Color::DarkGray),
        LetterStatus::Unset if editable => base.fg(Color::Black).bg(Color::Gray),
        LetterStatus::Unset => base.add_modifier(Modifier::DIM),
    }
}

impl Widget for MatchView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.session;
        let grid = session.grid();
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let height = grid_height(grid.total_attempts());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),           // title
                Constraint::Length(1),           // timer
                Constraint::Length(1),           // padding
                Constraint::Length(height),      // grid
                Constraint::Min(2),              // messages
                Constraint::Length(1),           // legend
            ])
            .split(area);

        Paragraph::new(Span::styled("Guess the word", bold_style))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let timer_style = if session.remaining_ms() <= 10_000 {
            bold_style.fg(Color::Red)
        } else {
            bold_style
        };
        Paragraph::new(Span::styled(
            format!("Time left {}", format_time(session.remaining_ms())),
            timer_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        let mut lines: Vec<Line> = Vec::with_capacity(grid.total_attempts() * 2);
        for (r, row) in grid.rows().iter().enumerate() {
            let editable = session.is_row_editable(r);
            let mut spans = Vec::with_capacity(row.len() * 2);
            for (c, cell) in row.iter().enumerate() {
                let mut style = cell_style(cell, editable);
                if editable && c == self.cursor_col {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                let glyph = cell.letter.unwrap_or(if editable { '_' } else { '·' });
                spans.push(Span::styled(format!(" {} ", glyph), style));
                spans.push(Span::raw(" "));
            }
            lines.push(Line::from(spans));
            lines.push(Line::default());
        }
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        let mut messages = Vec::new();
        if let Some(message) = session.completion_message() {
            messages.push(Line::from(Span::styled(
                message.to_string(),
                bold_style.fg(Color::Green),
            )));
        } else if session.phase() == Phase::Completed {
            messages.push(Line::from(Span::styled("Game over", bold_style)));
        }
        if let Some(error) = session.error() {
            messages.push(Line::from(Span::styled(
                error.to_string(),
                bold_style.fg(Color::Red),
            )));
        }
        if session.is_awaiting_feedback() {
            messages.push(Line::from(Span::styled("Checking…", italic_style)));
        } else if session.phase() == Phase::Idle && session.error().is_none() {
            messages.push(Line::from(Span::styled("Starting game…", italic_style)));
        }
        Paragraph::new(messages)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[4], buf);

        let legend = if session.is_in_progress() {
            "type to guess / ←→ move / (ctrl+r) play again / (esc) leave"
        } else {
            "(r) play again / (esc) leave"
        };
        Paragraph::new(Span::styled(legend, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }
}
