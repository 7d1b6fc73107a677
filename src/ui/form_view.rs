use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::{auth::Form, util::mask};

const FORM_WIDTH: u16 = 50;

/// Login or sign-up form.
pub struct FormView<'a> {
    pub title: &'static str,
    pub form: &'a Form,
    pub notice: Option<&'a str>,
    pub legend: &'static str,
}

fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

impl Widget for FormView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = centered(area, FORM_WIDTH);
        let mut constraints = vec![Constraint::Length(3)];
        constraints.extend(self.form.fields.iter().map(|_| Constraint::Length(3)));
        constraints.push(Constraint::Min(2));
        constraints.push(Constraint::Length(1));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .vertical_margin(1)
            .constraints(constraints)
            .split(area);

        Paragraph::new(Span::styled(
            self.title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        for (i, field) in self.form.fields.iter().enumerate() {
            let focused = i == self.form.focus;
            let border_style = if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            let mut value = if field.secret {
                mask(&field.value)
            } else {
                field.value.clone()
            };
            if focused && !self.form.submitting {
                value.push('▏');
            }
            Paragraph::new(value)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(border_style)
                        .title(field.label),
                )
                .render(chunks[i + 1], buf);
        }

        let mut messages = Vec::new();
        if self.form.submitting {
            messages.push(Line::from(Span::styled(
                "Please wait…",
                Style::default().add_modifier(Modifier::ITALIC),
            )));
        }
        if let Some(error) = &self.form.error {
            messages.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        if let Some(notice) = self.notice {
            messages.push(Line::from(Span::styled(
                notice.to_string(),
                Style::default().fg(Color::Green),
            )));
        }
        let message_area = chunks[chunks.len() - 2];
        Paragraph::new(messages)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(message_area, buf);

        Paragraph::new(Span::styled(
            self.legend,
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[chunks.len() - 1], buf);
    }
}
