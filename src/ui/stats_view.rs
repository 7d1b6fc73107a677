use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
    Frame,
};

use crate::{
    app::App,
    stats::{MyStats, StatEntry, StatsBoard},
};

/// Pure presenter for one ranked entry
pub fn present_row(rank: usize, entry: &StatEntry) -> Row<'static> {
    let rank_color = match rank {
        1 => Color::Yellow,
        2 => Color::Gray,
        3 => Color::LightRed,
        _ => Color::Reset,
    };
    Row::new(vec![
        Cell::from(format!("#{rank}")).style(Style::default().fg(rank_color)),
        Cell::from(entry.label().to_string())
            .style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(entry.count_caption()),
    ])
}

fn summary_line(stats: &MyStats) -> Line<'static> {
    let rate = stats
        .win_rate()
        .map(|r| format!("{r:.0}%"))
        .unwrap_or_else(|| "-".to_string());
    Line::from(vec![
        Span::raw(format!("Games played: {}", stats.total_games)),
        Span::raw("   "),
        Span::raw(format!("Victories: {}", stats.total_victories)),
        Span::raw("   "),
        Span::styled(
            format!("Win rate: {rate}"),
            Style::default().fg(Color::Green),
        ),
    ])
}

fn ranking_table(title: &'static str, entries: &[StatEntry]) -> Table<'static> {
    let rows: Vec<Row> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| present_row(i + 1, entry))
        .collect();
    Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(14),
        ],
    )
    .block(Block::default().borders(Borders::ALL).title(title))
}

pub struct StatsView<'a> {
    pub board: &'a StatsBoard,
}

impl Widget for StatsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // title
                Constraint::Length(3), // personal totals
                Constraint::Min(4),    // rankings
                Constraint::Length(2), // instructions
            ])
            .split(area);

        Paragraph::new("Statistics")
            .block(Block::default().borders(Borders::ALL))
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let board = self.board;
        if let Some(snapshot) = &board.snapshot {
            let mut title = "Your games".to_string();
            if let Some(at) = board.fetched_at {
                title.push_str(&format!(" (updated {})", at.format("%H:%M:%S")));
            }
            Paragraph::new(summary_line(&snapshot.my_stats))
                .block(Block::default().borders(Borders::ALL).title(title))
                .alignment(Alignment::Center)
                .render(chunks[1], buf);

            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[2]);
            Widget::render(
                ranking_table("Top words", &snapshot.top_words),
                columns[0],
                buf,
            );
            Widget::render(
                ranking_table("Top players", &snapshot.top_players),
                columns[1],
                buf,
            );
        }

        let status = if board.loading {
            Some(Span::styled(
                "Loading…",
                Style::default().add_modifier(Modifier::ITALIC),
            ))
        } else {
            board
                .error
                .as_ref()
                .map(|e| Span::styled(e.clone(), Style::default().fg(Color::Red)))
        };
        if let Some(status) = status {
            let target = if board.snapshot.is_some() {
                chunks[3]
            } else {
                chunks[1]
            };
            Paragraph::new(status)
                .alignment(Alignment::Center)
                .render(target, buf);
        }

        if !board.loading {
            let legend = Paragraph::new(Span::styled(
                "(p) play / (r) refresh / (l) log out / (esc) quit",
                Style::default().add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center);
            let bottom = Rect {
                y: chunks[3].y + chunks[3].height.saturating_sub(1),
                height: chunks[3].height.min(1),
                ..chunks[3]
            };
            legend.render(bottom, buf);
        }
    }
}

/// Render the stats screen
pub fn render_stats(app: &App, f: &mut Frame) {
    f.render_widget(StatsView { board: &app.stats }, f.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsSnapshot;

    fn rendered(board: &StatsBoard) -> String {
        let area = Rect::new(0, 0, 100, 24);
        let mut buffer = Buffer::empty(area);
        StatsView { board }.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn snapshot() -> StatsSnapshot {
        StatsSnapshot {
            my_stats: MyStats {
                total_games: 4,
                total_victories: 3,
            },
            top_words: vec![StatEntry::Word {
                word: "CRANE".into(),
                total_guesses: 12,
            }],
            top_players: vec![StatEntry::Player {
                user: "ada".into(),
                total_wins: 7,
            }],
        }
    }

    #[test]
    fn shows_loading_state() {
        let mut board = StatsBoard::default();
        board.begin_loading();
        let text = rendered(&board);
        assert!(text.contains("Loading"));
        assert!(!text.contains("(p) play"));
    }

    #[test]
    fn shows_rankings_and_totals() {
        let mut board = StatsBoard::default();
        board.loaded(snapshot());
        let text = rendered(&board);
        assert!(text.contains("Games played: 4"));
        assert!(text.contains("Win rate: 75%"));
        assert!(text.contains("CRANE"));
        assert!(text.contains("Guessed: 12"));
        assert!(text.contains("ada"));
        assert!(text.contains("Wins: 7"));
    }

    #[test]
    fn shows_error_without_snapshot() {
        let mut board = StatsBoard::default();
        board.failed("Unauthorized access. Please log in again.".into());
        assert!(rendered(&board).contains("Unauthorized access"));
    }

    #[test]
    fn no_games_has_no_win_rate() {
        let line = summary_line(&MyStats::default());
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("Win rate: -"));
    }
}
