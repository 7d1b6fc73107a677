use chrono::{DateTime, Local};
use serde::Deserialize;

/// Personal totals from `/game-stats/my-stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyStats {
    pub total_games: u32,
    pub total_victories: u32,
}

impl MyStats {
    /// Share of games won, in percent.
    pub fn win_rate(&self) -> Option<f64> {
        (self.total_games > 0)
            .then(|| (self.total_victories as f64 / self.total_games as f64) * 100.0)
    }
}

/// One ranked row on the stats screen. The shape is decided when the data is
/// fetched, so rendering never has to probe fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatEntry {
    Word { word: String, total_guesses: u32 },
    Player { user: String, total_wins: u32 },
}

impl StatEntry {
    pub fn label(&self) -> &str {
        match self {
            StatEntry::Word { word, .. } => word,
            StatEntry::Player { user, .. } => user,
        }
    }

    pub fn count_caption(&self) -> String {
        match self {
            StatEntry::Word { total_guesses, .. } => format!("Guessed: {}", total_guesses),
            StatEntry::Player { total_wins, .. } => format!("Wins: {}", total_wins),
        }
    }
}

/// Everything the stats screen shows, fetched in one go.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub my_stats: MyStats,
    pub top_words: Vec<StatEntry>,
    pub top_players: Vec<StatEntry>,
}

#[derive(Debug, Default)]
pub struct StatsBoard {
    pub loading: bool,
    pub error: Option<String>,
    pub snapshot: Option<StatsSnapshot>,
    pub fetched_at: Option<DateTime<Local>>,
}

impl StatsBoard {
    pub fn begin_loading(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn loaded(&mut self, snapshot: StatsSnapshot) {
        self.loading = false;
        self.error = None;
        self.snapshot = Some(snapshot);
        self.fetched_at = Some(Local::now());
    }

    pub fn failed(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }
}
