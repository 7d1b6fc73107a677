use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GridError;

pub const TOTAL_ATTEMPTS: usize = 5;
pub const WORD_LENGTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LetterStatus {
    #[default]
    Unset,
    Correct,
    Present,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub letter: Option<char>,
    pub status: LetterStatus,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.letter.is_none()
    }
}

/// Per-column classification returned by the server for one attempt.
pub type Feedback = BTreeMap<usize, LetterStatus>;

/// Attempt rows of letter cells, `total_attempts` by `word_length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
    word_length: usize,
}

impl Grid {
    pub fn new(total_attempts: usize, word_length: usize) -> Self {
        Self {
            rows: vec![vec![Cell::default(); word_length]; total_attempts],
            word_length,
        }
    }

    pub fn total_attempts(&self) -> usize {
        self.rows.len()
    }

    pub fn word_length(&self) -> usize {
        self.word_length
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Writes a single cell. Letters are stored uppercased; `None` empties the
    /// cell. Returns false when the position is outside the grid.
    pub fn set_letter(&mut self, row: usize, col: usize, letter: Option<char>) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                cell.letter = letter.and_then(|c| c.to_uppercase().next());
                true
            }
            None => false,
        }
    }

    pub fn row_is_full(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .is_some_and(|r| r.iter().all(|cell| !cell.is_empty()))
    }

    /// The joined letters of a full row.
    pub fn row_word(&self, row: usize) -> Option<String> {
        if !self.row_is_full(row) {
            return None;
        }
        self.rows[row].iter().map(|cell| cell.letter).collect()
    }

    pub fn row_is_resolved(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .is_some_and(|r| r.iter().all(|cell| cell.status != LetterStatus::Unset))
    }

    pub fn row_is_blank(&self, row: usize) -> bool {
        self.rows.get(row).is_some_and(|r| {
            r.iter()
                .all(|cell| cell.is_empty() && cell.status == LetterStatus::Unset)
        })
    }

    /// Sets the status of every cell in `row`. Nothing is written unless the
    /// feedback covers every column.
    pub fn apply_feedback(&mut self, row: usize, feedback: &Feedback) -> Result<(), GridError> {
        let word_length = self.word_length;
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(GridError::RowOutOfBounds { row })?;

        let statuses = (0..word_length)
            .map(|col| {
                feedback
                    .get(&col)
                    .copied()
                    .ok_or(GridError::MissingFeedback { col })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (cell, status) in cells.iter_mut().zip(statuses) {
            cell.status = status;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.fill(Cell::default());
        }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(TOTAL_ATTEMPTS, WORD_LENGTH)
    }
}
