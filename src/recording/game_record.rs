//! In-memory record of one complete game played by an agent.

use crate::game::{GameAction, GameState};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One move of the game and the state it led to
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRecord {
    pub action: GameAction,
    pub state: GameState,
}

#[derive(Debug, Clone)]
pub struct GameRecord {
    /// Zero-based position of the game inside its experiment
    pub index: usize,
    pub initial_state: GameState,
    pub moves: Vec<MoveRecord>,
    /// Wall-clock time spent playing the game
    pub duration: Duration,
}

impl GameRecord {
    pub fn new(index: usize, initial_state: GameState) -> Self {
        Self {
            index,
            initial_state,
            moves: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn record_move(&mut self, action: GameAction, state: GameState) {
        self.moves.push(MoveRecord { action, state });
    }

    pub fn final_state(&self) -> &GameState {
        self.moves
            .last()
            .map(|record| &record.state)
            .unwrap_or(&self.initial_state)
    }

    pub fn score(&self) -> u64 {
        self.final_state().score()
    }

    pub fn steps(&self) -> usize {
        self.moves.len()
    }

    pub fn largest_tile(&self) -> u32 {
        self.final_state().largest_tile()
    }

    /// Flattens the record into a CSV row.
    pub fn to_row(&self, experiment: &str) -> GameRow {
        GameRow {
            experiment: experiment.to_string(),
            game: self.index + 1,
            score: self.score(),
            steps: self.steps(),
            largest_tile: self.largest_tile(),
            duration_ms: self.duration.as_millis() as u64,
        }
    }
}

/// Per-game line of the results CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRow {
    pub experiment: String,
    /// One-based game number
    pub game: usize,
    pub score: u64,
    pub steps: usize,
    pub largest_tile: u32,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tracks_final_state() {
        let start = GameState::new([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]], 0);
        let mut record = GameRecord::new(2, start.clone());
        assert_eq!(record.final_state(), &start);
        assert_eq!(record.steps(), 0);

        let next = GameState::new([[4, 0, 0, 0], [0; 4], [0, 0, 2, 0], [0; 4]], 4);
        record.record_move(GameAction::Left, next.clone());
        record.duration = Duration::from_millis(1500);

        assert_eq!(record.final_state(), &next);
        assert_eq!(record.score(), 4);
        assert_eq!(record.largest_tile(), 4);

        let row = record.to_row("uct");
        assert_eq!(row.game, 3);
        assert_eq!(row.steps, 1);
        assert_eq!(row.duration_ms, 1500);
    }
}
