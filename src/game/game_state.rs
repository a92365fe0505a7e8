use crate::game::action::GameAction;
use crate::game::slide::{can_slide, Board, BOARD_SIZE};
use std::fmt;
use std::hash::{Hash, Hasher};

/// One position of a 2048 game: the grid plus the cumulative score.
///
/// Valid actions and the terminal flag are derived from the grid once, at
/// construction. Equality and hashing only look at grid and score.
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    score: u64,
    valid_actions: [bool; GameAction::COUNT],
    terminal: bool,
}

impl GameState {
    pub fn new(board: Board, score: u64) -> Self {
        let mut valid_actions = [false; GameAction::COUNT];
        for action in GameAction::ALL {
            valid_actions[action.id()] = can_slide(&board, action);
        }
        let terminal = !valid_actions.iter().any(|&valid| valid);

        Self {
            board,
            score,
            valid_actions,
            terminal,
        }
    }

    pub fn empty() -> Self {
        Self::new([[0; BOARD_SIZE]; BOARD_SIZE], 0)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cell(&self, row: usize, col: usize) -> u32 {
        self.board[row][col]
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// A state is terminal when no action moves any tile.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn is_action_valid(&self, action: GameAction) -> bool {
        self.valid_actions[action.id()]
    }

    /// Valid actions in id order.
    pub fn available_actions(&self) -> Vec<GameAction> {
        GameAction::ALL
            .into_iter()
            .filter(|action| self.is_action_valid(*action))
            .collect()
    }

    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        let mut cells = Vec::with_capacity(BOARD_SIZE * BOARD_SIZE);
        for (row, values) in self.board.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                if *value == 0 {
                    cells.push((row, col));
                }
            }
        }
        cells
    }

    pub fn largest_tile(&self) -> u32 {
        self.board.iter().flatten().copied().max().unwrap_or(0)
    }
}

impl PartialEq for GameState {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.board == other.board
    }
}

impl Eq for GameState {}

impl Hash for GameState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.board.hash(state);
        self.score.hash(state);
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Score: {}", self.score)?;
        for row in &self.board {
            for value in row {
                write!(f, "{}\t", value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
