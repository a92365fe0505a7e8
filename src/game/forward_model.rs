//! Tick-budgeted forward model of 2048.
//!
//! Agents never mutate game states themselves: they ask a [`ForwardModel`]
//! to resolve an action. Every successful resolution consumes one tick, which
//! is how the outer game bounds the size of a single search.

use crate::game::action::GameAction;
use crate::game::game_state::GameState;
use crate::game::slide::slide_board;
use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Probability that a spawned tile is a 4 instead of a 2.
pub const SECONDARY_TILE_PROBABILITY: f64 = 0.1;
pub const PRIMARY_TILE_VALUE: u32 = 2;
pub const SECONDARY_TILE_VALUE: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("action {action} is not valid in this state")]
    InvalidAction { action: GameAction },

    #[error("forward model has no ticks left")]
    BudgetExhausted,
}

/// Capability the search engine consumes to simulate the game.
pub trait ForwardModel {
    /// Whether at least one more action can be resolved.
    fn is_usable(&self) -> bool;

    fn ticks_left(&self) -> u64;

    /// Slides `state` in direction `action` and spawns a random tile.
    fn apply_action(
        &mut self,
        state: &GameState,
        action: GameAction,
    ) -> Result<GameState, ModelError>;

    fn generate_initial_state(&mut self) -> GameState;
}

/// The 2048 rules with a local random source.
#[derive(Debug, Clone)]
pub struct GameModel {
    ticks_left: u64,
    rng: StdRng,
}

impl GameModel {
    /// Budget used by the outer game loop, which must never run dry.
    pub const UNLIMITED: u64 = u64::MAX;

    pub fn new(ticks: u64) -> Self {
        Self::with_rng(ticks, StdRng::from_os_rng())
    }

    pub fn with_seed(ticks: u64, seed: u64) -> Self {
        Self::with_rng(ticks, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(ticks: u64, rng: StdRng) -> Self {
        Self {
            ticks_left: ticks,
            rng,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(Self::UNLIMITED)
    }

    fn random_tile_value(&mut self) -> u32 {
        if self.rng.random_bool(SECONDARY_TILE_PROBABILITY) {
            SECONDARY_TILE_VALUE
        } else {
            PRIMARY_TILE_VALUE
        }
    }
}

impl ForwardModel for GameModel {
    fn is_usable(&self) -> bool {
        self.ticks_left > 0
    }

    fn ticks_left(&self) -> u64 {
        self.ticks_left
    }

    fn apply_action(
        &mut self,
        state: &GameState,
        action: GameAction,
    ) -> Result<GameState, ModelError> {
        if self.ticks_left == 0 {
            return Err(ModelError::BudgetExhausted);
        }
        if !state.is_action_valid(action) {
            return Err(ModelError::InvalidAction { action });
        }
        self.ticks_left -= 1;

        let mut board = *state.board();
        let gained = slide_board(&mut board, action);
        let slid = GameState::new(board, state.score() + gained);

        // A legal slide always frees or keeps at least one empty cell.
        if let Some(&(row, col)) = slid.empty_cells().choose(&mut self.rng) {
            board[row][col] = self.random_tile_value();
        }

        Ok(GameState::new(board, slid.score()))
    }

    fn generate_initial_state(&mut self) -> GameState {
        let mut board = *GameState::empty().board();
        let mut cells = GameState::empty().empty_cells();
        for _ in 0..2 {
            let index = self.rng.random_range(0..cells.len());
            let (row, col) = cells.swap_remove(index);
            board[row][col] = self.random_tile_value();
        }
        GameState::new(board, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_initial_state_has_two_tiles() {
        let mut model = GameModel::with_seed(10, 7);
        let state = model.generate_initial_state();
        let tiles: Vec<u32> = state.board().iter().flatten().copied().filter(|v| *v != 0).collect();
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|v| *v == 2 || *v == 4));
        assert_eq!(state.score(), 0);
        // generating a state does not consume ticks
        assert_eq!(model.ticks_left(), 10);
    }

    #[test]
    fn test_apply_action_consumes_tick_and_spawns_tile() {
        let mut model = GameModel::with_seed(2, 11);
        let state = GameState::new([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]], 0);

        let next = model.apply_action(&state, GameAction::Left).unwrap();
        assert_eq!(model.ticks_left(), 1);
        assert_eq!(next.cell(0, 0), 4);
        assert_eq!(next.score(), 4);
        let occupied = next.board().iter().flatten().filter(|v| **v != 0).count();
        assert_eq!(occupied, 2);
    }

    #[test]
    fn test_apply_action_errors() {
        let mut model = GameModel::with_seed(1, 3);
        let state = GameState::new([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]], 0);

        assert_matches!(
            model.apply_action(&state, GameAction::Left),
            Err(ModelError::InvalidAction { action: GameAction::Left })
        );
        assert_eq!(model.ticks_left(), 1);

        assert!(model.apply_action(&state, GameAction::Right).is_ok());
        assert!(!model.is_usable());
        assert_matches!(
            model.apply_action(&state, GameAction::Right),
            Err(ModelError::BudgetExhausted)
        );
    }

    #[test]
    fn test_seeded_models_are_reproducible() {
        let state = GameState::new([[2, 0, 0, 2], [0; 4], [4, 0, 0, 0], [0; 4]], 0);
        let mut a = GameModel::with_seed(5, 99);
        let mut b = GameModel::with_seed(5, 99);
        assert_eq!(a.generate_initial_state(), b.generate_initial_state());
        assert_eq!(
            a.apply_action(&state, GameAction::Right).unwrap(),
            b.apply_action(&state, GameAction::Right).unwrap()
        );
    }
}
