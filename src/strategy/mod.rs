//! Agents able to play a game of 2048 one move at a time.

pub mod random_agent;

use crate::game::{ForwardModel, GameAction, GameState};

pub use random_agent::RandomAgent;

/// Common interface of every 2048 agent.
///
/// The experiment runner hands each call a fresh forward model whose tick
/// budget bounds the thinking time of the agent for that move.
pub trait GamePlayingAgent: Send {
    /// Chooses the move to play from `state`.
    ///
    /// Returns `None` when `state` offers no valid action.
    fn select_action(
        &mut self,
        state: &GameState,
        model: &mut dyn ForwardModel,
    ) -> Option<GameAction>;

    /// Human readable description of the agent and its parameters.
    fn configuration_summary(&self) -> String;
}
