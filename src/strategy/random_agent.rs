use crate::game::{ForwardModel, GameAction, GameState};
use crate::mcts::selection::choose_uniform;
use crate::strategy::GamePlayingAgent;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Baseline agent playing a uniformly random valid move without searching.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl GamePlayingAgent for RandomAgent {
    fn select_action(
        &mut self,
        state: &GameState,
        _model: &mut dyn ForwardModel,
    ) -> Option<GameAction> {
        choose_uniform(&state.available_actions(), &mut self.rng)
    }

    fn configuration_summary(&self) -> String {
        "#Random Agent".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameModel;

    #[test]
    fn test_random_agent_plays_only_valid_moves() {
        // only RIGHT and DOWN move the single tile
        let state = GameState::new([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]], 0);
        let mut model = GameModel::with_seed(10, 1);
        let mut agent = RandomAgent::with_seed(5);

        for _ in 0..50 {
            let action = agent.select_action(&state, &mut model).unwrap();
            assert!(matches!(action, GameAction::Right | GameAction::Down));
        }
        // the baseline never consumes model ticks
        assert_eq!(model.ticks_left(), 10);
    }

    #[test]
    fn test_random_agent_has_no_move_on_terminal_state() {
        let terminal = GameState::new(
            [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]],
            0,
        );
        let mut model = GameModel::with_seed(10, 1);
        assert_eq!(RandomAgent::with_seed(0).select_action(&terminal, &mut model), None);
    }
}
