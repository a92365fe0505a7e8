use crate::game::{GameAction, GameState};
use crate::mcts::node::SearchTree;

/// Outcome of one simulated step or of a whole rollout.
#[derive(Debug, Clone, PartialEq)]
pub struct GameResult {
    pub score: u64,
    /// Action that produced `state`, when the result records a transition.
    pub preceding_action: Option<GameAction>,
    pub state: Option<GameState>,
}

impl GameResult {
    pub fn from_score(score: u64) -> Self {
        Self {
            score,
            preceding_action: None,
            state: None,
        }
    }

    pub fn from_transition(action: GameAction, state: GameState) -> Self {
        Self {
            score: state.score(),
            preceding_action: Some(action),
            state: Some(state),
        }
    }
}

/// Shape of the tree a finished search left behind, kept for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchSummary {
    pub iterations: usize,
    pub decision_nodes: usize,
    pub action_nodes: usize,
    pub depth: usize,
    pub root_visits: u32,
}

impl SearchSummary {
    pub fn from_tree(tree: &SearchTree, iterations: usize) -> Self {
        Self {
            iterations,
            decision_nodes: tree.decision_count(),
            action_nodes: tree.action_count(),
            depth: tree.depth(),
            root_visits: tree.decision(tree.root()).visit_count,
        }
    }
}
