//! Final move selection once the search budget is spent.

use crate::game::GameAction;
use crate::mcts::node::{ActionId, DecisionId, SearchTree};
use crate::mcts::selection::choose_uniform;
use rand::RngCore;
use std::fmt;

/// Chooses the action an agent commits to at the root of its search tree.
pub trait BestChildPolicy: fmt::Display + Send {
    /// Returns `None` when `node` has no valid action.
    fn select_best(
        &self,
        tree: &SearchTree,
        node: DecisionId,
        rng: &mut dyn RngCore,
    ) -> Option<GameAction>;
}

/// Collects every valid child whose key equals the maximum key.
fn maximal_children<K>(tree: &SearchTree, node: DecisionId, key: K) -> Vec<ActionId>
where
    K: Fn(ActionId) -> f64,
{
    let mut best = Vec::new();
    let mut best_key = f64::NEG_INFINITY;
    for child in tree.decision(node).valid_children() {
        let value = key(child);
        if value > best_key {
            best_key = value;
            best.clear();
            best.push(child);
        } else if value == best_key {
            best.push(child);
        }
    }
    best
}

/// "Robust child": the most visited action.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostVisitPolicy;

impl BestChildPolicy for MostVisitPolicy {
    fn select_best(
        &self,
        tree: &SearchTree,
        node: DecisionId,
        rng: &mut dyn RngCore,
    ) -> Option<GameAction> {
        let best = maximal_children(tree, node, |child| f64::from(tree.action(child).visit_count));
        choose_uniform(&best, rng).map(|child| tree.action(child).action)
    }
}

impl fmt::Display for MostVisitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Robust Child (most visit)")
    }
}

/// "Max child": the action with the highest raw utility.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxUtilityPolicy;

impl BestChildPolicy for MaxUtilityPolicy {
    fn select_best(
        &self,
        tree: &SearchTree,
        node: DecisionId,
        rng: &mut dyn RngCore,
    ) -> Option<GameAction> {
        let best = maximal_children(tree, node, |child| tree.action(child).utility);
        choose_uniform(&best, rng).map(|child| tree.action(child).action)
    }
}

impl fmt::Display for MaxUtilityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Max Child (maximum utility)")
    }
}
