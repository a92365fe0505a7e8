//! Selection, expansion and rollout steps shared by every tree-search agent.
//!
//! Decision nodes with an untried action are expansion points. Only fully
//! tried nodes are ranked with UCB1:
//!
//! `normalize(child) + C × sqrt(ln(N_parent) / N_child)`
//!
//! so neither `ln(0)` nor a division by zero can occur. Whenever several
//! candidates share the best value one of them is drawn uniformly.

use crate::game::{ForwardModel, GameAction, GameState};
use crate::mcts::node::{ActionId, DecisionId, SearchTree};
use crate::mcts::normalization::NormalizationPolicy;
use rand::prelude::IndexedRandom;
use rand::RngCore;

/// Draws one element uniformly, `None` when `candidates` is empty.
pub fn choose_uniform<T: Copy>(candidates: &[T], rng: &mut dyn RngCore) -> Option<T> {
    candidates.choose(rng).copied()
}

/// UCB1 score of a child visited `child_visits` times under a parent visited `parent_visits` times.
#[inline]
pub fn ucb1(exploitation: f64, exploration_constant: f64, parent_visits: u32, child_visits: u32) -> f64 {
    let exploration =
        (f64::from(parent_visits).ln() / f64::from(child_visits)).sqrt();
    exploitation + exploration_constant * exploration
}

/// Children of a fully tried decision node sharing the best UCB1 score.
///
/// # Arguments
/// * `tree` - Search tree holding `node`.
/// * `node` - Decision node whose valid actions have all been visited.
/// * `normalization` - Maps each child's utility into the exploitation term.
/// * `exploration_constant` - UCB1 constant C.
///
/// # Returns
/// Every child reaching the maximum score, in slot order. Empty when `node` has no valid action.
pub fn best_ucb_children(
    tree: &SearchTree,
    node: DecisionId,
    normalization: &dyn NormalizationPolicy,
    exploration_constant: f64,
) -> Vec<ActionId> {
    let parent_visits = tree.decision(node).visit_count;
    let mut best = Vec::new();
    let mut best_value = f64::NEG_INFINITY;

    for child in tree.decision(node).valid_children() {
        let action = tree.action(child);
        let value = ucb1(
            normalization.normalize(action),
            exploration_constant,
            parent_visits,
            action.visit_count,
        );

        if value > best_value {
            best_value = value;
            best.clear();
            best.push(child);
        } else if value == best_value {
            best.push(child);
        }
    }

    best
}

/// Descends from `start` with UCB1 until reaching a terminal node, a node
/// with an untried action, or the end of the model's budget.
///
/// # Arguments
/// * `tree` - Search tree, grown when an action resolves to an unseen outcome.
/// * `start` - Decision node the descent begins at.
/// * `model` - Forward model charged one tick per resolved action.
/// * `normalization` - Policy used by UCB1.
/// * `exploration_constant` - UCB1 constant C.
/// * `rng` - Breaks ties between equally scored children.
///
/// # Returns
/// The decision node where the descent stopped.
pub fn select(
    tree: &mut SearchTree,
    start: DecisionId,
    model: &mut dyn ForwardModel,
    normalization: &dyn NormalizationPolicy,
    exploration_constant: f64,
    rng: &mut dyn RngCore,
) -> DecisionId {
    let mut current = start;
    loop {
        if tree.decision(current).state.is_terminal() || !model.is_usable() {
            return current;
        }
        if tree.has_unvisited_action(current) {
            return current;
        }

        let candidates = best_ucb_children(tree, current, normalization, exploration_constant);
        let Some(chosen) = choose_uniform(&candidates, rng) else {
            return current;
        };
        current = tree.simulate_action(chosen, model);
    }
}

/// Resolves one untried action of `leaf`, chosen uniformly, and returns the resulting node.
///
/// Terminal leaves and exhausted models return `leaf` unchanged.
///
/// # Arguments
/// * `tree` - Search tree holding `leaf`.
/// * `leaf` - Node returned by [`select`].
/// * `model` - Forward model charged one tick for the resolved action.
/// * `rng` - Picks among the untried actions.
///
/// # Returns
/// The outcome of the expanded action, or `leaf` when nothing was expanded.
pub fn expand(
    tree: &mut SearchTree,
    leaf: DecisionId,
    model: &mut dyn ForwardModel,
    rng: &mut dyn RngCore,
) -> DecisionId {
    if !model.is_usable() || tree.decision(leaf).state.is_terminal() {
        return leaf;
    }

    let untried = tree.unvisited_actions(leaf);
    match choose_uniform(&untried, rng) {
        Some(action) => tree.simulate_action(action, model),
        None => leaf,
    }
}

/// Plays uniformly random valid actions from `start` until the game ends,
/// the model runs out of ticks or `max_depth` actions have been played.
///
/// # Arguments
/// * `start` - State the rollout begins from, not modified.
/// * `model` - Forward model charged one tick per action.
/// * `rng` - Picks each action uniformly among the valid ones.
/// * `max_depth` - Cap on the number of actions, unbounded when `None`.
/// * `on_step` - Sees every action taken together with the state it produced.
///
/// # Returns
/// The last state reached.
pub fn rollout<F>(
    start: &GameState,
    model: &mut dyn ForwardModel,
    rng: &mut dyn RngCore,
    max_depth: Option<usize>,
    mut on_step: F,
) -> GameState
where
    F: FnMut(GameAction, &GameState),
{
    let mut current = start.clone();
    let mut depth = 0;

    while !current.is_terminal() && model.is_usable() {
        if max_depth.is_some_and(|limit| depth >= limit) {
            break;
        }

        let actions = current.available_actions();
        let Some(action) = choose_uniform(&actions, rng) else {
            break;
        };
        current = match model.apply_action(&current, action) {
            Ok(next) => next,
            Err(err) => panic!("rollout resolved an unusable action {}: {}", action, err),
        };
        on_step(action, &current);
        depth += 1;
    }

    current
}
