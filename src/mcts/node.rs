//! Search tree structures shared by the UCT and Sarsa-UCT(λ) agents.
//!
//! The tree alternates between two kinds of node:
//! - Decision nodes: one per reached game state, holding one slot per action
//! - Action nodes: one per valid action of their decision node, holding the
//!   stochastic outcomes reached by resolving that action
//!
//! Both live in flat arenas addressed by [`DecisionId`] / [`ActionId`], so
//! parent back-references are plain indices instead of shared pointers. A
//! tree is built for one `select_action` call and dropped afterwards.

use crate::game::{ForwardModel, GameAction, GameState};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecisionId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(usize);

impl DecisionId {
    pub const ROOT: DecisionId = DecisionId(0);
}

/// Node of the tree representing one visited game state.
#[derive(Debug, Clone)]
pub struct DecisionNode {
    pub state: GameState,
    /// Action node that produced this state, `None` for the root.
    pub parent: Option<ActionId>,
    /// Indexed by action id; empty when the action is invalid in `state`.
    pub children: [Option<ActionId>; GameAction::COUNT],
    pub visit_count: u32,
}

impl DecisionNode {
    pub fn child(&self, action: GameAction) -> Option<ActionId> {
        self.children[action.id()]
    }

    /// Non-empty action slots in id order.
    pub fn valid_children(&self) -> impl Iterator<Item = ActionId> + '_ {
        self.children.iter().flatten().copied()
    }
}

/// Node of the tree representing one action taken from its parent decision node.
#[derive(Debug, Clone)]
pub struct ActionNode {
    pub action: GameAction,
    pub parent: DecisionId,
    /// Outcomes reached so far. Reaching the same state twice reuses the child.
    pub children: HashMap<GameState, DecisionId>,
    pub visit_count: u32,
    pub local_lower_bound: f64,
    pub local_upper_bound: f64,
    /// Value estimate used for exploitation and by the best-child policies.
    pub utility: f64,
    /// Sum of backed-up returns, used by the running-average backup.
    pub total_utility: f64,
}

impl ActionNode {
    fn new(action: GameAction, parent: DecisionId, initial_utility: f64) -> Self {
        Self {
            action,
            parent,
            children: HashMap::new(),
            visit_count: 0,
            local_lower_bound: f64::INFINITY,
            local_upper_bound: f64::NEG_INFINITY,
            utility: initial_utility,
            total_utility: 0.0,
        }
    }

    pub fn lower_bound(&self) -> f64 {
        self.local_lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.local_upper_bound
    }

    /// Widens the local bounds so they include `value`.
    pub fn widen_bounds(&mut self, value: f64) {
        self.local_lower_bound = self.local_lower_bound.min(value);
        self.local_upper_bound = self.local_upper_bound.max(value);
    }
}

/// Arena-allocated search tree rooted at the state an agent has to move from.
#[derive(Debug, Clone)]
pub struct SearchTree {
    decisions: Vec<DecisionNode>,
    actions: Vec<ActionNode>,
    /// Starting utility of every action node created in this tree.
    initial_utility: f64,
}

impl SearchTree {
    pub fn new(root_state: GameState) -> Self {
        Self::with_initial_utility(root_state, 0.0)
    }

    pub fn with_initial_utility(root_state: GameState, initial_utility: f64) -> Self {
        let mut tree = Self {
            decisions: Vec::new(),
            actions: Vec::new(),
            initial_utility,
        };
        tree.add_decision(root_state, None);
        tree
    }

    pub fn root(&self) -> DecisionId {
        DecisionId::ROOT
    }

    pub fn decision(&self, id: DecisionId) -> &DecisionNode {
        &self.decisions[id.0]
    }

    pub fn decision_mut(&mut self, id: DecisionId) -> &mut DecisionNode {
        &mut self.decisions[id.0]
    }

    pub fn action(&self, id: ActionId) -> &ActionNode {
        &self.actions[id.0]
    }

    pub fn action_mut(&mut self, id: ActionId) -> &mut ActionNode {
        &mut self.actions[id.0]
    }

    pub fn decision_count(&self) -> usize {
        self.decisions.len()
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn decision_ids(&self) -> impl Iterator<Item = DecisionId> {
        (0..self.decisions.len()).map(DecisionId)
    }

    pub fn action_ids(&self) -> impl Iterator<Item = ActionId> {
        (0..self.actions.len()).map(ActionId)
    }

    /// Adds a decision node and eagerly creates an action node for every valid action.
    fn add_decision(&mut self, state: GameState, parent: Option<ActionId>) -> DecisionId {
        let id = DecisionId(self.decisions.len());
        let mut children = [None; GameAction::COUNT];
        for action in state.available_actions() {
            let action_id = ActionId(self.actions.len());
            self.actions
                .push(ActionNode::new(action, id, self.initial_utility));
            children[action.id()] = Some(action_id);
        }

        self.decisions.push(DecisionNode {
            state,
            parent,
            children,
            visit_count: 0,
        });
        id
    }

    /// Resolves the action of `id` through `model` and returns the resulting decision node.
    ///
    /// An outcome already reached through this action node is reused, so
    /// transpositions share their statistics.
    ///
    /// # Arguments
    /// * `id` - Action node to resolve.
    /// * `model` - Forward model applying the action to the parent's state.
    ///
    /// # Returns
    /// The decision node holding the sampled successor state, new or reused.
    ///
    /// # Panics
    /// Panics if the model refuses the action. Callers only resolve valid
    /// actions on a usable model, so a refusal is a broken invariant.
    pub fn simulate_action(&mut self, id: ActionId, model: &mut dyn ForwardModel) -> DecisionId {
        let node = &self.actions[id.0];
        let action = node.action;
        let parent_state = &self.decisions[node.parent.0].state;

        let next_state = match model.apply_action(parent_state, action) {
            Ok(state) => state,
            Err(err) => panic!("search tree resolved an unusable action {}: {}", action, err),
        };

        if let Some(&existing) = self.actions[id.0].children.get(&next_state) {
            return existing;
        }

        let child = self.add_decision(next_state.clone(), Some(id));
        self.actions[id.0].children.insert(next_state, child);
        child
    }

    /// Action node one level above the decision node that owns `id`, if any.
    pub fn grandparent_action(&self, id: ActionId) -> Option<ActionId> {
        self.decision(self.action(id).parent).parent
    }

    /// Widens the local bounds of `id` and of its grandparent action node with `value`.
    pub fn record_utility_bounds(&mut self, id: ActionId, value: f64) {
        self.action_mut(id).widen_bounds(value);
        if let Some(above) = self.grandparent_action(id) {
            self.action_mut(above).widen_bounds(value);
        }
    }

    /// Valid actions of `id` that have never been visited.
    pub fn unvisited_actions(&self, id: DecisionId) -> Vec<ActionId> {
        self.decision(id)
            .valid_children()
            .filter(|child| self.action(*child).visit_count == 0)
            .collect()
    }

    pub fn has_unvisited_action(&self, id: DecisionId) -> bool {
        self.decision(id)
            .valid_children()
            .any(|child| self.action(child).visit_count == 0)
    }

    /// Length of the longest path from the root, counted in decision nodes below it.
    pub fn depth(&self) -> usize {
        self.decision_ids()
            .map(|id| {
                let mut depth = 0;
                let mut current = self.decision(id).parent;
                while let Some(action) = current {
                    depth += 1;
                    current = self.decision(self.action(action).parent).parent;
                }
                depth
            })
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameModel;

    fn two_action_state() -> GameState {
        // only RIGHT and DOWN can move anything
        GameState::new([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]], 0)
    }

    #[test]
    fn test_root_has_eager_action_children() {
        let tree = SearchTree::new(two_action_state());
        let root = tree.decision(tree.root());

        assert!(root.parent.is_none());
        assert_eq!(root.visit_count, 0);
        assert!(root.child(GameAction::Left).is_none());
        assert!(root.child(GameAction::Up).is_none());
        assert_eq!(root.valid_children().count(), 2);
        assert_eq!(tree.action_count(), 2);

        for child in root.valid_children() {
            let node = tree.action(child);
            assert_eq!(node.parent, tree.root());
            assert_eq!(node.visit_count, 0);
            assert_eq!(node.local_lower_bound, f64::INFINITY);
            assert_eq!(node.local_upper_bound, f64::NEG_INFINITY);
        }
        assert_eq!(tree.unvisited_actions(tree.root()).len(), 2);
    }

    #[test]
    fn test_simulate_action_creates_and_reuses_children() {
        let mut tree = SearchTree::new(two_action_state());
        let right = tree.decision(tree.root()).child(GameAction::Right).unwrap();

        let mut model = GameModel::with_seed(10, 5);
        let first = tree.simulate_action(right, &mut model);
        assert_eq!(tree.decision(first).parent, Some(right));
        assert_eq!(model.ticks_left(), 9);

        // same seed replays the same spawn, so the outcome collapses into the same child
        let mut replay = GameModel::with_seed(10, 5);
        let second = tree.simulate_action(right, &mut replay);
        assert_eq!(first, second);
        assert_eq!(tree.action(right).children.len(), 1);
    }

    #[test]
    #[should_panic(expected = "unusable action")]
    fn test_simulate_action_panics_without_budget() {
        let mut tree = SearchTree::new(two_action_state());
        let right = tree.decision(tree.root()).child(GameAction::Right).unwrap();
        let mut model = GameModel::with_seed(0, 1);
        tree.simulate_action(right, &mut model);
    }

    #[test]
    fn test_record_utility_bounds_reaches_grandparent() {
        let mut tree = SearchTree::new(two_action_state());
        let right = tree.decision(tree.root()).child(GameAction::Right).unwrap();
        let mut model = GameModel::with_seed(10, 2);
        let child = tree.simulate_action(right, &mut model);
        let below = tree.decision(child).valid_children().next().unwrap();

        assert_eq!(tree.grandparent_action(below), Some(right));
        assert_eq!(tree.grandparent_action(right), None);

        tree.record_utility_bounds(below, 12.0);
        tree.record_utility_bounds(below, 4.0);
        assert_eq!(tree.action(below).lower_bound(), 4.0);
        assert_eq!(tree.action(below).upper_bound(), 12.0);
        assert_eq!(tree.action(right).lower_bound(), 4.0);
        assert_eq!(tree.action(right).upper_bound(), 12.0);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_initial_utility_applies_to_all_action_nodes() {
        let tree = SearchTree::with_initial_utility(two_action_state(), 3.5);
        assert!(tree.action_ids().all(|id| tree.action(id).utility == 3.5));
    }
}
