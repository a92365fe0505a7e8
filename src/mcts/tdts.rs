//! Sarsa-UCT(λ) agent (Temporal Difference Tree Search).
//!
//! Tree policy, expansion and rollouts are the same as for UCT. The backup
//! replaces the running average with a bootstrapped temporal-difference
//! update carrying an eligibility trace:
//!
//! 1. Un-memorized pass over the rollout, from the final state back to the
//!    tree leaf. Rollout states have no value estimate, so only the reward
//!    differences accumulate into the trace.
//! 2. Memorized pass over the tree path, from the leaf back to the root,
//!    updating each action value with the accumulated trace.
//!
//! With γ = λ = 1 the trace equals the full Monte Carlo return.

use crate::game::{ForwardModel, GameAction, GameState};
use crate::mcts::best_child::BestChildPolicy;
use crate::mcts::hyperparameters::SearchHyperparameters;
use crate::mcts::mcts_result::{GameResult, SearchSummary};
use crate::mcts::node::{DecisionId, SearchTree};
use crate::mcts::normalization::NormalizationPolicy;
use crate::mcts::selection::{expand, rollout, select};
use crate::strategy::GamePlayingAgent;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct TdtsAgent {
    exploration_constant: f64,
    reward_discount: f64,
    eligibility_trace_decay: f64,
    initial_utility: f64,
    max_rollout_depth: Option<usize>,
    best_child_policy: Box<dyn BestChildPolicy>,
    normalization_policy: Box<dyn NormalizationPolicy>,
    rng: StdRng,
    last_search: SearchSummary,
}

/// Builder for [`TdtsAgent`]; unset fields fall back to [`SearchHyperparameters::default`].
pub struct TdtsAgentBuilder {
    params: SearchHyperparameters,
    best_child_policy: Option<Box<dyn BestChildPolicy>>,
    normalization_policy: Option<Box<dyn NormalizationPolicy>>,
    seed: Option<u64>,
}

impl TdtsAgentBuilder {
    pub fn exploration_constant(mut self, value: f64) -> Self {
        self.params.exploration_constant = value;
        self
    }

    /// γ
    pub fn reward_discount(mut self, value: f64) -> Self {
        self.params.reward_discount = value;
        self
    }

    /// λ
    pub fn eligibility_trace_decay(mut self, value: f64) -> Self {
        self.params.eligibility_trace_decay = value;
        self
    }

    pub fn initial_utility(mut self, value: f64) -> Self {
        self.params.initial_action_utility = value;
        self
    }

    pub fn max_rollout_depth(mut self, depth: Option<usize>) -> Self {
        self.params.max_rollout_depth = depth;
        self
    }

    pub fn best_child_policy(mut self, policy: Box<dyn BestChildPolicy>) -> Self {
        self.best_child_policy = Some(policy);
        self
    }

    pub fn normalization_policy(mut self, policy: Box<dyn NormalizationPolicy>) -> Self {
        self.normalization_policy = Some(policy);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn hyperparameters(mut self, params: &SearchHyperparameters) -> Self {
        self.params = params.clone();
        self.best_child_policy = Some(params.best_child.build());
        self.normalization_policy = Some(params.normalization.build());
        self
    }

    pub fn build(self) -> TdtsAgent {
        let params = self.params;
        TdtsAgent {
            exploration_constant: params.exploration_constant,
            reward_discount: params.reward_discount,
            eligibility_trace_decay: params.eligibility_trace_decay,
            initial_utility: params.initial_action_utility,
            max_rollout_depth: params.max_rollout_depth,
            best_child_policy: self
                .best_child_policy
                .unwrap_or_else(|| params.best_child.build()),
            normalization_policy: self
                .normalization_policy
                .unwrap_or_else(|| params.normalization.build()),
            rng: match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            },
            last_search: SearchSummary::default(),
        }
    }
}

impl TdtsAgent {
    pub fn builder() -> TdtsAgentBuilder {
        TdtsAgentBuilder {
            params: SearchHyperparameters::default(),
            best_child_policy: None,
            normalization_policy: None,
            seed: None,
        }
    }

    pub fn last_search(&self) -> SearchSummary {
        self.last_search
    }

    /// Searches from `state` until `model` is exhausted and returns the tree.
    pub fn search(&mut self, state: &GameState, model: &mut dyn ForwardModel) -> SearchTree {
        self.normalization_policy.reset_bounds();
        let mut tree = SearchTree::with_initial_utility(state.clone(), self.initial_utility);

        let mut iterations = 0;
        while model.is_usable() && !state.is_terminal() {
            self.run_iteration(&mut tree, model);
            iterations += 1;
        }

        self.last_search = SearchSummary::from_tree(&tree, iterations);
        tree
    }

    pub fn run_iteration(&mut self, tree: &mut SearchTree, model: &mut dyn ForwardModel) {
        let root = tree.root();
        let leaf = select(
            tree,
            root,
            model,
            self.normalization_policy.as_ref(),
            self.exploration_constant,
            &mut self.rng,
        );
        let child = expand(tree, leaf, model, &mut self.rng);
        let trajectory = self.simulate(tree, child, model);

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "[TDTS] leaf={:?} expanded={:?} rollout_steps={} ticks_left={}",
                leaf,
                child,
                trajectory.len() - 1,
                model.ticks_left()
            );
        }

        self.backpropagate(tree, child, trajectory);
    }

    /// Plays a rollout from `start` and returns every state it went through,
    /// `start` included as the first element.
    fn simulate(
        &mut self,
        tree: &SearchTree,
        start: DecisionId,
        model: &mut dyn ForwardModel,
    ) -> Vec<GameResult> {
        let node = tree.decision(start);
        let mut trajectory = vec![match node.parent {
            Some(parent) => GameResult::from_transition(tree.action(parent).action, node.state.clone()),
            None => GameResult::from_score(node.state.score()),
        }];

        rollout(
            &node.state,
            model,
            &mut self.rng,
            self.max_rollout_depth,
            |action, state| trajectory.push(GameResult::from_transition(action, state.clone())),
        );
        trajectory
    }

    /// Two-pass Sarsa(λ) backup of `trajectory`, whose first element is the state of `leaf`.
    fn backpropagate(&mut self, tree: &mut SearchTree, leaf: DecisionId, mut trajectory: Vec<GameResult>) {
        let gamma = self.reward_discount;
        let trace_decay = self.eligibility_trace_decay * gamma;

        let Some(last) = trajectory.pop() else {
            return;
        };
        let mut next_score = last.score as f64;
        let mut next_value = 0.0;
        let mut cumulative_delta = 0.0;

        // un-memorized part: rollout states carry no value estimate
        while let Some(step) = trajectory.pop() {
            let score = step.score as f64;
            let delta = (next_score - score) + gamma * next_value;
            cumulative_delta = trace_decay * cumulative_delta + delta;
            self.normalization_policy.update_bound(cumulative_delta);
            next_score = score;
            next_value = 0.0;
        }

        // memorized part: the tree path from the leaf to the root
        let mut current = leaf;
        loop {
            tree.decision_mut(current).visit_count += 1;
            let Some(parent) = tree.decision(current).parent else {
                break;
            };
            let owner = tree.action(parent).parent;
            let owner_score = tree.decision(owner).state.score() as f64;

            let node = tree.action_mut(parent);
            node.visit_count += 1;
            let current_value = node.utility;
            let delta = (next_score - owner_score) + gamma * next_value - current_value;
            cumulative_delta = trace_decay * cumulative_delta + delta;
            node.utility = current_value + cumulative_delta;
            let updated = node.utility;

            tree.record_utility_bounds(parent, updated);
            self.normalization_policy.update_bound(cumulative_delta);

            next_score = owner_score;
            next_value = current_value;
            current = owner;
        }
    }
}

impl GamePlayingAgent for TdtsAgent {
    fn select_action(
        &mut self,
        state: &GameState,
        model: &mut dyn ForwardModel,
    ) -> Option<GameAction> {
        let tree = self.search(state, model);
        let root = tree.root();
        let chosen = self.best_child_policy.select_best(&tree, root, &mut self.rng);

        log::debug!(
            "[TDTS] iterations={} decisions={} actions={} depth={} chosen={:?}",
            self.last_search.iterations,
            self.last_search.decision_nodes,
            self.last_search.action_nodes,
            self.last_search.depth,
            chosen
        );
        chosen
    }

    fn configuration_summary(&self) -> String {
        let depth = match self.max_rollout_depth {
            Some(depth) => depth.to_string(),
            None => "unbounded".to_string(),
        };
        format!(
            "#TDTS Agent\nExploration constant: {:.6}\nReward discount (gamma): {}\nEligibility trace decay (lambda): {}\nInitial action utility: {}\nMax rollout depth: {}\nBest-child policy: {}\nNormalization policy: {}",
            self.exploration_constant,
            self.reward_discount,
            self.eligibility_trace_decay,
            self.initial_utility,
            depth,
            self.best_child_policy,
            self.normalization_policy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameModel;

    fn two_action_state(score: u64) -> GameState {
        // only RIGHT and DOWN move the single tile, neither merges
        GameState::new([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]], score)
    }

    fn agent(gamma: f64, lambda: f64) -> TdtsAgent {
        TdtsAgent::builder()
            .reward_discount(gamma)
            .eligibility_trace_decay(lambda)
            .seed(1)
            .build()
    }

    /// Root scored 100, one tree step without merge, then a rollout through 140 and 180.
    fn one_step_path() -> (SearchTree, DecisionId, Vec<GameResult>) {
        let mut tree = SearchTree::new(two_action_state(100));
        let right = tree.decision(tree.root()).child(GameAction::Right).unwrap();
        let mut model = GameModel::with_seed(10, 4);
        let leaf = tree.simulate_action(right, &mut model);
        assert_eq!(tree.decision(leaf).state.score(), 100);

        let trajectory = vec![
            GameResult::from_transition(GameAction::Right, tree.decision(leaf).state.clone()),
            GameResult::from_score(140),
            GameResult::from_score(180),
        ];
        (tree, leaf, trajectory)
    }

    #[test]
    fn test_undiscounted_trace_equals_total_score_increase() {
        let (mut tree, leaf, trajectory) = one_step_path();
        let mut agent = agent(1.0, 1.0);
        agent.backpropagate(&mut tree, leaf, trajectory);

        let right = tree.decision(leaf).parent.unwrap();
        let node = tree.action(right);
        assert_eq!(node.utility, 80.0);
        assert_eq!(node.visit_count, 1);
        assert_eq!((node.lower_bound(), node.upper_bound()), (80.0, 80.0));
        assert_eq!(tree.decision(tree.root()).visit_count, 1);
        assert_eq!(tree.decision(leaf).visit_count, 1);
    }

    #[test]
    fn test_discount_weights_later_rewards() {
        let (mut tree, leaf, trajectory) = one_step_path();
        let mut agent = agent(0.5, 1.0);
        agent.backpropagate(&mut tree, leaf, trajectory);

        // rewards 0, 40, 40 discounted by 1, 0.5, 0.25
        let right = tree.decision(leaf).parent.unwrap();
        assert_eq!(tree.action(right).utility, 30.0);
    }

    #[test]
    fn test_zero_trace_decay_keeps_only_immediate_reward() {
        let (mut tree, leaf, trajectory) = one_step_path();
        let mut agent = agent(1.0, 0.0);
        agent.backpropagate(&mut tree, leaf, trajectory);

        let right = tree.decision(leaf).parent.unwrap();
        assert_eq!(tree.action(right).utility, 0.0);
    }

    #[test]
    fn test_monte_carlo_return_on_every_level() {
        let mut tree = SearchTree::new(two_action_state(100));
        let first = tree.decision(tree.root()).child(GameAction::Right).unwrap();
        let mut model = GameModel::with_seed(10, 9);
        let middle = tree.simulate_action(first, &mut model);
        let second = tree.decision(middle).valid_children().next().unwrap();
        let leaf = tree.simulate_action(second, &mut model);

        let leaf_state = tree.decision(leaf).state.clone();
        let final_score = leaf_state.score() + 80;
        let trajectory = vec![
            GameResult::from_transition(tree.action(second).action, leaf_state.clone()),
            GameResult::from_score(leaf_state.score() + 40),
            GameResult::from_score(final_score),
        ];

        let mut agent = agent(1.0, 1.0);
        agent.backpropagate(&mut tree, leaf, trajectory);

        let middle_score = tree.decision(middle).state.score();
        let second_value = (final_score - middle_score) as f64;
        let first_value = (final_score - 100) as f64;
        assert_eq!(tree.action(second).utility, second_value);
        assert_eq!(tree.action(first).utility, first_value);

        // the upper node also saw the utility of the node two levels below it
        let low = second_value.min(first_value);
        let high = second_value.max(first_value);
        assert_eq!(tree.action(first).lower_bound(), low);
        assert_eq!(tree.action(first).upper_bound(), high);
    }

    #[test]
    fn test_rollout_depth_is_capped() {
        let mut agent = TdtsAgent::builder().max_rollout_depth(Some(3)).seed(2).build();
        let tree = SearchTree::new(two_action_state(0));
        let mut model = GameModel::with_seed(GameModel::UNLIMITED, 2);

        let trajectory = agent.simulate(&tree, tree.root(), &mut model);
        assert_eq!(trajectory.len(), 4);
        assert!(trajectory[0].preceding_action.is_none());
        assert!(trajectory[1..].iter().all(|step| step.preceding_action.is_some()));
    }

    #[test]
    fn test_unvisited_actions_keep_initial_utility() {
        let mut agent = TdtsAgent::builder().initial_utility(5.0).seed(8).build();
        let state = GameState::new(
            [[2, 4, 8, 16], [0, 2, 4, 8], [0, 0, 2, 4], [0, 0, 0, 2]],
            120,
        );
        let mut model = GameModel::with_seed(300, 8);
        let tree = agent.search(&state, &mut model);

        assert!(agent.last_search().iterations > 0);
        for id in tree.action_ids() {
            let node = tree.action(id);
            if node.visit_count == 0 {
                assert_eq!(node.utility, 5.0);
            }
        }
    }

    #[test]
    fn test_terminal_root_has_no_move() {
        let terminal = GameState::new(
            [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]],
            0,
        );
        let mut agent = agent(1.0, 1.0);
        let mut model = GameModel::with_seed(50, 1);
        assert_eq!(agent.select_action(&terminal, &mut model), None);
        assert_eq!(model.ticks_left(), 50);
    }

    #[test]
    fn test_seeded_search_is_reproducible() {
        let run = || {
            let mut agent = TdtsAgent::builder()
                .reward_discount(0.9)
                .eligibility_trace_decay(0.8)
                .seed(13)
                .build();
            let mut model = GameModel::with_seed(600, 13);
            let action = agent.select_action(&two_action_state(0), &mut model);
            (action, agent.last_search())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_configuration_summary() {
        let agent = TdtsAgent::builder()
            .reward_discount(0.9)
            .eligibility_trace_decay(0.5)
            .max_rollout_depth(Some(20))
            .build();
        let summary = agent.configuration_summary();
        assert!(summary.starts_with("#TDTS Agent"));
        assert!(summary.contains("Reward discount (gamma): 0.9"));
        assert!(summary.contains("Eligibility trace decay (lambda): 0.5"));
        assert!(summary.contains("Max rollout depth: 20"));
    }
}
