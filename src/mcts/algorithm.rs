//! UCT agent: Monte Carlo Tree Search with UCB1 selection and running-average backups.
//!
//! Each call to [`GamePlayingAgent::select_action`] builds a fresh tree from the
//! given state and keeps iterating select → expand → simulate → backpropagate
//! until the forward model runs out of ticks. The move is then chosen by the
//! configured [`BestChildPolicy`].

use crate::game::{ForwardModel, GameAction, GameState};
use crate::mcts::best_child::BestChildPolicy;
use crate::mcts::hyperparameters::SearchHyperparameters;
use crate::mcts::mcts_result::{GameResult, SearchSummary};
use crate::mcts::node::{ActionId, DecisionId, SearchTree};
use crate::mcts::normalization::NormalizationPolicy;
use crate::mcts::selection::{expand, rollout, select};
use crate::strategy::GamePlayingAgent;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct MctsAgent {
    exploration_constant: f64,
    best_child_policy: Box<dyn BestChildPolicy>,
    normalization_policy: Box<dyn NormalizationPolicy>,
    rng: StdRng,
    last_search: SearchSummary,
}

/// Builder for [`MctsAgent`]; unset fields fall back to [`SearchHyperparameters::default`].
pub struct MctsAgentBuilder {
    exploration_constant: f64,
    best_child_policy: Option<Box<dyn BestChildPolicy>>,
    normalization_policy: Option<Box<dyn NormalizationPolicy>>,
    seed: Option<u64>,
}

impl MctsAgentBuilder {
    pub fn exploration_constant(mut self, value: f64) -> Self {
        self.exploration_constant = value;
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

    /// Takes the exploration constant and both policies from `params`.
    pub fn hyperparameters(self, params: &SearchHyperparameters) -> Self {
        self.exploration_constant(params.exploration_constant)
            .best_child_policy(params.best_child.build())
            .normalization_policy(params.normalization.build())
    }

    pub fn build(self) -> MctsAgent {
        let defaults = SearchHyperparameters::default();
        MctsAgent {
            exploration_constant: self.exploration_constant,
            best_child_policy: self
                .best_child_policy
                .unwrap_or_else(|| defaults.best_child.build()),
            normalization_policy: self
                .normalization_policy
                .unwrap_or_else(|| defaults.normalization.build()),
            rng: match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            },
            last_search: SearchSummary::default(),
        }
    }
}

impl MctsAgent {
    pub fn builder() -> MctsAgentBuilder {
        MctsAgentBuilder {
            exploration_constant: SearchHyperparameters::default().exploration_constant,
            best_child_policy: None,
            normalization_policy: None,
            seed: None,
        }
    }

    pub fn exploration_constant(&self) -> f64 {
        self.exploration_constant
    }

    /// Shape of the tree built by the most recent search.
    pub fn last_search(&self) -> SearchSummary {
        self.last_search
    }

    /// Searches from `state` until `model` is exhausted and returns the tree.
    ///
    /// A terminal `state` yields a tree holding only its root.
    pub fn search(&mut self, state: &GameState, model: &mut dyn ForwardModel) -> SearchTree {
        self.normalization_policy.reset_bounds();
        let mut tree = SearchTree::new(state.clone());

        let mut iterations = 0;
        // a terminal root never consumes ticks, so the loop would not end
        while model.is_usable() && !state.is_terminal() {
            self.run_iteration(&mut tree, model);
            iterations += 1;
        }

        self.last_search = SearchSummary::from_tree(&tree, iterations);
        tree
    }

    /// Runs one select → expand → simulate → backpropagate pass over `tree`.
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
        let result = self.simulate(tree, child, model);

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "[UCT] leaf={:?} expanded={:?} rollout_score={} ticks_left={}",
                leaf,
                child,
                result.score,
                model.ticks_left()
            );
        }

        self.backpropagate(tree, child, &result);
    }

    fn simulate(
        &mut self,
        tree: &SearchTree,
        start: DecisionId,
        model: &mut dyn ForwardModel,
    ) -> GameResult {
        let end = rollout(&tree.decision(start).state, model, &mut self.rng, None, |_, _| {});
        GameResult::from_score(end.score())
    }

    /// Adds the rollout score to every node on the path from `leaf` to the root.
    fn backpropagate(&mut self, tree: &mut SearchTree, leaf: DecisionId, result: &GameResult) {
        let score = result.score as f64;
        self.normalization_policy.update_bound(score);

        let mut current = leaf;
        loop {
            tree.decision_mut(current).visit_count += 1;
            let Some(parent) = tree.decision(current).parent else {
                break;
            };
            update_average(tree, parent, score);
            current = tree.action(parent).parent;
        }
    }
}

/// Running-average update of one action node.
fn update_average(tree: &mut SearchTree, id: ActionId, score: f64) {
    let node = tree.action_mut(id);
    node.visit_count += 1;
    node.total_utility += score;
    node.utility = node.total_utility / f64::from(node.visit_count);
    let utility = node.utility;
    tree.record_utility_bounds(id, utility);
}

impl GamePlayingAgent for MctsAgent {
    fn select_action(
        &mut self,
        state: &GameState,
        model: &mut dyn ForwardModel,
    ) -> Option<GameAction> {
        let tree = self.search(state, model);
        let root = tree.root();
        let chosen = self.best_child_policy.select_best(&tree, root, &mut self.rng);

        log::debug!(
            "[UCT] iterations={} decisions={} actions={} depth={} chosen={:?}",
            self.last_search.iterations,
            self.last_search.decision_nodes,
            self.last_search.action_nodes,
            self.last_search.depth,
            chosen
        );
        chosen
    }

    fn configuration_summary(&self) -> String {
        format!(
            "#MCTS Agent\nExploration constant: {:.6}\nBest-child policy: {}\nNormalization policy: {}",
            self.exploration_constant, self.best_child_policy, self.normalization_policy
        )
    }
}
