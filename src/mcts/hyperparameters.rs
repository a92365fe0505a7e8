//! Search hyperparameters
//!
//! Every tunable knob of the UCT and Sarsa-UCT(λ) agents lives here so that
//! experiments can be described by a JSON file and overridden from the CLI.

use crate::mcts::best_child::{BestChildPolicy, MaxUtilityPolicy, MostVisitPolicy};
use crate::mcts::normalization::{NoNormalization, NormalizationPolicy, SpaceLocalNormalization};
use crate::{Result, TreeSearchError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Policy used to commit to a move once the budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BestChildKind {
    /// Robust child
    #[default]
    MostVisit,
    /// Max child
    MaxUtility,
}

impl BestChildKind {
    pub fn build(self) -> Box<dyn BestChildPolicy> {
        match self {
            BestChildKind::MostVisit => Box::new(MostVisitPolicy),
            BestChildKind::MaxUtility => Box::new(MaxUtilityPolicy),
        }
    }
}

/// Rescaling applied to utilities before UCB1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizationKind {
    #[default]
    SpaceLocal,
    /// Raw utilities
    #[serde(rename = "none")]
    #[value(name = "none")]
    Disabled,
}

impl NormalizationKind {
    pub fn build(self) -> Box<dyn NormalizationPolicy> {
        match self {
            NormalizationKind::SpaceLocal => Box::new(SpaceLocalNormalization::new()),
            NormalizationKind::Disabled => Box::new(NoNormalization),
        }
    }
}

/// Tree search hyperparameters configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchHyperparameters {
    /// UCB1 exploration constant C
    /// Default: √2
    pub exploration_constant: f64,

    pub best_child: BestChildKind,

    pub normalization: NormalizationKind,

    // ========== Sarsa-UCT(λ) only ==========
    /// Reward discount γ, in [0, 1]
    /// Default: 1.0
    pub reward_discount: f64,

    /// Eligibility trace decay λ, in [0, 1]
    /// Default: 1.0
    pub eligibility_trace_decay: f64,

    /// Utility given to freshly created action nodes
    /// Default: 0.0
    pub initial_action_utility: f64,

    /// Maximum number of actions played by one rollout, unbounded when absent
    pub max_rollout_depth: Option<usize>,
}

impl Default for SearchHyperparameters {
    fn default() -> Self {
        Self {
            exploration_constant: std::f64::consts::SQRT_2,
            best_child: BestChildKind::MostVisit,
            normalization: NormalizationKind::SpaceLocal,
            reward_discount: 1.0,
            eligibility_trace_decay: 1.0,
            initial_action_utility: 0.0,
            max_rollout_depth: None,
        }
    }
}

impl SearchHyperparameters {
    /// Loads hyperparameters from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let params: Self = serde_json::from_str(&content)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(TreeSearchError::Config(format!(
                "exploration constant must be a non-negative number, got {}",
                self.exploration_constant
            )));
        }
        for (name, value) in [
            ("reward discount", self.reward_discount),
            ("eligibility trace decay", self.eligibility_trace_decay),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TreeSearchError::Config(format!(
                    "{} must lie in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if !self.initial_action_utility.is_finite() {
            return Err(TreeSearchError::Config(
                "initial action utility must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Single-line summary logged before an experiment.
    pub fn to_config_string(&self) -> String {
        let depth = match self.max_rollout_depth {
            Some(depth) => depth.to_string(),
            None => "unbounded".to_string(),
        };
        format!(
            "c={:.4} best_child={:?} normalization={:?} gamma={} lambda={} init_utility={} max_depth={}",
            self.exploration_constant,
            self.best_child,
            self.normalization,
            self.reward_discount,
            self.eligibility_trace_decay,
            self.initial_action_utility,
            depth
        )
    }
}
