//! Normalization of action utilities before they enter UCB1.
//!
//! Raw 2048 scores grow without bound, so the exploitation term of UCB1 has
//! to be rescaled to stay comparable with the exploration bonus.
//! Space-Local Value Normalization (Vodopivec et al.) rescales each node by
//! the spread of values that passed through it, falling back to the spread
//! observed over the whole search.

use crate::mcts::node::ActionNode;
use std::fmt;

/// Maps an action node's utility to the exploitation term of UCB1.
///
/// Implementations own whatever global state they need and are reset at the
/// start of every search.
pub trait NormalizationPolicy: fmt::Display + Send {
    fn normalize(&self, node: &ActionNode) -> f64;

    /// Feeds one backed-up value into the global bounds.
    fn update_bound(&mut self, value: f64);

    fn reset_bounds(&mut self);
}

/// Uses the raw utility unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNormalization;

impl NormalizationPolicy for NoNormalization {
    fn normalize(&self, node: &ActionNode) -> f64 {
        node.utility
    }

    fn update_bound(&mut self, _value: f64) {}

    fn reset_bounds(&mut self) {}
}

impl fmt::Display for NoNormalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("No Normalization")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpaceLocalNormalization {
    global_lower_bound: f64,
    global_upper_bound: f64,
}

impl SpaceLocalNormalization {
    /// Returned when neither local nor global bounds span a range yet.
    pub const MIDPOINT: f64 = 0.5;

    pub fn new() -> Self {
        Self {
            global_lower_bound: f64::INFINITY,
            global_upper_bound: f64::NEG_INFINITY,
        }
    }

    pub fn global_bounds(&self) -> (f64, f64) {
        (self.global_lower_bound, self.global_upper_bound)
    }
}

impl Default for SpaceLocalNormalization {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizationPolicy for SpaceLocalNormalization {
    fn normalize(&self, node: &ActionNode) -> f64 {
        let lower = node.lower_bound();
        let upper = node.upper_bound();

        if lower < upper {
            (node.utility - lower) / (upper - lower)
        } else if self.global_lower_bound < self.global_upper_bound {
            (node.utility - self.global_lower_bound)
                / (self.global_upper_bound - self.global_lower_bound)
        } else {
            Self::MIDPOINT
        }
    }

    fn update_bound(&mut self, value: f64) {
        self.global_lower_bound = self.global_lower_bound.min(value);
        self.global_upper_bound = self.global_upper_bound.max(value);
    }

    fn reset_bounds(&mut self) {
        self.global_lower_bound = f64::INFINITY;
        self.global_upper_bound = f64::NEG_INFINITY;
    }
}

impl fmt::Display for SpaceLocalNormalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Space-Local Value Normalization")
    }
}
