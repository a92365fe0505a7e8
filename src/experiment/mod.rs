//! Batch evaluation of agents over many full games.

pub mod session;
pub mod stats;
pub mod sweep;

pub use session::{play_game, run_experiment, ExperimentConfig, ExperimentReport};
pub use stats::ExperimentStats;
pub use sweep::{run_sweep, SearchAgentKind, SweepConfig, SweepOutcome, SweepPoint};
