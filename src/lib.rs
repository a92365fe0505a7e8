//! # Tree Search 2048
//!
//! Game-playing agents for 2048 built on Monte Carlo Tree Search.
//!
//! ## Features
//!
//! - **Game Engine**: 2048 rules behind a tick-budgeted forward model
//! - **UCT Agent**: UCB1 tree policy with running-average backups
//! - **Sarsa-UCT(λ) Agent**: temporal-difference backups with eligibility traces
//! - **Experiments**: batches of full games with statistics and run logs
//!
//! ## Usage
//!
//! ```rust
//! use tree_search_2048::{
//!     game::{ForwardModel, GameModel},
//!     mcts::MctsAgent,
//!     strategy::GamePlayingAgent,
//! };
//!
//! let mut game = GameModel::with_seed(GameModel::UNLIMITED, 1);
//! let state = game.generate_initial_state();
//!
//! let mut agent = MctsAgent::builder().seed(1).build();
//! let action = agent.select_action(&state, &mut GameModel::with_seed(200, 2));
//! assert!(action.is_some());
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// 2048 rules and forward model
pub mod game;

/// Search trees, policies and the tree-search agents
pub mod mcts;

/// Agent interface and the random baseline
pub mod strategy;

/// Batch evaluation of agents
pub mod experiment;

/// Run logs and CSV results
pub mod recording;

/// Logger setup shared by the binaries
pub mod logging;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use game::{ForwardModel, GameAction, GameModel, GameState, ModelError};
pub use mcts::{MctsAgent, SearchHyperparameters, TdtsAgent};
pub use strategy::{GamePlayingAgent, RandomAgent};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the library
#[derive(Debug, thiserror::Error)]
pub enum TreeSearchError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Experiment error: {0}")]
    Experiment(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TreeSearchError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
