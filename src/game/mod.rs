pub mod action;
pub mod forward_model;
pub mod game_state;
pub mod slide;

pub use action::GameAction;
pub use forward_model::{ForwardModel, GameModel, ModelError};
pub use game_state::GameState;
