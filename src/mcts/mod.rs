pub mod algorithm;
pub mod best_child;
pub mod hyperparameters;
pub mod mcts_result;
pub mod node;
pub mod normalization;
pub mod selection;
pub mod tdts;

pub use algorithm::{MctsAgent, MctsAgentBuilder};
pub use best_child::{BestChildPolicy, MaxUtilityPolicy, MostVisitPolicy};
pub use hyperparameters::{BestChildKind, NormalizationKind, SearchHyperparameters};
pub use normalization::{NoNormalization, NormalizationPolicy, SpaceLocalNormalization};
pub use tdts::{TdtsAgent, TdtsAgentBuilder};
