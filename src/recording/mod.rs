//! Recording of experiment results.
//!
//! # Components
//!
//! - `game_record`: moves and outcome of one game
//! - `game_recorder`: plain-text run logs, one directory per experiment
//! - `csv_writer`: one CSV row per game, appended across experiments

pub mod csv_writer;
pub mod game_record;
pub mod game_recorder;

pub use csv_writer::{load_rows, CsvWriter};
pub use game_record::{GameRecord, GameRow, MoveRecord};
pub use game_recorder::GameRecorder;
