//! Plain-text run logs of an experiment.
//!
//! Every experiment gets its own directory `<base>/<name>-<yyyyMMdd_HHmmss>/`
//! holding one file per game and a `summary.txt`. Each file starts with the
//! experiment header so it can be read on its own.

use crate::experiment::stats::ExperimentStats;
use crate::recording::game_record::GameRecord;
use crate::Result;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "summary.txt";

pub struct GameRecorder {
    directory: PathBuf,
    header: String,
}

impl GameRecorder {
    /// Creates the run directory for experiment `name` under `base_dir`.
    ///
    /// `header` lines are written at the top of every file, followed by the
    /// creation time.
    pub fn create<P: AsRef<Path>>(base_dir: P, name: &str, header: &[String]) -> Result<Self> {
        let now = Local::now();
        let directory = base_dir
            .as_ref()
            .join(format!("{}-{}", name, now.format("%Y%m%d_%H%M%S")));
        fs::create_dir_all(&directory)?;

        let text = format!("{}\n{}\n\n", header.join("\n"), now.to_rfc3339());

        log::info!("Writing run logs to {}", directory.display());
        Ok(Self {
            directory,
            header: text,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File a game is written to, numbered from one.
    pub fn game_path(&self, index: usize) -> PathBuf {
        self.directory.join(format!("game-{:03}.txt", index + 1))
    }

    pub fn write_game(&self, record: &GameRecord) -> Result<PathBuf> {
        let mut text = self.header.clone();
        text.push_str(&format!("{}\n", record.initial_state));
        for step in &record.moves {
            text.push_str(&format!("Action: {}\n{}\n", step.action, step.state));
        }
        text.push_str(&format!(
            "Score: {}\nStep: {}\nDuration: {} ms\nMax Tile: {}\n",
            record.score(),
            record.steps(),
            record.duration.as_millis(),
            record.largest_tile()
        ));

        let path = self.game_path(record.index);
        fs::write(&path, text)?;
        Ok(path)
    }

    pub fn write_summary(&self, records: &[GameRecord], stats: &ExperimentStats) -> Result<PathBuf> {
        let mut text = self.header.clone();
        for record in records {
            text.push_str(&format!(
                "Game[{}] Final Score: {} ({} ms)\n",
                record.index + 1,
                record.score(),
                record.duration.as_millis()
            ));
        }
        text.push_str(&stats.to_string());

        let path = self.directory.join(SUMMARY_FILE);
        fs::write(&path, text)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameAction, GameState};
    use std::time::Duration;
    use tempfile::tempdir;

    fn sample_game() -> GameRecord {
        let mut record = GameRecord::new(0, GameState::new([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]], 0));
        record.record_move(
            GameAction::Left,
            GameState::new([[4, 0, 0, 0], [0; 4], [0, 0, 2, 0], [0; 4]], 4),
        );
        record.duration = Duration::from_millis(12);
        record
    }

    #[test]
    fn test_run_directory_layout() -> Result<()> {
        let dir = tempdir()?;
        let header = vec!["Average score of UCT agent".to_string(), "Number of games: 1".to_string()];
        let recorder = GameRecorder::create(dir.path(), "mcts", &header)?;

        let name = recorder
            .directory()
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        assert!(name.starts_with("mcts-"));
        // yyyyMMdd_HHmmss
        assert_eq!(name.len(), "mcts-".len() + 15);

        let record = sample_game();
        let game_path = recorder.write_game(&record)?;
        assert!(game_path.ends_with("game-001.txt"));

        let content = fs::read_to_string(&game_path)?;
        assert!(content.starts_with("Average score of UCT agent\nNumber of games: 1\n"));
        assert!(content.contains("Action: LEFT\nScore: 4\n"));
        assert!(content.contains("Step: 1"));
        assert!(content.contains("Duration: 12 ms"));
        assert!(content.contains("Max Tile: 4"));

        let stats = ExperimentStats::from_records(&[record.clone()]);
        let summary_path = recorder.write_summary(&[record], &stats)?;
        let summary = fs::read_to_string(summary_path)?;
        assert!(summary.contains("Game[1] Final Score: 4 (12 ms)"));
        assert!(summary.contains("Average Score: 4"));
        Ok(())
    }
}
