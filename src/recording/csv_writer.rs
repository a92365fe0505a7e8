//! CSV writer for experiment results.
//!
//! Format: experiment,game,score,steps,largest_tile,duration_ms
//!
//! Rows are appended, so several experiments can share one results file.

use crate::recording::game_record::{GameRecord, GameRow};
use crate::Result;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

pub struct CsvWriter {
    writer: csv::Writer<File>,
}

impl CsvWriter {
    /// Opens `path` for appending, writing the header only when the file is new.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let is_new = !path.exists() || fs::metadata(path)?.len() == 0;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);

        Ok(Self { writer })
    }

    pub fn write_game(&mut self, experiment: &str, record: &GameRecord) -> Result<()> {
        self.writer.serialize(record.to_row(experiment))?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_games(&mut self, experiment: &str, records: &[GameRecord]) -> Result<()> {
        for record in records {
            self.writer.serialize(record.to_row(experiment))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Load result rows back from a CSV file
pub fn load_rows<P: AsRef<Path>>(path: P) -> Result<Vec<GameRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameAction, GameState};
    use std::time::Duration;
    use tempfile::tempdir;

    fn finished_game(index: usize, score: u64) -> GameRecord {
        let mut record = GameRecord::new(index, GameState::empty());
        record.record_move(
            GameAction::Up,
            GameState::new([[8, 2, 0, 0], [0; 4], [0; 4], [0; 4]], score),
        );
        record.duration = Duration::from_millis(40);
        record
    }

    #[test]
    fn test_rows_append_under_a_single_header() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("results").join("games.csv");

        {
            let mut writer = CsvWriter::open(&path)?;
            writer.write_games("uct", &[finished_game(0, 120), finished_game(1, 96)])?;
        }
        {
            let mut writer = CsvWriter::open(&path)?;
            writer.write_game("tdts", &finished_game(0, 300))?;
        }

        let content = fs::read_to_string(&path)?;
        assert_eq!(content.matches("experiment,game").count(), 1);

        let rows = load_rows(&path)?;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].experiment, "uct");
        assert_eq!(rows[1].score, 96);
        assert_eq!(rows[2].experiment, "tdts");
        assert_eq!(rows[2].game, 1);
        assert_eq!(rows[2].largest_tile, 8);
        Ok(())
    }
}
