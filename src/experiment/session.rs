//! Experiment runner
//!
//! A game is played against an outer model with an unlimited budget. For
//! every move the agent receives a fresh model holding `ticks_per_move`
//! ticks, which bounds how much it may search. Games are independent, so
//! they can be spread over the rayon pool.

use crate::experiment::stats::ExperimentStats;
use crate::game::{ForwardModel, GameModel};
use crate::recording::csv_writer::CsvWriter;
use crate::recording::game_record::GameRecord;
use crate::recording::game_recorder::GameRecorder;
use crate::strategy::GamePlayingAgent;
use crate::{Result, TreeSearchError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Short name used for the run directory and CSV rows
    pub name: String,
    /// First line of every run log
    pub title: String,
    pub games: usize,
    pub ticks_per_move: u64,
    pub seed: Option<u64>,
    pub parallel: bool,
    pub log_dir: Option<PathBuf>,
    pub csv_path: Option<PathBuf>,
}

impl ExperimentConfig {
    pub fn new(name: &str, title: &str, games: usize, ticks_per_move: u64) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            games,
            ticks_per_move,
            seed: None,
            parallel: false,
            log_dir: None,
            csv_path: None,
        }
    }
}

#[derive(Debug)]
pub struct ExperimentReport {
    pub records: Vec<GameRecord>,
    pub stats: ExperimentStats,
    /// Directory holding the run logs, when they were written
    pub run_directory: Option<PathBuf>,
}

/// Seed of game `index` derived from the experiment seed.
pub fn game_seed(seed: u64, index: usize) -> u64 {
    StdRng::seed_from_u64(seed.wrapping_add(index as u64)).random()
}

/// Plays one full game with `agent` and records every move.
///
/// `seed` fixes the tile spawns of the outer model and of every per-move model.
pub fn play_game(
    agent: &mut dyn GamePlayingAgent,
    index: usize,
    ticks_per_move: u64,
    seed: Option<u64>,
) -> Result<GameRecord> {
    let mut seeder = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut game = GameModel::with_seed(GameModel::UNLIMITED, seeder.random());

    let mut state = game.generate_initial_state();
    let mut record = GameRecord::new(index, state.clone());
    let start = Instant::now();

    while !state.is_terminal() {
        let mut thinking = GameModel::with_seed(ticks_per_move, seeder.random());
        let Some(action) = agent.select_action(&state, &mut thinking) else {
            break;
        };
        state = game.apply_action(&state, action)?;
        record.record_move(action, state.clone());

        log::trace!("Game[{}] step {} {} -> score {}", index + 1, record.steps(), action, state.score());
    }

    record.duration = start.elapsed();
    Ok(record)
}

/// Runs `config.games` games, each with a fresh agent from `make_agent`.
///
/// `make_agent` receives the seed the agent should use, if any. Run logs and
/// CSV rows are written once every game has finished.
pub fn run_experiment<F>(config: &ExperimentConfig, make_agent: F) -> Result<ExperimentReport>
where
    F: Fn(Option<u64>) -> Box<dyn GamePlayingAgent> + Sync,
{
    if config.games == 0 {
        return Err(TreeSearchError::Experiment(
            "an experiment needs at least one game".to_string(),
        ));
    }

    let header = vec![
        config.title.clone(),
        format!("Number of games: {}", config.games),
        format!("Number of time steps: {}", config.ticks_per_move),
        make_agent(None).configuration_summary(),
    ];
    let recorder = match &config.log_dir {
        Some(dir) => Some(GameRecorder::create(dir, &config.name, &header)?),
        None => None,
    };

    log::info!(
        "Running {} game(s) of '{}' with {} ticks per move{}",
        config.games,
        config.name,
        config.ticks_per_move,
        if config.parallel { " in parallel" } else { "" }
    );

    let play = |index: usize| -> Result<GameRecord> {
        let seed = config.seed.map(|seed| game_seed(seed, index));
        let mut agent = make_agent(seed);
        let record = play_game(agent.as_mut(), index, config.ticks_per_move, seed)?;
        log::info!(
            "Game[{}] Final Score: {} ({} ms)",
            index + 1,
            record.score(),
            record.duration.as_millis()
        );
        Ok(record)
    };

    let records: Vec<GameRecord> = if config.parallel {
        (0..config.games).into_par_iter().map(play).collect::<Result<_>>()?
    } else {
        (0..config.games).map(play).collect::<Result<_>>()?
    };

    let stats = ExperimentStats::from_records(&records);
    log::info!(
        "Average Score: {:.1} (median {:.1}, std dev {:.1})",
        stats.mean_score,
        stats.median_score,
        stats.score_std_dev
    );

    if let Some(recorder) = &recorder {
        for record in &records {
            recorder.write_game(record)?;
        }
        recorder.write_summary(&records, &stats)?;
    }
    if let Some(path) = &config.csv_path {
        CsvWriter::open(path)?.write_games(&config.name, &records)?;
    }

    Ok(ExperimentReport {
        records,
        stats,
        run_directory: recorder.map(|recorder| recorder.directory().to_path_buf()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcts::MctsAgent;
    use crate::strategy::RandomAgent;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn random_agent(seed: Option<u64>) -> Box<dyn GamePlayingAgent> {
        match seed {
            Some(seed) => Box::new(RandomAgent::with_seed(seed)),
            None => Box::new(RandomAgent::new()),
        }
    }

    #[test]
    fn test_random_game_runs_to_the_end() {
        let mut agent = RandomAgent::with_seed(3);
        let record = play_game(&mut agent, 0, 1, Some(3)).unwrap();

        assert!(record.final_state().is_terminal());
        assert!(record.steps() > 0);
        assert_eq!(record.initial_state.empty_cells().len(), 14);
    }

    #[test]
    fn test_seeded_games_are_reproducible() {
        let play = || {
            let mut agent = MctsAgent::builder().seed(9).build();
            let record = play_game(&mut agent, 0, 20, Some(9)).unwrap();
            (record.score(), record.steps(), record.final_state().clone())
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut config = ExperimentConfig::new("random", "Average score of random agent", 4, 1);
        config.seed = Some(17);

        let sequential = run_experiment(&config, random_agent).unwrap();
        config.parallel = true;
        let parallel = run_experiment(&config, random_agent).unwrap();

        let scores = |report: &ExperimentReport| -> Vec<u64> {
            report.records.iter().map(GameRecord::score).collect()
        };
        assert_eq!(scores(&sequential), scores(&parallel));
        assert_eq!(sequential.stats.games, 4);
        assert!(sequential.run_directory.is_none());
    }

    #[test]
    fn test_experiment_writes_logs_and_csv() {
        let dir = tempdir().unwrap();
        let mut config = ExperimentConfig::new("random", "Average score of random agent", 2, 1);
        config.seed = Some(5);
        config.log_dir = Some(dir.path().join("log"));
        config.csv_path = Some(dir.path().join("results.csv"));

        let report = run_experiment(&config, random_agent).unwrap();
        let run_dir = report.run_directory.unwrap();
        assert!(run_dir.join("game-001.txt").exists());
        assert!(run_dir.join("game-002.txt").exists());
        assert!(run_dir.join("summary.txt").exists());

        let rows = crate::recording::csv_writer::load_rows(dir.path().join("results.csv")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].score, report.records[0].score());
    }

    #[test]
    fn test_zero_games_is_rejected() {
        let config = ExperimentConfig::new("random", "empty", 0, 1);
        assert_matches!(
            run_experiment(&config, random_agent),
            Err(TreeSearchError::Experiment(_))
        );
    }
}
