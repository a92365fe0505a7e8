//! Parameter sweeps
//!
//! A sweep runs one experiment per point of the grid
//! `agent × ticks × C × best child × normalization`. Every point appends its
//! games to the same CSV file, labelled with the point in the `experiment`
//! column, so a whole study ends up in a single table.

use crate::experiment::session::{run_experiment, ExperimentConfig};
use crate::experiment::stats::ExperimentStats;
use crate::mcts::{BestChildKind, MctsAgent, NormalizationKind, SearchHyperparameters, TdtsAgent};
use crate::strategy::GamePlayingAgent;
use crate::{Result, TreeSearchError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tree-search agent evaluated at a sweep point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SearchAgentKind {
    /// UCT
    #[default]
    Mcts,
    /// Sarsa-UCT(λ)
    Tdts,
}

impl SearchAgentKind {
    pub fn name(self) -> &'static str {
        match self {
            SearchAgentKind::Mcts => "mcts",
            SearchAgentKind::Tdts => "tdts",
        }
    }

    /// Builds an agent of this kind configured by `params`.
    pub fn build(self, params: &SearchHyperparameters, seed: Option<u64>) -> Box<dyn GamePlayingAgent> {
        match self {
            SearchAgentKind::Mcts => {
                let mut builder = MctsAgent::builder().hyperparameters(params);
                if let Some(seed) = seed {
                    builder = builder.seed(seed);
                }
                Box::new(builder.build())
            }
            SearchAgentKind::Tdts => {
                let mut builder = TdtsAgent::builder().hyperparameters(params);
                if let Some(seed) = seed {
                    builder = builder.seed(seed);
                }
                Box::new(builder.build())
            }
        }
    }
}

/// Values swept on each axis. Fields not swept come from `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub agents: Vec<SearchAgentKind>,
    pub ticks: Vec<u64>,
    pub exploration_constants: Vec<f64>,
    pub best_child: Vec<BestChildKind>,
    pub normalization: Vec<NormalizationKind>,
    pub base: SearchHyperparameters,
}

impl Default for SweepConfig {
    /// Budget study: both agents at √2 over the usual tick budgets.
    fn default() -> Self {
        Self {
            agents: vec![SearchAgentKind::Mcts, SearchAgentKind::Tdts],
            ticks: vec![100, 500, 1_000, 2_500, 5_000, 7_500, 10_000, 12_500, 15_000],
            exploration_constants: vec![std::f64::consts::SQRT_2],
            best_child: vec![BestChildKind::MostVisit],
            normalization: vec![NormalizationKind::SpaceLocal],
            base: SearchHyperparameters::default(),
        }
    }
}

/// One configuration of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub agent: SearchAgentKind,
    pub ticks: u64,
    pub params: SearchHyperparameters,
}

impl SweepPoint {
    /// Name written to the CSV `experiment` column and used for the run directory,
    /// e.g. `mcts-t1000-c1.4142-most-visit-space-local`.
    pub fn label(&self) -> String {
        format!(
            "{}-t{}-c{:.4}-{}-{}",
            self.agent.name(),
            self.ticks,
            self.params.exploration_constant,
            best_child_name(self.params.best_child),
            normalization_name(self.params.normalization)
        )
    }
}

fn best_child_name(kind: BestChildKind) -> &'static str {
    match kind {
        BestChildKind::MostVisit => "most-visit",
        BestChildKind::MaxUtility => "max-utility",
    }
}

fn normalization_name(kind: NormalizationKind) -> &'static str {
    match kind {
        NormalizationKind::SpaceLocal => "space-local",
        NormalizationKind::Disabled => "none",
    }
}

impl SweepConfig {
    /// Loads a sweep from a JSON file. Missing axes keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let sweep: Self = serde_json::from_str(&content)?;
        Ok(sweep)
    }

    /// Every point of the grid, ticks varying slowest after the agent and
    /// normalization fastest.
    pub fn grid(&self) -> Vec<SweepPoint> {
        let mut points = Vec::new();
        for &agent in &self.agents {
            for &ticks in &self.ticks {
                for &exploration_constant in &self.exploration_constants {
                    for &best_child in &self.best_child {
                        for &normalization in &self.normalization {
                            points.push(SweepPoint {
                                agent,
                                ticks,
                                params: SearchHyperparameters {
                                    exploration_constant,
                                    best_child,
                                    normalization,
                                    ..self.base.clone()
                                },
                            });
                        }
                    }
                }
            }
        }
        points
    }

    /// Rejects empty axes and any point whose hyperparameters are invalid.
    pub fn validate(&self) -> Result<()> {
        for (axis, len) in [
            ("agents", self.agents.len()),
            ("ticks", self.ticks.len()),
            ("exploration_constants", self.exploration_constants.len()),
            ("best_child", self.best_child.len()),
            ("normalization", self.normalization.len()),
        ] {
            if len == 0 {
                return Err(TreeSearchError::Config(format!(
                    "sweep axis '{}' has no value",
                    axis
                )));
            }
        }
        for point in self.grid() {
            point.params.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct SweepOutcome {
    pub point: SweepPoint,
    pub stats: ExperimentStats,
    pub run_directory: Option<PathBuf>,
}

/// Runs one experiment per grid point.
///
/// `template` supplies the number of games, the seed, parallelism and the
/// output locations shared by every point. Its name and tick budget are
/// replaced by those of each point. With a seed every point plays the same
/// sequence of tile spawns.
pub fn run_sweep(sweep: &SweepConfig, template: &ExperimentConfig) -> Result<Vec<SweepOutcome>> {
    sweep.validate()?;
    let points = sweep.grid();
    let total = points.len();
    log::info!(
        "Sweeping {} configuration(s) of {} game(s) each",
        total,
        template.games
    );

    let mut outcomes = Vec::with_capacity(total);
    for (number, point) in points.into_iter().enumerate() {
        let label = point.label();
        log::info!("[{}/{}] {}", number + 1, total, label);

        let mut config = template.clone();
        config.name = label.clone();
        config.title = format!("{} ({})", template.title, label);
        config.ticks_per_move = point.ticks;

        let report = run_experiment(&config, |seed| point.agent.build(&point.params, seed))?;
        outcomes.push(SweepOutcome {
            point,
            stats: report.stats,
            run_directory: report.run_directory,
        });
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::csv_writer::load_rows;
    use assert_matches::assert_matches;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn small_sweep() -> SweepConfig {
        SweepConfig {
            agents: vec![SearchAgentKind::Mcts],
            ticks: vec![4, 8],
            exploration_constants: vec![0.5, 1.0],
            best_child: vec![BestChildKind::MostVisit],
            normalization: vec![NormalizationKind::SpaceLocal],
            base: SearchHyperparameters::default(),
        }
    }

    #[test]
    fn test_grid_covers_every_combination() {
        let mut sweep = small_sweep();
        sweep.agents.push(SearchAgentKind::Tdts);
        sweep.best_child.push(BestChildKind::MaxUtility);

        let grid = sweep.grid();
        assert_eq!(grid.len(), 2 * 2 * 2 * 2);
        assert_eq!(grid[0].label(), "mcts-t4-c0.5000-most-visit-space-local");
        assert_eq!(grid[1].label(), "mcts-t4-c0.5000-max-utility-space-local");
        assert_eq!(grid[15].label(), "tdts-t8-c1.0000-max-utility-space-local");
    }

    #[test]
    fn test_sweep_appends_one_row_group_per_point() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("sweep.csv");
        let mut template = ExperimentConfig::new("sweep", "Average score", 2, 0);
        template.seed = Some(21);
        template.csv_path = Some(csv_path.clone());

        let sweep = small_sweep();
        let outcomes = run_sweep(&sweep, &template).unwrap();
        assert_eq!(outcomes.len(), 4);

        let rows = load_rows(&csv_path).unwrap();
        assert_eq!(rows.len(), 4 * 2);

        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for row in &rows {
            groups.entry(row.experiment.clone()).or_default().push(row.game);
        }
        assert_eq!(groups.len(), 4);
        for outcome in &outcomes {
            assert_eq!(groups[&outcome.point.label()], vec![1, 2]);
            assert_eq!(outcome.stats.games, 2);
            assert!(outcome.run_directory.is_none());
        }

        // rows of one point are contiguous and follow grid order
        let order: Vec<&str> = rows.iter().step_by(2).map(|row| row.experiment.as_str()).collect();
        let labels: Vec<String> = sweep.grid().iter().map(SweepPoint::label).collect();
        assert_eq!(order, labels);
    }

    #[test]
    fn test_empty_axis_is_rejected() {
        let sweep = SweepConfig {
            ticks: Vec::new(),
            ..small_sweep()
        };
        let template = ExperimentConfig::new("sweep", "Average score", 1, 0);
        assert_matches!(run_sweep(&sweep, &template), Err(TreeSearchError::Config(_)));
    }

    #[test]
    fn test_sweep_from_json_keeps_default_axes() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"agents": ["tdts"], "ticks": [100, 1000], "normalization": ["space-local", "none"]}}"#
        )
        .unwrap();

        let sweep = SweepConfig::from_json_file(file.path()).unwrap();
        assert_eq!(sweep.agents, vec![SearchAgentKind::Tdts]);
        assert_eq!(sweep.ticks, vec![100, 1000]);
        assert_eq!(sweep.exploration_constants, vec![std::f64::consts::SQRT_2]);
        assert_eq!(sweep.grid().len(), 4);
        assert!(sweep.validate().is_ok());
    }
}
