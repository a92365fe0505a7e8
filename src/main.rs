use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use tree_search_2048::experiment::{
    run_experiment, run_sweep, ExperimentConfig, SearchAgentKind, SweepConfig,
};
use tree_search_2048::logging::setup_logging;
use tree_search_2048::mcts::{BestChildKind, NormalizationKind, SearchHyperparameters};
use tree_search_2048::strategy::{GamePlayingAgent, RandomAgent};

#[derive(Parser, Debug)]
#[command(name = "tree_search_2048", version, about)]
struct Config {
    /// Number of games to play
    #[arg(short = 'g', long, default_value_t = 10)]
    games: usize,

    /// Seed making the whole experiment reproducible
    #[arg(long)]
    seed: Option<u64>,

    /// Play the games on the rayon thread pool
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Directory receiving run logs and the log file
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// CSV file receiving one row per game
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    agent: AgentCommand,
}

#[derive(Subcommand, Debug)]
enum AgentCommand {
    /// Uniformly random moves
    Random,
    /// UCT agent
    Mcts(SearchArgs),
    /// Sarsa-UCT(λ) agent
    Tdts(TdtsArgs),
    /// One experiment per combination of the listed values, all rows in one CSV
    Sweep(SweepArgs),
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Forward-model ticks the agent may spend on each move
    #[arg(short = 't', long, default_value_t = 10_000)]
    ticks: u64,

    /// JSON file with search hyperparameters, flags below take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// UCB1 exploration constant (default √2)
    #[arg(short = 'c', long)]
    exploration_constant: Option<f64>,

    #[arg(long, value_enum)]
    best_child: Option<BestChildKind>,

    #[arg(long, value_enum)]
    normalization: Option<NormalizationKind>,
}

#[derive(Args, Debug)]
struct TdtsArgs {
    #[command(flatten)]
    search: SearchArgs,

    /// Reward discount γ (default 1)
    #[arg(long)]
    gamma: Option<f64>,

    /// Eligibility trace decay λ (default 1)
    #[arg(long)]
    lambda: Option<f64>,

    /// Utility of freshly created action nodes (default 0)
    #[arg(long)]
    initial_utility: Option<f64>,

    /// Maximum number of rollout actions (default unbounded)
    #[arg(long)]
    max_rollout_depth: Option<usize>,
}

#[derive(Args, Debug)]
struct SweepArgs {
    /// JSON file describing the sweep, non-empty lists below replace its axes
    #[arg(long)]
    config: Option<PathBuf>,

    /// Agents to evaluate, e.g. mcts,tdts
    #[arg(long, value_enum, value_delimiter = ',')]
    agents: Vec<SearchAgentKind>,

    /// Tick budgets per move, e.g. 100,1000,10000
    #[arg(short = 't', long, value_delimiter = ',')]
    ticks: Vec<u64>,

    /// UCB1 exploration constants, e.g. 0.6,1.4142
    #[arg(short = 'c', long, value_delimiter = ',')]
    exploration_constants: Vec<f64>,

    #[arg(long, value_enum, value_delimiter = ',')]
    best_child: Vec<BestChildKind>,

    #[arg(long, value_enum, value_delimiter = ',')]
    normalization: Vec<NormalizationKind>,
}

impl SweepArgs {
    fn sweep_config(&self) -> tree_search_2048::Result<SweepConfig> {
        let mut sweep = match &self.config {
            Some(path) => SweepConfig::from_json_file(path)?,
            None => SweepConfig::default(),
        };
        if !self.agents.is_empty() {
            sweep.agents = self.agents.clone();
        }
        if !self.ticks.is_empty() {
            sweep.ticks = self.ticks.clone();
        }
        if !self.exploration_constants.is_empty() {
            sweep.exploration_constants = self.exploration_constants.clone();
        }
        if !self.best_child.is_empty() {
            sweep.best_child = self.best_child.clone();
        }
        if !self.normalization.is_empty() {
            sweep.normalization = self.normalization.clone();
        }
        Ok(sweep)
    }
}

impl SearchArgs {
    fn hyperparameters(&self) -> tree_search_2048::Result<SearchHyperparameters> {
        let mut params = match &self.config {
            Some(path) => SearchHyperparameters::from_json_file(path)?,
            None => SearchHyperparameters::default(),
        };
        if let Some(value) = self.exploration_constant {
            params.exploration_constant = value;
        }
        if let Some(kind) = self.best_child {
            params.best_child = kind;
        }
        if let Some(kind) = self.normalization {
            params.normalization = kind;
        }
        Ok(params)
    }
}

impl TdtsArgs {
    fn hyperparameters(&self) -> tree_search_2048::Result<SearchHyperparameters> {
        let mut params = self.search.hyperparameters()?;
        if let Some(value) = self.gamma {
            params.reward_discount = value;
        }
        if let Some(value) = self.lambda {
            params.eligibility_trace_decay = value;
        }
        if let Some(value) = self.initial_utility {
            params.initial_action_utility = value;
        }
        if self.max_rollout_depth.is_some() {
            params.max_rollout_depth = self.max_rollout_depth;
        }
        Ok(params)
    }
}

fn experiment_config(config: &Config, name: &str, title: &str, ticks: u64) -> ExperimentConfig {
    let mut experiment = ExperimentConfig::new(name, title, config.games, ticks);
    experiment.seed = config.seed;
    experiment.parallel = config.parallel;
    experiment.log_dir = config.log_dir.clone();
    experiment.csv_path = config.csv.clone();
    experiment
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    let _logger = setup_logging(&config.log_level, config.log_dir.as_deref())?;

    let report = match &config.agent {
        AgentCommand::Random => {
            println!("Random Agent is being tested...");
            let experiment = experiment_config(&config, "random", "Average score of Random agent", 0);
            run_experiment(&experiment, |seed| -> Box<dyn GamePlayingAgent> {
                match seed {
                    Some(seed) => Box::new(RandomAgent::with_seed(seed)),
                    None => Box::new(RandomAgent::new()),
                }
            })?
        }
        AgentCommand::Mcts(args) => {
            let params = args.hyperparameters()?;
            params.validate()?;
            log::info!("UCT hyperparameters: {}", params.to_config_string());
            println!("UCT Agent is being tested...");

            let experiment =
                experiment_config(&config, "mcts", "Average score of UCT agent", args.ticks);
            run_experiment(&experiment, |seed| SearchAgentKind::Mcts.build(&params, seed))?
        }
        AgentCommand::Tdts(args) => {
            let params = args.hyperparameters()?;
            params.validate()?;
            log::info!("Sarsa-UCT(λ) hyperparameters: {}", params.to_config_string());
            println!("Sarsa-UCT(lambda) Agent is being tested...");

            let experiment = experiment_config(
                &config,
                "tdts",
                "Average score of Sarsa-UCT(lambda) agent",
                args.search.ticks,
            );
            run_experiment(&experiment, |seed| SearchAgentKind::Tdts.build(&params, seed))?
        }
        AgentCommand::Sweep(args) => {
            let sweep = args.sweep_config()?;
            println!("Sweeping {} configuration(s)...", sweep.grid().len());
            let template = experiment_config(&config, "sweep", "Average score", 0);
            for outcome in run_sweep(&sweep, &template)? {
                println!(
                    "{}: Average Score {:.1} (std dev {:.1}, median {:.1})",
                    outcome.point.label(),
                    outcome.stats.mean_score,
                    outcome.stats.score_std_dev,
                    outcome.stats.median_score
                );
            }
            return Ok(());
        }
    };

    for record in &report.records {
        println!(
            "Game[{}] Final Score: {} ({} ms)",
            record.index + 1,
            record.score(),
            record.duration.as_millis()
        );
    }
    print!("{}", report.stats);
    if let Some(directory) = &report.run_directory {
        println!("Run logs written to {}", directory.display());
    }

    Ok(())
}
