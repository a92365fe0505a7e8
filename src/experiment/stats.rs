//! Descriptive statistics over the games of an experiment.

use crate::recording::game_record::GameRecord;
use std::fmt;
use std::time::Duration;

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance, `0.0` below two samples.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let squared: f64 = values.iter().map(|x| (x - avg).powi(2)).sum();
    squared / (values.len() - 1) as f64
}

pub fn standard_deviation(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Middle value, averaging the two middle values for even lengths.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Index of the first maximum.
pub fn index_of_max<T: PartialOrd>(values: &[T]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, value) in values.iter().enumerate() {
        match best {
            Some(current) if values[current] >= *value => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Index of the first minimum.
pub fn index_of_min<T: PartialOrd>(values: &[T]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, value) in values.iter().enumerate() {
        match best {
            Some(current) if values[current] <= *value => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Summary of an experiment, written to `summary.txt` and the console.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentStats {
    pub games: usize,
    pub mean_score: f64,
    pub score_variance: f64,
    pub score_std_dev: f64,
    pub median_score: f64,
    pub average_steps: f64,
    /// (score, one-based game number)
    pub max_score: Option<(u64, usize)>,
    pub min_score: Option<(u64, usize)>,
    pub max_tile: Option<(u32, usize)>,
    pub total_time: Duration,
}

impl ExperimentStats {
    pub fn from_records(records: &[GameRecord]) -> Self {
        let scores: Vec<u64> = records.iter().map(GameRecord::score).collect();
        let tiles: Vec<u32> = records.iter().map(GameRecord::largest_tile).collect();
        let score_values: Vec<f64> = scores.iter().map(|&s| s as f64).collect();
        let step_values: Vec<f64> = records.iter().map(|r| r.steps() as f64).collect();

        Self {
            games: records.len(),
            mean_score: mean(&score_values),
            score_variance: sample_variance(&score_values),
            score_std_dev: standard_deviation(&score_values),
            median_score: median(&score_values),
            average_steps: mean(&step_values),
            max_score: index_of_max(&scores).map(|i| (scores[i], i + 1)),
            min_score: index_of_min(&scores).map(|i| (scores[i], i + 1)),
            max_tile: index_of_max(&tiles).map(|i| (tiles[i], i + 1)),
            total_time: records.iter().map(|r| r.duration).sum(),
        }
    }

    pub fn average_time(&self) -> Duration {
        if self.games == 0 {
            return Duration::ZERO;
        }
        self.total_time / self.games as u32
    }
}

fn write_extreme<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    extreme: Option<(T, usize)>,
) -> fmt::Result {
    match extreme {
        Some((value, game)) => writeln!(f, "{}: {} (Game[{}])", label, value, game),
        None => writeln!(f, "{}: n/a", label),
    }
}

impl fmt::Display for ExperimentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Average Score: {}", self.mean_score)?;
        writeln!(f, "Sample variance: {}", self.score_variance)?;
        writeln!(f, "Sample standard deviation: {}", self.score_std_dev)?;
        writeln!(f, "Median Score: {}", self.median_score)?;
        writeln!(f, "Average Step: {}", self.average_steps)?;
        writeln!(f, "Total time: {} s", self.total_time.as_secs_f64())?;
        writeln!(
            f,
            "Average time per game: {:.3} s",
            self.average_time().as_secs_f64()
        )?;
        write_extreme(f, "Max Score", self.max_score)?;
        write_extreme(f, "Min Score", self.min_score)?;
        write_extreme(f, "Max Tile", self.max_tile)
    }
}
