//! Run configuration for a delayed-feedback evaluation

use lagstream_core::{Error, Result};
use lagstream_metrics::{BasicClassificationEvaluator, PerformanceEvaluator, ReportConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::fold::ValidationMethodology;

/// Which evaluator implementation each fold is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluatorKind {
    /// Cumulative statistics since the start of the run
    #[default]
    Basic,
}

impl EvaluatorKind {
    /// Build a fresh evaluator of this kind
    pub fn build(&self, report: ReportConfig) -> Box<dyn PerformanceEvaluator> {
        match self {
            Self::Basic => Box::new(BasicClassificationEvaluator::new(report)),
        }
    }
}

impl FromStr for EvaluatorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            other => Err(format!("unknown evaluator: {other} (expected basic)")),
        }
    }
}

/// Everything a [`crate::run::DelayedEvaluation`] needs besides its
/// collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Number of parallel folds (model replicas)
    #[serde(default = "default_num_folds")]
    pub num_folds: usize,

    /// Fold membership scheme
    #[serde(default)]
    pub methodology: ValidationMethodology,

    /// Evaluator implementation per fold
    #[serde(default)]
    pub evaluator: EvaluatorKind,

    /// Class index buffered in the positive queue
    #[serde(default = "default_positive_class")]
    pub positive_class: usize,

    /// Waiting window before a predicted-positive record is released by
    /// timeout
    #[serde(default)]
    pub positive_window: i64,

    /// Waiting window before a predicted-negative record is released by
    /// timeout
    #[serde(default)]
    pub negative_window: i64,

    /// Stop after this many records read, if set
    #[serde(default)]
    pub instance_limit: Option<u64>,

    /// Stop after this many elapsed seconds, if set
    #[serde(default)]
    pub time_limit_secs: Option<u64>,

    /// Records between snapshots, globally and per fold
    #[serde(default = "default_sample_frequency")]
    pub sample_frequency: u64,

    /// Seed handed to the base learner before replication
    #[serde(default = "default_seed")]
    pub model_seed: u64,

    /// Seed of the bootstrap membership sampler
    #[serde(default = "default_seed")]
    pub bootstrap_seed: u64,

    /// Append the global curve to this file, if set
    #[serde(default)]
    pub dump_file: Option<PathBuf>,

    /// Append the per-fold curve to this file, if set
    #[serde(default)]
    pub fold_dump_file: Option<PathBuf>,

    /// Optional statistic blocks to report
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            num_folds: default_num_folds(),
            methodology: ValidationMethodology::default(),
            evaluator: EvaluatorKind::default(),
            positive_class: default_positive_class(),
            positive_window: 0,
            negative_window: 0,
            instance_limit: None,
            time_limit_secs: None,
            sample_frequency: default_sample_frequency(),
            model_seed: default_seed(),
            bootstrap_seed: default_seed(),
            dump_file: None,
            fold_dump_file: None,
            report: ReportConfig::default(),
        }
    }
}

impl EvaluationConfig {
    /// Reject configurations the run loop cannot execute
    pub fn validate(&self) -> Result<()> {
        if self.num_folds == 0 {
            return Err(Error::config("num_folds must be at least 1"));
        }
        if self.sample_frequency == 0 {
            return Err(Error::config("sample_frequency must be at least 1"));
        }
        if self.positive_window < 0 || self.negative_window < 0 {
            return Err(Error::config("feedback windows must not be negative"));
        }
        Ok(())
    }
}

fn default_num_folds() -> usize {
    10
}

fn default_positive_class() -> usize {
    1
}

fn default_sample_frequency() -> u64 {
    100_000
}

fn default_seed() -> u64 {
    1
}
