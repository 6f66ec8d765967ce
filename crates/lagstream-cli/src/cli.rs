use clap::{Args, Parser, Subcommand};
use lagstream_eval::{EvaluatorKind, ValidationMethodology};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lagstream")]
#[command(
    author,
    version,
    about = "Delayed-feedback evaluation for streaming classifiers"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate a learner over a CSV stream under delayed feedback
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// CSV stream to evaluate on
    #[arg(short, long)]
    pub stream: PathBuf,

    /// Declared number of classes in the stream
    #[arg(long, default_value = "2")]
    pub num_classes: usize,

    /// Optional YAML run configuration; explicit flags override file values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Learner to evaluate: majority or no-change
    #[arg(short, long, default_value = "majority")]
    pub learner: String,

    /// Evaluator implementation: basic
    #[arg(short, long, value_parser = parse_evaluator)]
    pub evaluator: Option<EvaluatorKind>,

    /// Number of folds (model replicas)
    #[arg(short = 'w', long)]
    pub folds: Option<usize>,

    /// Validation methodology: cross-validation, bootstrap, or split
    #[arg(short = 'a', long, value_parser = parse_methodology)]
    pub methodology: Option<ValidationMethodology>,

    /// Waiting window for predicted-positive records
    #[arg(short = 'P', long)]
    pub positive_window: Option<i64>,

    /// Waiting window for predicted-negative records
    #[arg(short = 'N', long)]
    pub negative_window: Option<i64>,

    /// Default for both waiting windows when not set explicitly; measured in
    /// records when the stream has no timestamp column
    #[arg(short = 'k', long)]
    pub delay: Option<i64>,

    /// Stop after this many records
    #[arg(short = 'i', long)]
    pub instance_limit: Option<u64>,

    /// Stop after this many seconds
    #[arg(short = 't', long)]
    pub time_limit: Option<u64>,

    /// Records between performance snapshots
    #[arg(short = 'F', long)]
    pub sample_frequency: Option<u64>,

    /// Column index of the timestamp field; record index is the clock when
    /// absent
    #[arg(short = 'D', long)]
    pub date_index: Option<usize>,

    /// Column index of the feedback-correlation field
    #[arg(short = 'A', long)]
    pub feedback_index: Option<usize>,

    /// Column index of the class field; the last column when absent
    #[arg(long)]
    pub class_index: Option<usize>,

    /// Column index of the instance-weight field; weight 1 when absent
    #[arg(long)]
    pub weight_index: Option<usize>,

    /// Seed handed to the learner
    #[arg(long)]
    pub model_seed: Option<u64>,

    /// Seed of the bootstrap membership sampler
    #[arg(long)]
    pub bootstrap_seed: Option<u64>,

    /// Append the global curve to this file
    #[arg(short = 'd', long)]
    pub dump_file: Option<PathBuf>,

    /// Append the per-fold curve to this file
    #[arg(long)]
    pub fold_dump_file: Option<PathBuf>,

    /// Output average precision, recall, and F1
    #[arg(short = 'o', long)]
    pub precision_recall: bool,

    /// Report precision per class
    #[arg(short = 'p', long)]
    pub precision_per_class: bool,

    /// Report recall per class
    #[arg(short = 'r', long)]
    pub recall_per_class: bool,

    /// Report F1 per class
    #[arg(short = 'f', long)]
    pub f1_per_class: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_methodology(s: &str) -> Result<ValidationMethodology, String> {
    s.parse()
}

fn parse_evaluator(s: &str) -> Result<EvaluatorKind, String> {
    s.parse()
}
