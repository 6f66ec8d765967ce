//! Run-settings loading: optional YAML file plus CLI overrides

use crate::cli::RunArgs;
use anyhow::Context;
use lagstream_eval::EvaluationConfig;
use std::path::Path;

/// Build the run configuration from an optional YAML file and CLI overrides.
///
/// Flags given on the command line always win over file values; the `delay`
/// shorthand seeds both waiting windows only when they were not set anywhere
/// more specific.
pub fn load(path: Option<&Path>, args: &RunArgs) -> anyhow::Result<EvaluationConfig> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("unable to read config file {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded run settings file");
            serde_yaml::from_str(&content)
                .with_context(|| format!("invalid config file {}", path.display()))?
        }
        None => EvaluationConfig::default(),
    };

    // Apply CLI overrides
    if let Some(folds) = args.folds {
        config.num_folds = folds;
    }
    if let Some(methodology) = args.methodology {
        config.methodology = methodology;
    }
    if let Some(evaluator) = args.evaluator {
        config.evaluator = evaluator;
    }
    if let Some(window) = args.positive_window {
        config.positive_window = window;
    } else if let Some(delay) = args.delay {
        config.positive_window = delay;
    }
    if let Some(window) = args.negative_window {
        config.negative_window = window;
    } else if let Some(delay) = args.delay {
        config.negative_window = delay;
    }
    if let Some(limit) = args.instance_limit {
        config.instance_limit = Some(limit);
    }
    if let Some(limit) = args.time_limit {
        config.time_limit_secs = Some(limit);
    }
    if let Some(frequency) = args.sample_frequency {
        config.sample_frequency = frequency;
    }
    if let Some(seed) = args.model_seed {
        config.model_seed = seed;
    }
    if let Some(seed) = args.bootstrap_seed {
        config.bootstrap_seed = seed;
    }
    if let Some(path) = &args.dump_file {
        config.dump_file = Some(path.clone());
    }
    if let Some(path) = &args.fold_dump_file {
        config.fold_dump_file = Some(path.clone());
    }
    if args.precision_recall {
        config.report.precision_recall_output = true;
    }
    if args.precision_per_class {
        config.report.precision_per_class = true;
    }
    if args.recall_per_class {
        config.report.recall_per_class = true;
    }
    if args.f1_per_class {
        config.report.f1_per_class = true;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["lagstream", "run", "--stream", "data.csv"];
        argv.extend_from_slice(extra);
        let cli = crate::cli::Cli::parse_from(argv);
        match cli.command {
            crate::cli::Commands::Run(args) => args,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load(None, &args(&[])).unwrap();
        assert_eq!(config.num_folds, 10);
        assert_eq!(config.positive_window, 0);
        assert!(!config.report.precision_recall_output);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "num_folds: 4\npositive_window: 30").unwrap();

        let config = load(Some(file.path()), &args(&["--folds", "2"])).unwrap();
        // CLI wins where given, file wins elsewhere.
        assert_eq!(config.num_folds, 2);
        assert_eq!(config.positive_window, 30);
    }

    #[test]
    fn test_delay_seeds_unset_windows() {
        let config = load(None, &args(&["--delay", "50", "--positive-window", "5"])).unwrap();
        assert_eq!(config.positive_window, 5);
        assert_eq!(config.negative_window, 50);
    }

    #[test]
    fn test_report_flags_map_through() {
        let config = load(None, &args(&["-o", "-r"])).unwrap();
        assert!(config.report.precision_recall_output);
        assert!(config.report.recall_per_class);
        assert!(!config.report.precision_per_class);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "num_folds: not-a-number").unwrap();
        assert!(load(Some(file.path()), &args(&[])).is_err());
    }

    #[test]
    fn test_invalid_override_rejected_by_validate() {
        assert!(load(None, &args(&["--folds", "0"])).is_err());
    }
}
