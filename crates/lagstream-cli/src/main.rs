use clap::Parser;
use lagstream_cli::cli::{Cli, Commands, RunArgs};
use lagstream_cli::stream::{CsvColumns, CsvRecordStream};
use lagstream_cli::{config, make_learner};
use lagstream_core::NullMonitor;
use lagstream_eval::DelayedEvaluation;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args),
    }
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    init_logging(args.verbose);

    let config = config::load(args.config.as_deref(), &args)?;
    let columns = CsvColumns {
        class_index: args.class_index,
        date_index: args.date_index,
        feedback_index: args.feedback_index,
        weight_index: args.weight_index,
    };
    let mut stream = CsvRecordStream::open(&args.stream, args.num_classes, columns)?;
    let learner = make_learner(&args.learner)?;

    println!("LagStream delayed-feedback evaluation");
    println!("  Stream:      {}", args.stream.display());
    println!("  Learner:     {}", args.learner);
    println!("  Folds:       {} ({})", config.num_folds, config.methodology);
    println!(
        "  Windows:     positive {} / negative {}",
        config.positive_window, config.negative_window
    );
    println!();

    let mut task = DelayedEvaluation::new(config)?;
    let result = task.run(&mut stream, learner.as_ref(), &mut NullMonitor)?;

    match result {
        None => println!("Run aborted; no curve produced."),
        Some(result) => {
            println!(
                "Processed {} records ({} global snapshots, {} fold snapshots).",
                result.records_read,
                result.curve.num_entries(),
                result.fold_curve.num_entries()
            );
            if result.curve.num_entries() > 0 {
                let last = result.curve.num_entries() - 1;
                println!();
                println!("Final snapshot:");
                for name in result.curve.names() {
                    println!("  {name}: {}", result.curve.value(last, name));
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "lagstream_cli=debug,lagstream_eval=debug"
    } else {
        "lagstream_cli=info,lagstream_eval=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
