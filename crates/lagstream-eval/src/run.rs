//! The delayed-feedback evaluation run loop
//!
//! Fully sequential: one record is read, dispatched through every fold in
//! fold order, and only then is the next record read. All cross-fold
//! aggregation is read-only and happens at snapshot time.

use lagstream_core::{Learner, RecordStream, Result, RunMonitor};
use lagstream_metrics::{average_measurements, Measurement};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::EvaluationConfig;
use crate::curve::{CurveWriter, LearningCurve};
use crate::fold::Fold;

/// How many records pass between monitor polls
pub const RECORDS_BETWEEN_MONITOR_UPDATES: u64 = 10;

/// Curves produced by a completed run
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    /// Global curve: cross-fold averages per snapshot
    pub curve: LearningCurve,

    /// Per-fold curve: one row per fold per fold-level snapshot
    pub fold_curve: LearningCurve,

    /// Records read from the stream
    pub records_read: u64,
}

/// Orchestrates one delayed-feedback evaluation over a stream.
pub struct DelayedEvaluation {
    config: EvaluationConfig,
    preview: Option<LearningCurve>,
}

impl DelayedEvaluation {
    /// Validate the configuration and build the task
    pub fn new(config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            preview: None,
        })
    }

    /// Latest curve copy taken for a monitor preview request, if any
    pub fn latest_preview(&self) -> Option<&LearningCurve> {
        self.preview.as_ref()
    }

    /// Run to stream exhaustion, a configured limit, or an abort.
    ///
    /// Returns `Ok(None)` when the monitor aborted the run: an aborted run
    /// yields no partial curve.
    pub fn run(
        &mut self,
        stream: &mut dyn RecordStream,
        base_learner: &dyn Learner,
        monitor: &mut dyn RunMonitor,
    ) -> Result<Option<EvaluationResult>> {
        let config = self.config.clone();
        info!(
            folds = config.num_folds,
            methodology = %config.methodology,
            positive_window = config.positive_window,
            negative_window = config.negative_window,
            "starting delayed-feedback evaluation"
        );

        // Dump writers open before the first record so a bad path fails the
        // run up front.
        let mut dump = config
            .dump_file
            .as_deref()
            .map(CurveWriter::create)
            .transpose()?;
        let mut fold_dump = config
            .fold_dump_file
            .as_deref()
            .map(CurveWriter::create)
            .transpose()?;

        let mut rng = StdRng::seed_from_u64(config.bootstrap_seed);
        let mut base = base_learner.replicate();
        base.set_seed(config.model_seed);
        base.reset();

        let mut folds: Vec<Fold> = (0..config.num_folds)
            .map(|i| {
                Fold::new(
                    i,
                    base.replicate(),
                    config.evaluator.build(config.report),
                    config.positive_window,
                    config.negative_window,
                )
            })
            .collect();

        let mut curve = LearningCurve::new();
        let mut fold_curve = LearningCurve::new();
        let start = Instant::now();
        let mut last_sample = start;
        let mut ram_hours = 0.0;
        let mut records_read: u64 = 0;

        while stream.has_more()
            && config
                .instance_limit
                .map_or(true, |limit| records_read < limit)
            && config
                .time_limit_secs
                .map_or(true, |limit| start.elapsed().as_secs() < limit)
        {
            let record = stream.next_record()?;
            records_read += 1;
            let mut any_released = false;

            for fold in &mut folds {
                let k = config.methodology.membership_weight(
                    records_read,
                    fold.index(),
                    config.num_folds,
                    &mut rng,
                );
                let predicted = fold.predict(&record);
                if k > 0 {
                    fold.enqueue(record.clone(), predicted, config.positive_class);
                }

                let mut releases = Vec::new();
                if let Some(feedback) = record.feedback {
                    releases.extend(fold.release_matches(feedback));
                }
                releases.extend(fold.release_expired(record.timestamp));

                for entry in releases {
                    fold.score_and_train(entry)?;
                    any_released = true;

                    if fold.processed() % config.sample_frequency == 0 {
                        // Fold rows report a transient RAM figure; only
                        // global snapshots advance the accumulator.
                        let fold_ram = ram_hours
                            + ram_hours_increment(
                                fold.learner_byte_size(),
                                last_sample.elapsed().as_secs_f64(),
                            );
                        let mut rows = vec![
                            Measurement::new("current timestamp", record.timestamp as f64),
                            Measurement::new("fold", fold.index() as f64),
                            Measurement::new(
                                "fold evaluation instances",
                                fold.processed() as f64,
                            ),
                            Measurement::new(
                                "evaluation time (seconds)",
                                start.elapsed().as_secs_f64(),
                            ),
                            Measurement::new("model cost (RAM-Hours)", fold_ram),
                        ];
                        rows.extend(fold.measurements());
                        fold_curve.insert_entry(rows);
                        if let Some(writer) = &mut fold_dump {
                            writer.append_latest(&fold_curve)?;
                        }
                    }
                }
            }

            if any_released
                && (records_read % config.sample_frequency == 0 || !stream.has_more())
            {
                let increment = last_sample.elapsed().as_secs_f64();
                for fold in &folds {
                    ram_hours += ram_hours_increment(fold.learner_byte_size(), increment);
                }
                last_sample = Instant::now();

                let mut rows = vec![
                    Measurement::new("learning evaluation instances", records_read as f64),
                    Measurement::new("evaluation time (seconds)", start.elapsed().as_secs_f64()),
                    Measurement::new("model cost (RAM-Hours)", ram_hours),
                ];
                let per_fold: Vec<Vec<Measurement>> = folds
                    .iter()
                    .filter(|f| f.has_observed_classes())
                    .map(Fold::measurements)
                    .collect();
                rows.extend(average_measurements(&per_fold));
                curve.insert_entry(rows);
                if let Some(writer) = &mut dump {
                    writer.append_latest(&curve)?;
                }
                debug!(records = records_read, snapshots = curve.num_entries(), "global snapshot");
            }

            if records_read % RECORDS_BETWEEN_MONITOR_UPDATES == 0 {
                if monitor.should_abort() {
                    info!(records = records_read, "evaluation aborted by monitor");
                    return Ok(None);
                }
                monitor.set_progress(progress_fraction(
                    records_read,
                    stream.estimated_remaining(),
                    config.instance_limit,
                ));
                if monitor.preview_requested() {
                    self.preview = Some(curve.clone());
                }
            }
        }

        info!(
            records = records_read,
            snapshots = curve.num_entries(),
            fold_snapshots = fold_curve.num_entries(),
            "evaluation complete"
        );
        Ok(Some(EvaluationResult {
            curve,
            fold_curve,
            records_read,
        }))
    }
}

/// RAM-hours contribution of holding `bytes` for `seconds`
fn ram_hours_increment(bytes: usize, seconds: f64) -> f64 {
    let gigabytes = bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    gigabytes * (seconds / 3600.0)
}

/// Progress in [0, 1], or a negative value when the stream size is unknown
fn progress_fraction(processed: u64, estimated_remaining: Option<u64>, limit: Option<u64>) -> f64 {
    let remaining = match (estimated_remaining, limit) {
        (Some(est), Some(limit)) => Some(est.min(limit.saturating_sub(processed))),
        (Some(est), None) => Some(est),
        (None, Some(limit)) => Some(limit.saturating_sub(processed)),
        (None, None) => None,
    };
    match remaining {
        Some(remaining) => processed as f64 / (processed + remaining) as f64,
        None => -1.0,
    }
}
