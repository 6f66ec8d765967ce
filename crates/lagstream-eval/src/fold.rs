//! Fold membership and release-driven scoring
//!
//! A fold owns one learner replica, one evaluator, and one pending-label
//! queue pair. The run loop drives each incoming record through every fold:
//! membership weight, prediction, buffering, then the release checks.

use crate::queue::{Bucket, DelayedLabelQueue, PendingEntry};
use lagstream_core::{max_index, Learner, Record, Result};
use lagstream_metrics::{Measurement, PerformanceEvaluator};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How records are assigned to folds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationMethodology {
    /// Each fold trains on all records except every k-th one
    #[default]
    CrossValidation,
    /// Poisson(1) membership per fold, as in online bagging
    Bootstrap,
    /// Each record belongs to exactly one fold
    Split,
}

impl ValidationMethodology {
    /// Membership weight of a record for one fold.
    ///
    /// `record_index` is 1-based, counted over the whole stream.
    pub fn membership_weight(
        &self,
        record_index: u64,
        fold_index: usize,
        num_folds: usize,
        rng: &mut impl Rng,
    ) -> u32 {
        let hits = record_index % num_folds as u64 == fold_index as u64;
        match self {
            Self::CrossValidation => u32::from(!hits),
            Self::Bootstrap => poisson(1.0, rng),
            Self::Split => u32::from(hits),
        }
    }
}

impl FromStr for ValidationMethodology {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cross-validation" => Ok(Self::CrossValidation),
            "bootstrap" => Ok(Self::Bootstrap),
            "split" => Ok(Self::Split),
            other => Err(format!(
                "unknown validation methodology: {other} (expected cross-validation, bootstrap, or split)"
            )),
        }
    }
}

impl fmt::Display for ValidationMethodology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CrossValidation => "cross-validation",
            Self::Bootstrap => "bootstrap",
            Self::Split => "split",
        };
        f.write_str(name)
    }
}

/// Sample a Poisson-distributed count by the inverse-series method.
///
/// Deterministic for a given RNG state, which is what makes bootstrap runs
/// reproducible under a fixed seed.
pub fn poisson(lambda: f64, rng: &mut impl Rng) -> u32 {
    let threshold: f64 = rng.gen::<f64>() * lambda.exp();
    let mut product = 1.0;
    let mut sum = 1.0;
    let max = (10.0 * lambda.ceil()).max(100.0) as u32;
    let mut i = 1;
    while i < max && sum <= threshold {
        product *= lambda / f64::from(i);
        sum += product;
        i += 1;
    }
    i - 1
}

/// One replica of the model under evaluation, with its own metric bank and
/// pending-label queues. Exclusively owned state; folds never share.
pub struct Fold {
    index: usize,
    learner: Box<dyn Learner>,
    evaluator: Box<dyn PerformanceEvaluator>,
    queue: DelayedLabelQueue,
    processed: u64,
}

impl Fold {
    /// Create a fold around a learner replica and evaluator
    pub fn new(
        index: usize,
        learner: Box<dyn Learner>,
        evaluator: Box<dyn PerformanceEvaluator>,
        positive_window: i64,
        negative_window: i64,
    ) -> Self {
        Self {
            index,
            learner,
            evaluator,
            queue: DelayedLabelQueue::new(positive_window, negative_window),
            processed: 0,
        }
    }

    /// Fold position in the experiment
    pub fn index(&self) -> usize {
        self.index
    }

    /// Records scored and trained by this fold so far
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Predicted class for a record, from the fold's learner votes
    pub fn predict(&self, record: &Record) -> usize {
        max_index(&self.learner.predict(record))
    }

    /// Buffer a record the fold is a member for
    pub fn enqueue(&mut self, record: Record, predicted_class: usize, positive_class: usize) {
        let bucket = if predicted_class == positive_class {
            Bucket::Positive
        } else {
            Bucket::Negative
        };
        let entry = PendingEntry {
            enqueued_at: record.timestamp,
            predicted_class,
            record,
        };
        self.queue.push(bucket, entry);
    }

    /// Release entries matched by an explicit feedback key, at most one per
    /// bucket
    pub fn release_matches(&mut self, feedback: i64) -> Vec<PendingEntry> {
        [Bucket::Positive, Bucket::Negative]
            .into_iter()
            .filter_map(|bucket| self.queue.take_match(bucket, feedback))
            .collect()
    }

    /// Release entries whose waiting window elapsed at `now`, at most one per
    /// bucket
    pub fn release_expired(&mut self, now: i64) -> Vec<PendingEntry> {
        [Bucket::Positive, Bucket::Negative]
            .into_iter()
            .filter_map(|bucket| self.queue.pop_expired(bucket, now))
            .collect()
    }

    /// Score a released entry against its buffered prediction, then train on
    /// its now-known label
    pub fn score_and_train(&mut self, entry: PendingEntry) -> Result<()> {
        self.evaluator
            .add_result(&entry.record, entry.predicted_class)?;
        self.learner.train(&entry.record);
        self.processed += 1;
        Ok(())
    }

    /// Current statistics of this fold's evaluator
    pub fn measurements(&self) -> Vec<Measurement> {
        self.evaluator.measurements()
    }

    /// Whether this fold has scored at least one record
    pub fn has_observed_classes(&self) -> bool {
        self.evaluator.num_classes() > 0
    }

    /// Model size of this fold's learner, for RAM-hours accounting
    pub fn learner_byte_size(&self) -> usize {
        self.learner.byte_size()
    }

    /// Entries still waiting for a label
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
