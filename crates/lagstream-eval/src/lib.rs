//! LagStream Eval
//!
//! Delayed-feedback evaluation of online classifiers: fold orchestration
//! with pending-label queues, release by explicit feedback or timeout, and
//! learning-curve reporting.
//!
//! This crate provides:
//! - [`DelayedLabelQueue`]: per-fold positive/negative FIFO buffers
//! - [`Fold`] and [`ValidationMethodology`]: membership and scoring
//! - [`LearningCurve`] and [`CurveWriter`]: append-only snapshot curves
//! - [`DelayedEvaluation`]: the single-threaded run loop

pub mod config;
pub mod curve;
pub mod fold;
pub mod queue;
pub mod run;

pub use config::{EvaluationConfig, EvaluatorKind};
pub use curve::{CurveWriter, LearningCurve};
pub use fold::{poisson, Fold, ValidationMethodology};
pub use queue::{Bucket, DelayedLabelQueue, PendingEntry};
pub use run::{DelayedEvaluation, EvaluationResult, RECORDS_BETWEEN_MONITOR_UPDATES};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{EvaluationConfig, EvaluatorKind};
    pub use crate::curve::{CurveWriter, LearningCurve};
    pub use crate::fold::{Fold, ValidationMethodology};
    pub use crate::queue::{Bucket, DelayedLabelQueue, PendingEntry};
    pub use crate::run::{DelayedEvaluation, EvaluationResult};
}
