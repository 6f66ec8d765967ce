//! Learner collaborator trait
//!
//! LagStream evaluates classifiers; it does not implement them. The harness
//! only needs the train/predict contract below, plus replication so each fold
//! can own an independent copy of the model under evaluation.

use crate::types::Record;

/// Train/predict contract for the classifier under evaluation.
pub trait Learner {
    /// Vote vector over classes for this record; higher means more likely.
    ///
    /// May be shorter than the declared class count (classes the learner has
    /// never seen vote 0) or empty before any training.
    fn predict(&self, record: &Record) -> Vec<f64>;

    /// Incorporate one labeled record
    fn train(&mut self, record: &Record);

    /// Approximate model size in bytes, for RAM-hours accounting
    fn byte_size(&self) -> usize;

    /// Independent replica with the same configuration and learned state
    fn replicate(&self) -> Box<dyn Learner>;

    /// Reseed any internal randomness
    fn set_seed(&mut self, seed: u64);

    /// Discard all learned state
    fn reset(&mut self);
}
