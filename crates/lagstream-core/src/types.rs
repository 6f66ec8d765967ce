//! Core record and header types for LagStream

use serde::{Deserialize, Serialize};

/// A single observation read from a record stream.
///
/// Records are immutable once read; ownership moves into a fold's pending
/// queue at prediction time, or the record is dropped when no fold includes
/// it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Feature values, in header attribute order
    pub features: Vec<f64>,

    /// True class index; `None` when the label is withheld
    pub class: Option<usize>,

    /// Number of classes the originating stream declares
    pub num_classes: usize,

    /// Instance weight; records with weight <= 0 are never scored
    pub weight: f64,

    /// Caller-supplied event timestamp
    pub timestamp: i64,

    /// Feedback-correlation key: the timestamp of an earlier record whose
    /// true label arrives with this record, if any
    pub feedback: Option<i64>,
}

impl Record {
    /// Create a record with unit weight and no feedback key
    pub fn new(features: Vec<f64>, class: Option<usize>, num_classes: usize, timestamp: i64) -> Self {
        Self {
            features,
            class,
            num_classes,
            weight: 1.0,
            timestamp,
            feedback: None,
        }
    }

    /// Set the instance weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Attach a feedback-correlation key
    pub fn with_feedback(mut self, feedback: i64) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Whether the true label is withheld
    pub fn class_is_missing(&self) -> bool {
        self.class.is_none()
    }
}

/// Stream metadata: declared class count and named attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamHeader {
    /// Number of classes the stream declares
    pub num_classes: usize,

    /// Attribute names, in column order
    pub attributes: Vec<String>,
}

impl StreamHeader {
    /// Create a new header
    pub fn new(num_classes: usize, attributes: Vec<String>) -> Self {
        Self {
            num_classes,
            attributes,
        }
    }

    /// Column index of a named attribute, if declared
    pub fn field_index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a == name)
    }
}

/// Index of the largest vote; the first maximum wins on ties.
///
/// An empty vote vector maps to class 0, matching the behavior of a learner
/// that has seen no data yet.
pub fn max_index(votes: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in votes.iter().enumerate().skip(1) {
        if v > votes[best] {
            best = i;
        }
    }
    best
}
