//! Baseline learners for demo runs
//!
//! The evaluation core treats learners as external collaborators; these two
//! trivial baselines exist so the binary has something to drive out of the
//! box, and they double as sanity anchors (a real classifier should beat
//! both).

use lagstream_core::{Error, Learner, Record, Result};

/// Build a learner by selector name
pub fn make_learner(name: &str) -> Result<Box<dyn Learner>> {
    match name {
        "majority" => Ok(Box::new(MajorityClassLearner::default())),
        "no-change" => Ok(Box::new(NoChangeLearner::default())),
        other => Err(Error::config(format!(
            "unknown learner: {other} (expected majority or no-change)"
        ))),
    }
}

/// Votes for the class with the highest trained weight so far.
#[derive(Debug, Clone, Default)]
pub struct MajorityClassLearner {
    counts: Vec<f64>,
}

impl Learner for MajorityClassLearner {
    fn predict(&self, _record: &Record) -> Vec<f64> {
        self.counts.clone()
    }

    fn train(&mut self, record: &Record) {
        let Some(class) = record.class else { return };
        if record.weight <= 0.0 {
            return;
        }
        if self.counts.len() <= class {
            self.counts.resize(class + 1, 0.0);
        }
        self.counts[class] += record.weight;
    }

    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.counts.capacity() * std::mem::size_of::<f64>()
    }

    fn replicate(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }

    fn set_seed(&mut self, _seed: u64) {}

    fn reset(&mut self) {
        self.counts.clear();
    }
}

/// Votes for the most recent true class it was trained on.
#[derive(Debug, Clone, Default)]
pub struct NoChangeLearner {
    last_seen: Option<usize>,
}

impl Learner for NoChangeLearner {
    fn predict(&self, _record: &Record) -> Vec<f64> {
        match self.last_seen {
            Some(class) => {
                let mut votes = vec![0.0; class + 1];
                votes[class] = 1.0;
                votes
            }
            None => Vec::new(),
        }
    }

    fn train(&mut self, record: &Record) {
        if let Some(class) = record.class {
            self.last_seen = Some(class);
        }
    }

    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>()
    }

    fn replicate(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }

    fn set_seed(&mut self, _seed: u64) {}

    fn reset(&mut self) {
        self.last_seen = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lagstream_core::max_index;

    fn labeled(class: usize) -> Record {
        Record::new(vec![0.0], Some(class), 3, 0)
    }

    #[test]
    fn test_majority_tracks_weighted_counts() {
        let mut learner = MajorityClassLearner::default();
        learner.train(&labeled(2));
        learner.train(&labeled(0));
        learner.train(&labeled(2));

        assert_eq!(max_index(&learner.predict(&labeled(0))), 2);
        learner.reset();
        assert_eq!(max_index(&learner.predict(&labeled(0))), 0);
    }

    #[test]
    fn test_majority_ignores_unusable_records() {
        let mut learner = MajorityClassLearner::default();
        learner.train(&labeled(1).with_weight(0.0));
        learner.train(&Record::new(vec![0.0], None, 3, 0));
        assert!(learner.predict(&labeled(0)).is_empty());
    }

    #[test]
    fn test_no_change_follows_last_label() {
        let mut learner = NoChangeLearner::default();
        assert!(learner.predict(&labeled(0)).is_empty());
        learner.train(&labeled(1));
        assert_eq!(max_index(&learner.predict(&labeled(0))), 1);
        learner.train(&labeled(0));
        assert_eq!(max_index(&learner.predict(&labeled(0))), 0);
    }

    #[test]
    fn test_replicas_are_independent() {
        let mut learner = MajorityClassLearner::default();
        learner.train(&labeled(1));
        let replica = learner.replicate();
        learner.train(&labeled(2));
        learner.train(&labeled(2));

        // The replica kept the state at replication time.
        assert_eq!(max_index(&replica.predict(&labeled(0))), 1);
        assert_eq!(max_index(&learner.predict(&labeled(0))), 2);
    }

    #[test]
    fn test_selector_names() {
        assert!(make_learner("majority").is_ok());
        assert!(make_learner("no-change").is_ok());
        assert!(make_learner("hoeffding-tree").is_err());
    }
}
