//! Incremental classification performance evaluation
//!
//! The evaluator keeps a bank of running estimators and derives every
//! reported statistic from them on demand. Memory is O(num_classes) and no
//! raw prediction history is retained.

use crate::estimator::RunningEstimator;
use crate::measurement::Measurement;
use lagstream_core::{Error, Record, Result};
use serde::{Deserialize, Serialize};

/// Capability interface for incremental evaluators.
///
/// Concrete variants (basic, windowed, fading) are selected at construction
/// time; the run loop only sees this trait.
pub trait PerformanceEvaluator {
    /// Discard all statistics, keeping the current class count
    fn reset(&mut self);

    /// Score one prediction against the record's true label.
    ///
    /// Records with a withheld label are ignored. The first record with
    /// positive weight fixes the class count for the rest of the run;
    /// a later change in the declared class count is an error.
    fn add_result(&mut self, record: &Record, predicted_class: usize) -> Result<()>;

    /// Current statistics as named measurement rows
    fn measurements(&self) -> Vec<Measurement>;

    /// Class count observed at initialization; 0 before any scored record
    fn num_classes(&self) -> usize;
}

/// Which optional statistic blocks `measurements()` reports
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report class-averaged precision, recall, and F1
    #[serde(default)]
    pub precision_recall_output: bool,

    /// Report precision per class with its baseline lifts
    #[serde(default)]
    pub precision_per_class: bool,

    /// Report recall per class, G-mean, and their baseline lifts
    #[serde(default)]
    pub recall_per_class: bool,

    /// Report F1 per class with its baseline lifts
    #[serde(default)]
    pub f1_per_class: bool,
}

/// Basic incremental evaluator: accuracy, Kappa family, precision/recall/F1,
/// G-mean, plus no-change and majority-class baseline lifts.
#[derive(Debug, Clone)]
pub struct BasicClassificationEvaluator {
    report: ReportConfig,
    num_classes: usize,
    total_weight_observed: f64,
    last_seen_class: usize,

    weight_correct: RunningEstimator,
    weight_correct_no_change: RunningEstimator,
    weight_majority: RunningEstimator,

    row_kappa: Vec<RunningEstimator>,
    column_kappa: Vec<RunningEstimator>,
    precision: Vec<RunningEstimator>,
    recall: Vec<RunningEstimator>,
    precision_no_change: Vec<RunningEstimator>,
    precision_majority: Vec<RunningEstimator>,
    recall_no_change: Vec<RunningEstimator>,
    recall_majority: Vec<RunningEstimator>,
}

impl BasicClassificationEvaluator {
    /// Create an evaluator; per-class banks are sized by the first scored
    /// record.
    pub fn new(report: ReportConfig) -> Self {
        Self {
            report,
            num_classes: 0,
            total_weight_observed: 0.0,
            last_seen_class: 0,
            weight_correct: RunningEstimator::new(),
            weight_correct_no_change: RunningEstimator::new(),
            weight_majority: RunningEstimator::new(),
            row_kappa: Vec::new(),
            column_kappa: Vec::new(),
            precision: Vec::new(),
            recall: Vec::new(),
            precision_no_change: Vec::new(),
            precision_majority: Vec::new(),
            recall_no_change: Vec::new(),
            recall_majority: Vec::new(),
        }
    }

    /// Re-initialize every estimator for the given class count
    pub fn reset_to(&mut self, num_classes: usize) {
        let bank = |n| vec![RunningEstimator::new(); n];
        self.num_classes = num_classes;
        self.total_weight_observed = 0.0;
        self.last_seen_class = 0;
        self.weight_correct = RunningEstimator::new();
        self.weight_correct_no_change = RunningEstimator::new();
        self.weight_majority = RunningEstimator::new();
        self.row_kappa = bank(num_classes);
        self.column_kappa = bank(num_classes);
        self.precision = bank(num_classes);
        self.recall = bank(num_classes);
        self.precision_no_change = bank(num_classes);
        self.precision_majority = bank(num_classes);
        self.recall_no_change = bank(num_classes);
        self.recall_majority = bank(num_classes);
    }

    /// Total weight of scored records since the last reset
    pub fn total_weight_observed(&self) -> f64 {
        self.total_weight_observed
    }

    /// Class with the highest running true-class frequency; ties break to the
    /// lowest index, class 0 before any data.
    fn majority_class(&self) -> usize {
        let mut majority = 0;
        let mut max_prob = 0.0;
        for (i, est) in self.column_kappa.iter().enumerate() {
            let p = est.estimation();
            if p > max_prob {
                majority = i;
                max_prob = p;
            }
        }
        majority
    }

    /// Fraction of weight classified correctly; NaN before any scored record
    pub fn accuracy(&self) -> f64 {
        self.weight_correct.estimation()
    }

    fn kappa_from(p0: f64, pc: f64) -> f64 {
        (p0 - pc) / (1.0 - pc)
    }

    /// Cohen's Kappa against independent marginal predicted/true rates
    pub fn kappa(&self) -> f64 {
        if self.total_weight_observed > 0.0 {
            let pc = (0..self.num_classes)
                .map(|i| self.row_kappa[i].estimation() * self.column_kappa[i].estimation())
                .sum::<f64>();
            Self::kappa_from(self.accuracy(), pc)
        } else {
            0.0
        }
    }

    /// Kappa against a predict-the-previous-true-label baseline
    pub fn kappa_temporal(&self) -> f64 {
        if self.total_weight_observed > 0.0 {
            Self::kappa_from(self.accuracy(), self.weight_correct_no_change.estimation())
        } else {
            0.0
        }
    }

    /// Kappa against a majority-class baseline
    pub fn kappa_m(&self) -> f64 {
        if self.total_weight_observed > 0.0 {
            Self::kappa_from(self.accuracy(), self.weight_majority.estimation())
        } else {
            0.0
        }
    }

    /// Precision for one class
    pub fn precision_for(&self, class: usize) -> f64 {
        self.precision[class].estimation()
    }

    /// Class-averaged precision
    pub fn precision_mean(&self) -> f64 {
        mean_estimation(&self.precision)
    }

    /// Recall for one class
    pub fn recall_for(&self, class: usize) -> f64 {
        self.recall[class].estimation()
    }

    /// Class-averaged recall
    pub fn recall_mean(&self) -> f64 {
        mean_estimation(&self.recall)
    }

    /// F1 for one class; NaN or infinite when P + R is 0
    pub fn f1_for(&self, class: usize) -> f64 {
        f1(self.precision_for(class), self.recall_for(class))
    }

    /// F1 of the class-averaged precision and recall
    pub fn f1_mean(&self) -> f64 {
        f1(self.precision_mean(), self.recall_mean())
    }

    /// Geometric mean of per-class recalls
    pub fn gmean(&self) -> f64 {
        gmean_of(&self.recall)
    }

    fn gmean_no_change(&self) -> f64 {
        gmean_of(&self.recall_no_change)
    }

    fn gmean_majority(&self) -> f64 {
        gmean_of(&self.recall_majority)
    }

    fn baseline_kappa(&self, p0: f64, pc: f64) -> f64 {
        if self.total_weight_observed > 0.0 {
            Self::kappa_from(p0, pc)
        } else {
            0.0
        }
    }

    /// Per-class recall lift over the no-change baseline
    pub fn kappa_recall_temporal_for(&self, class: usize) -> f64 {
        self.baseline_kappa(
            self.recall_for(class),
            self.recall_no_change[class].estimation(),
        )
    }

    /// Per-class recall lift over the majority baseline
    pub fn kappa_recall_m_for(&self, class: usize) -> f64 {
        self.baseline_kappa(
            self.recall_for(class),
            self.recall_majority[class].estimation(),
        )
    }

    /// Per-class precision lift over the no-change baseline
    pub fn kappa_precision_temporal_for(&self, class: usize) -> f64 {
        self.baseline_kappa(
            self.precision_for(class),
            self.precision_no_change[class].estimation(),
        )
    }

    /// Per-class precision lift over the majority baseline
    pub fn kappa_precision_m_for(&self, class: usize) -> f64 {
        self.baseline_kappa(
            self.precision_for(class),
            self.precision_majority[class].estimation(),
        )
    }

    /// Per-class F1 lift over the no-change baseline
    pub fn kappa_f1_temporal_for(&self, class: usize) -> f64 {
        let pc = f1(
            self.precision_no_change[class].estimation(),
            self.recall_no_change[class].estimation(),
        );
        self.baseline_kappa(self.f1_for(class), pc)
    }

    /// Per-class F1 lift over the majority baseline
    pub fn kappa_f1_m_for(&self, class: usize) -> f64 {
        let pc = f1(
            self.precision_majority[class].estimation(),
            self.recall_majority[class].estimation(),
        );
        self.baseline_kappa(self.f1_for(class), pc)
    }

    /// G-mean lift over the no-change baseline
    pub fn kappa_gmean_temporal(&self) -> f64 {
        self.baseline_kappa(self.gmean(), self.gmean_no_change())
    }

    /// G-mean lift over the majority baseline
    pub fn kappa_gmean_m(&self) -> f64 {
        self.baseline_kappa(self.gmean(), self.gmean_majority())
    }
}

impl PerformanceEvaluator for BasicClassificationEvaluator {
    fn reset(&mut self) {
        self.reset_to(self.num_classes);
    }

    fn add_result(&mut self, record: &Record, predicted_class: usize) -> Result<()> {
        let Some(true_class) = record.class else {
            return Ok(());
        };
        let weight = record.weight;

        if weight > 0.0 {
            if self.total_weight_observed == 0.0 {
                self.reset_to(record.num_classes);
            } else if record.num_classes != self.num_classes {
                return Err(Error::evaluation(format!(
                    "class count changed mid-run: evaluator holds {}, record declares {}",
                    self.num_classes, record.num_classes
                )));
            }
            self.total_weight_observed += weight;
            self.weight_correct.add(indicator(predicted_class == true_class, weight));

            for i in 0..self.num_classes {
                self.row_kappa[i].add(indicator(predicted_class == i, weight));
                self.column_kappa[i].add(indicator(true_class == i, weight));
                let majority = self.majority_class();

                // NaN keeps the irrelevant estimators in lock-step with the
                // relevant ones.
                if predicted_class == i {
                    self.precision[i].add(indicator(predicted_class == true_class, weight));
                    self.precision_majority[i].add(indicator(majority == true_class, weight));
                    self.precision_no_change[i]
                        .add(indicator(self.last_seen_class == true_class, weight));
                } else {
                    self.precision[i].add(f64::NAN);
                    self.precision_majority[i].add(f64::NAN);
                    self.precision_no_change[i].add(f64::NAN);
                }

                if true_class == i {
                    self.recall[i].add(indicator(predicted_class == true_class, weight));
                    self.recall_no_change[i]
                        .add(indicator(self.last_seen_class == true_class, weight));
                    self.recall_majority[i].add(indicator(majority == true_class, weight));
                } else {
                    self.recall[i].add(f64::NAN);
                    self.recall_no_change[i].add(f64::NAN);
                    self.recall_majority[i].add(f64::NAN);
                }
            }
        }

        // Baseline trackers advance for any weight sign.
        self.weight_correct_no_change
            .add(indicator(self.last_seen_class == true_class, weight));
        let majority = self.majority_class();
        self.weight_majority
            .add(indicator(majority == true_class, weight));
        self.last_seen_class = true_class;
        Ok(())
    }

    fn measurements(&self) -> Vec<Measurement> {
        let mut rows = vec![
            Measurement::new("classified instances", self.total_weight_observed),
            Measurement::new("classifications correct (percent)", self.accuracy() * 100.0),
            Measurement::new("kappa statistic (percent)", self.kappa() * 100.0),
            Measurement::new("kappa temporal statistic (percent)", self.kappa_temporal() * 100.0),
            Measurement::new("kappa m statistic (percent)", self.kappa_m() * 100.0),
        ];

        if self.report.precision_recall_output {
            rows.push(Measurement::new("f1 score (percent)", self.f1_mean() * 100.0));
        }
        if self.report.f1_per_class {
            for i in 0..self.num_classes {
                rows.push(Measurement::new(
                    format!("f1 score for class {i} (percent)"),
                    self.f1_for(i) * 100.0,
                ));
            }
            for i in 0..self.num_classes {
                rows.push(Measurement::new(
                    format!("kappa temporal f1 for class {i} (percent)"),
                    self.kappa_f1_temporal_for(i) * 100.0,
                ));
            }
            for i in 0..self.num_classes {
                rows.push(Measurement::new(
                    format!("kappa m f1 for class {i} (percent)"),
                    self.kappa_f1_m_for(i) * 100.0,
                ));
            }
        }

        if self.report.precision_recall_output {
            rows.push(Measurement::new("precision (percent)", self.precision_mean() * 100.0));
        }
        if self.report.precision_per_class {
            for i in 0..self.num_classes {
                rows.push(Measurement::new(
                    format!("precision for class {i} (percent)"),
                    self.precision_for(i) * 100.0,
                ));
            }
            for i in 0..self.num_classes {
                rows.push(Measurement::new(
                    format!("kappa temporal precision for class {i} (percent)"),
                    self.kappa_precision_temporal_for(i) * 100.0,
                ));
            }
            for i in 0..self.num_classes {
                rows.push(Measurement::new(
                    format!("kappa m precision for class {i} (percent)"),
                    self.kappa_precision_m_for(i) * 100.0,
                ));
            }
        }

        if self.report.precision_recall_output {
            rows.push(Measurement::new("recall (percent)", self.recall_mean() * 100.0));
        }
        if self.report.recall_per_class {
            for i in 0..self.num_classes {
                rows.push(Measurement::new(
                    format!("recall for class {i} (percent)"),
                    self.recall_for(i) * 100.0,
                ));
            }
            rows.push(Measurement::new("gmean for recall (percent)", self.gmean() * 100.0));
            for i in 0..self.num_classes {
                rows.push(Measurement::new(
                    format!("kappa temporal recall for class {i} (percent)"),
                    self.kappa_recall_temporal_for(i) * 100.0,
                ));
            }
            for i in 0..self.num_classes {
                rows.push(Measurement::new(
                    format!("kappa m recall for class {i} (percent)"),
                    self.kappa_recall_m_for(i) * 100.0,
                ));
            }
            rows.push(Measurement::new(
                "kappa temporal gmean (percent)",
                self.kappa_gmean_temporal() * 100.0,
            ));
            rows.push(Measurement::new(
                "kappa m gmean (percent)",
                self.kappa_gmean_m() * 100.0,
            ));
        }

        rows
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}

fn indicator(hit: bool, weight: f64) -> f64 {
    if hit {
        weight
    } else {
        0.0
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    2.0 * precision * recall / (precision + recall)
}

fn mean_estimation(bank: &[RunningEstimator]) -> f64 {
    bank.iter().map(RunningEstimator::estimation).sum::<f64>() / bank.len() as f64
}

fn gmean_of(bank: &[RunningEstimator]) -> f64 {
    let product: f64 = bank.iter().map(RunningEstimator::estimation).product();
    product.powf(1.0 / bank.len() as f64)
}
