//! LagStream CLI
//!
//! Command-line runner around the LagStream evaluation crates: CSV streams,
//! baseline learners, and YAML run settings with CLI overrides.

pub mod cli;
pub mod config;
pub mod learners;
pub mod stream;

pub use learners::{make_learner, MajorityClassLearner, NoChangeLearner};
pub use stream::{CsvColumns, CsvRecordStream};
