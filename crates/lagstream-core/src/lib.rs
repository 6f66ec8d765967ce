//! LagStream Core
//!
//! Shared types and collaborator traits for the LagStream delayed-feedback
//! evaluation harness.
//!
//! This crate provides:
//! - The [`Record`] and [`StreamHeader`] data model
//! - Collaborator traits: [`RecordStream`], [`Learner`], [`RunMonitor`]
//! - Error types and result handling

pub mod error;
pub mod learner;
pub mod monitor;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
pub use learner::Learner;
pub use monitor::{NullMonitor, RunMonitor};
pub use stream::{InMemoryStream, RecordStream};
pub use types::{max_index, Record, StreamHeader};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::learner::Learner;
    pub use crate::monitor::{NullMonitor, RunMonitor};
    pub use crate::stream::{InMemoryStream, RecordStream};
    pub use crate::types::{max_index, Record, StreamHeader};
}
