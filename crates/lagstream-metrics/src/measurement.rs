//! Named metric values and cross-fold aggregation

use serde::{Deserialize, Serialize};

/// A named metric value captured at snapshot time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Metric name, used as the curve column header
    pub name: String,

    /// Metric value; NaN and infinities are legal and propagate to reports
    pub value: f64,
}

impl Measurement {
    /// Create a new measurement
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Average measurement rows elementwise by name.
///
/// Names keep their first-appearance order across the input rows. For each
/// name the result is the plain mean over the rows that contain it; NaN
/// values are not skipped and poison the mean, which is the documented
/// behavior for undefined fold statistics.
pub fn average_measurements(rows: &[Vec<Measurement>]) -> Vec<Measurement> {
    let mut names: Vec<&str> = Vec::new();
    for row in rows {
        for m in row {
            if !names.contains(&m.name.as_str()) {
                names.push(&m.name);
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let mut sum = 0.0;
            let mut count = 0u32;
            for row in rows {
                if let Some(m) = row.iter().find(|m| m.name == name) {
                    sum += m.value;
                    count += 1;
                }
            }
            Measurement::new(name, sum / f64::from(count))
        })
        .collect()
}
