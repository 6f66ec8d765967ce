//! Append-only learning curves and their file export
//!
//! A curve collects snapshot rows of named measurements. The header grows as
//! new measurement names appear; earlier entries render the missing columns
//! with the `?` marker, as do NaN values, so a rendered row can be parsed
//! back losslessly.

use lagstream_core::{Error, Result};
use lagstream_metrics::Measurement;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Marker for an absent or undefined value in rendered rows
const MISSING: &str = "?";

/// Ordered, append-only sequence of measurement snapshots.
#[derive(Debug, Clone, Default)]
pub struct LearningCurve {
    names: Vec<String>,
    entries: Vec<Vec<f64>>,
}

impl LearningCurve {
    /// Create an empty curve
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot; measurement names not seen before extend the header
    pub fn insert_entry(&mut self, measurements: Vec<Measurement>) {
        for m in &measurements {
            if !self.names.iter().any(|n| n == &m.name) {
                self.names.push(m.name.clone());
            }
        }
        let mut row = vec![f64::NAN; self.names.len()];
        for m in measurements {
            if let Some(pos) = self.names.iter().position(|n| n == &m.name) {
                row[pos] = m.value;
            }
        }
        self.entries.push(row);
    }

    /// Number of snapshots taken so far
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// Measurement names in first-appearance order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Value of a named measurement in one entry; NaN when absent
    pub fn value(&self, entry: usize, name: &str) -> f64 {
        let Some(pos) = self.names.iter().position(|n| n == name) else {
            return f64::NAN;
        };
        self.entries
            .get(entry)
            .and_then(|row| row.get(pos))
            .copied()
            .unwrap_or(f64::NAN)
    }

    /// Comma-separated header line
    pub fn header_to_string(&self) -> String {
        self.names.join(",")
    }

    /// Comma-separated value line for one entry, padded to the current header
    pub fn entry_to_string(&self, index: usize) -> String {
        let row = &self.entries[index];
        (0..self.names.len())
            .map(|i| {
                let value = row.get(i).copied().unwrap_or(f64::NAN);
                if value.is_nan() {
                    MISSING.to_string()
                } else {
                    format!("{value}")
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse a rendered value line back into values; `?` maps to NaN.
    pub fn parse_row(line: &str) -> Result<Vec<f64>> {
        line.split(',')
            .map(|field| {
                let field = field.trim();
                if field == MISSING {
                    Ok(f64::NAN)
                } else {
                    field
                        .parse::<f64>()
                        .map_err(|_| Error::stream(format!("unparseable curve value: {field}")))
                }
            })
            .collect()
    }
}

/// Appends curve rows to a dump file as they are produced.
///
/// The header is written exactly once, before the first row; the flag lives
/// here rather than in any shared state. Rows are flushed as written so a
/// crashed run leaves a readable file.
#[derive(Debug)]
pub struct CurveWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    wrote_header: bool,
}

impl CurveWriter {
    /// Open (or create) the dump file for appending.
    ///
    /// An unopenable path is a configuration error naming the path; callers
    /// construct writers before processing starts so this fails the run
    /// early.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                Error::config(format!("unable to open dump file {}: {e}", path.display()))
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            wrote_header: false,
        })
    }

    /// Append the curve's most recent entry, writing the header first if this
    /// writer has not yet done so
    pub fn append_latest(&mut self, curve: &LearningCurve) -> Result<()> {
        if curve.num_entries() == 0 {
            return Ok(());
        }
        if !self.wrote_header {
            writeln!(self.writer, "{}", curve.header_to_string())?;
            self.wrote_header = true;
        }
        writeln!(self.writer, "{}", curve.entry_to_string(curve.num_entries() - 1))?;
        self.writer.flush()?;
        Ok(())
    }

    /// Path this writer appends to
    pub fn path(&self) -> &Path {
        &self.path
    }
}
