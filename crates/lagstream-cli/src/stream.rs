//! CSV-backed record stream
//!
//! Reads one record per line from a comma-separated file with a header row.
//! The class column defaults to the last column; timestamp, feedback, and
//! weight columns are opt-in by index. A `?` (or empty) field marks a
//! withheld class, an absent feedback key, or a missing feature value.

use lagstream_core::{Error, Record, RecordStream, Result, StreamHeader};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::debug;

/// Column selection for a CSV stream
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvColumns {
    /// Class column; the last column when `None`
    pub class_index: Option<usize>,

    /// Timestamp column; the 1-based record index is the clock when `None`
    pub date_index: Option<usize>,

    /// Feedback-correlation column
    pub feedback_index: Option<usize>,

    /// Instance-weight column; weight defaults to 1 when `None`
    pub weight_index: Option<usize>,
}

/// Missing-value marker in data fields
const MISSING: &str = "?";

/// Streams records from a CSV file, one line per record.
#[derive(Debug)]
pub struct CsvRecordStream {
    header: StreamHeader,
    lines: Lines<BufReader<File>>,
    peeked: Option<String>,
    pending_error: Option<Error>,
    class_index: usize,
    columns: CsvColumns,
    num_columns: usize,
    records_read: u64,
}

impl CsvRecordStream {
    /// Open a CSV file and validate the configured columns against its
    /// header row.
    pub fn open(path: &Path, num_classes: usize, columns: CsvColumns) -> Result<Self> {
        if num_classes < 2 {
            return Err(Error::config("a stream must declare at least 2 classes"));
        }
        let file = File::open(path)
            .map_err(|e| Error::config(format!("unable to open stream {}: {e}", path.display())))?;
        let mut lines = BufReader::new(file).lines();

        let header_line = match lines.next() {
            Some(line) => line?,
            None => {
                return Err(Error::config(format!(
                    "stream {} is empty, expected a header row",
                    path.display()
                )))
            }
        };
        let attributes: Vec<String> = header_line
            .split(',')
            .map(|name| name.trim().to_string())
            .collect();
        let num_columns = attributes.len();

        let check = |label: &str, index: Option<usize>| -> Result<()> {
            match index {
                Some(i) if i >= num_columns => Err(Error::config(format!(
                    "{label} column {i} does not exist, stream has {num_columns} columns"
                ))),
                _ => Ok(()),
            }
        };
        check("class", columns.class_index)?;
        check("date", columns.date_index)?;
        check("feedback", columns.feedback_index)?;
        check("weight", columns.weight_index)?;
        let class_index = columns.class_index.unwrap_or(num_columns - 1);
        debug!(
            path = %path.display(),
            columns = num_columns,
            num_classes,
            "opened csv stream"
        );

        let mut stream = Self {
            header: StreamHeader::new(num_classes, attributes),
            lines,
            peeked: None,
            pending_error: None,
            class_index,
            columns,
            num_columns,
            records_read: 0,
        };
        stream.advance();
        Ok(stream)
    }

    /// Pull the next non-empty line into the peek slot
    fn advance(&mut self) {
        while self.peeked.is_none() && self.pending_error.is_none() {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if !line.trim().is_empty() {
                        self.peeked = Some(line);
                    }
                }
                Some(Err(e)) => self.pending_error = Some(e.into()),
                None => break,
            }
        }
    }

    fn parse_line(&self, line: &str, row: u64) -> Result<Record> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != self.num_columns {
            return Err(Error::stream(format!(
                "row {row} has {} fields, expected {}",
                fields.len(),
                self.num_columns
            )));
        }

        let class = match fields[self.class_index] {
            MISSING | "" => None,
            value => {
                let class: usize = value.parse().map_err(|_| {
                    Error::stream(format!("row {row}: unparseable class value {value:?}"))
                })?;
                if class >= self.header.num_classes {
                    return Err(Error::stream(format!(
                        "row {row}: class {class} outside the declared {} classes",
                        self.header.num_classes
                    )));
                }
                Some(class)
            }
        };

        let timestamp = match self.columns.date_index {
            Some(i) => fields[i].parse::<i64>().map_err(|_| {
                Error::config(format!(
                    "row {row}: unparseable timestamp {:?} in column {:?}",
                    fields[i], self.header.attributes[i]
                ))
            })?,
            None => row as i64,
        };

        let feedback = match self.columns.feedback_index {
            Some(i) => match fields[i] {
                MISSING | "" => None,
                value => Some(value.parse::<i64>().map_err(|_| {
                    Error::config(format!(
                        "row {row}: unparseable feedback value {value:?} in column {:?}",
                        self.header.attributes[i]
                    ))
                })?),
            },
            None => None,
        };

        let weight = match self.columns.weight_index {
            Some(i) => fields[i].parse::<f64>().map_err(|_| {
                Error::stream(format!(
                    "row {row}: unparseable weight {:?}",
                    fields[i]
                ))
            })?,
            None => 1.0,
        };

        let special = [
            Some(self.class_index),
            self.columns.date_index,
            self.columns.feedback_index,
            self.columns.weight_index,
        ];
        let mut features = Vec::with_capacity(self.num_columns);
        for (i, value) in fields.iter().enumerate() {
            if special.contains(&Some(i)) {
                continue;
            }
            let feature = match *value {
                MISSING | "" => f64::NAN,
                value => value.parse::<f64>().map_err(|_| {
                    Error::stream(format!(
                        "row {row}: unparseable feature {value:?} in column {:?}",
                        self.header.attributes[i]
                    ))
                })?,
            };
            features.push(feature);
        }

        Ok(Record {
            features,
            class,
            num_classes: self.header.num_classes,
            weight,
            timestamp,
            feedback,
        })
    }
}

impl RecordStream for CsvRecordStream {
    fn header(&self) -> &StreamHeader {
        &self.header
    }

    fn has_more(&self) -> bool {
        self.peeked.is_some() || self.pending_error.is_some()
    }

    fn next_record(&mut self) -> Result<Record> {
        if let Some(error) = self.pending_error.take() {
            return Err(error);
        }
        let line = self
            .peeked
            .take()
            .ok_or_else(|| Error::stream("stream exhausted"))?;
        self.records_read += 1;
        let record = self.parse_line(&line, self.records_read)?;
        self.advance();
        Ok(record)
    }

    fn estimated_remaining(&self) -> Option<u64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_reads_records_with_default_class_column() {
        let file = csv("amount,score,class\n1.5,0.2,0\n2.5,0.8,1\n");
        let mut stream =
            CsvRecordStream::open(file.path(), 2, CsvColumns::default()).unwrap();

        assert_eq!(stream.header().num_classes, 2);
        assert_eq!(stream.header().field_index_of("score"), Some(1));

        let first = stream.next_record().unwrap();
        assert_eq!(first.features, vec![1.5, 0.2]);
        assert_eq!(first.class, Some(0));
        assert_eq!(first.weight, 1.0);
        // No date column: the record index is the clock.
        assert_eq!(first.timestamp, 1);

        let second = stream.next_record().unwrap();
        assert_eq!(second.class, Some(1));
        assert_eq!(second.timestamp, 2);
        assert!(!stream.has_more());
    }

    #[test]
    fn test_date_and_feedback_columns() {
        let file = csv("ts,fb,x,class\n100,?,1.0,0\n105,100,2.0,1\n");
        let columns = CsvColumns {
            date_index: Some(0),
            feedback_index: Some(1),
            ..Default::default()
        };
        let mut stream = CsvRecordStream::open(file.path(), 2, columns).unwrap();

        let first = stream.next_record().unwrap();
        assert_eq!(first.timestamp, 100);
        assert_eq!(first.feedback, None);
        assert_eq!(first.features, vec![1.0]);

        let second = stream.next_record().unwrap();
        assert_eq!(second.timestamp, 105);
        assert_eq!(second.feedback, Some(100));
    }

    #[test]
    fn test_withheld_class_and_missing_feature() {
        let file = csv("x,y,class\n1.0,?,?\n");
        let mut stream =
            CsvRecordStream::open(file.path(), 2, CsvColumns::default()).unwrap();
        let record = stream.next_record().unwrap();
        assert!(record.class_is_missing());
        assert!(record.features[1].is_nan());
    }

    #[test]
    fn test_unparseable_timestamp_is_config_error() {
        let file = csv("ts,x,class\nnoon,1.0,0\n");
        let columns = CsvColumns {
            date_index: Some(0),
            ..Default::default()
        };
        let mut stream = CsvRecordStream::open(file.path(), 2, columns).unwrap();
        let err = stream.next_record().unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got: {err}");
        assert!(err.to_string().contains("ts"));
    }

    #[test]
    fn test_out_of_range_column_rejected_at_open() {
        let file = csv("x,class\n1.0,0\n");
        let columns = CsvColumns {
            feedback_index: Some(7),
            ..Default::default()
        };
        let err = CsvRecordStream::open(file.path(), 2, columns).unwrap_err();
        assert!(err.to_string().contains("feedback column 7"));
    }

    #[test]
    fn test_class_outside_declared_range_rejected() {
        let file = csv("x,class\n1.0,5\n");
        let mut stream =
            CsvRecordStream::open(file.path(), 2, CsvColumns::default()).unwrap();
        assert!(stream.next_record().is_err());
    }

    #[test]
    fn test_weight_column() {
        let file = csv("x,w,class\n1.0,0.25,1\n");
        let columns = CsvColumns {
            weight_index: Some(1),
            ..Default::default()
        };
        let mut stream = CsvRecordStream::open(file.path(), 2, columns).unwrap();
        let record = stream.next_record().unwrap();
        assert_eq!(record.weight, 0.25);
        assert_eq!(record.features, vec![1.0]);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err =
            CsvRecordStream::open(Path::new("/no/such/stream.csv"), 2, CsvColumns::default())
                .unwrap_err();
        assert!(err.to_string().contains("/no/such/stream.csv"));
    }
}
