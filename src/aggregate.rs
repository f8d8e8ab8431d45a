use crate::{error::ScanError, sequence_record::SequenceRecord};
use motifscan_protocol::{MotifMatch, ResultTable};
use serde::{Deserialize, Serialize};

/// Flattens `(record, matches)` pairs into result rows, in the order given.
/// Records without matches contribute nothing.
pub fn aggregate<'a, I>(pairs: I) -> ResultTable
where
    I: IntoIterator<Item = (&'a SequenceRecord, Vec<MotifMatch>)>,
{
    let mut table = ResultTable::new();
    for (record, matches) in pairs {
        table.push_matches(record.id(), record.len(), matches);
    }
    table
}

/// The records of one input (usually one file), or the reason they could not
/// be read.
#[derive(Debug, Clone)]
pub struct Batch {
    pub source: String,
    pub records: Result<Vec<SequenceRecord>, ScanError>,
}

impl Batch {
    pub fn new(source: impl Into<String>, records: Vec<SequenceRecord>) -> Self {
        Self {
            source: source.into(),
            records: Ok(records),
        }
    }

    pub fn failed(source: impl Into<String>, error: ScanError) -> Self {
        Self {
            source: source.into(),
            records: Err(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub source: String,
    pub error: ScanError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    MotifsFound,
    NoMotifsFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub status: ReportStatus,
    pub table: ResultTable,
    pub failures: Vec<FileFailure>,
    pub files_scanned: usize,
    pub records_scanned: usize,
}

impl Default for ScanReport {
    fn default() -> Self {
        Self {
            status: ReportStatus::NoMotifsFound,
            table: ResultTable::new(),
            failures: vec![],
            files_scanned: 0,
            records_scanned: 0,
        }
    }
}

impl ScanReport {
    pub fn status(&self) -> ReportStatus {
        self.status
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Appends one successfully scanned batch.
    pub fn add_batch(&mut self, records: &[SequenceRecord], matches: Vec<Vec<MotifMatch>>) {
        self.table.append(aggregate(records.iter().zip(matches)));
        self.files_scanned += 1;
        self.records_scanned += records.len();
        self.update_status();
    }

    pub fn add_failure(&mut self, source: &str, error: ScanError) {
        self.failures.push(FileFailure {
            source: source.to_string(),
            error,
        });
    }

    fn update_status(&mut self) {
        self.status = if self.table.is_empty() {
            ReportStatus::NoMotifsFound
        } else {
            ReportStatus::MotifsFound
        };
    }
}
