use crate::error::ScanError;
use bio::io::fasta;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Read, path::Path};

/// One named nucleotide sequence, as read. Case is kept and nothing is
/// normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    id: String,
    sequence: Vec<u8>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
        }
    }

    pub fn from_fasta_record(record: &fasta::Record) -> Self {
        Self::new(record.id(), record.seq())
    }

    #[inline(always)]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline(always)]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Sequences must be ASCII, so that byte positions and lengths are
    /// character positions and lengths.
    pub fn check(&self) -> Result<(), ScanError> {
        match self.sequence.iter().position(|b| !b.is_ascii()) {
            Some(pos) => Err(ScanError::invalid_input(format!(
                "Non-ASCII character at position {} in sequence '{}'",
                pos + 1,
                self.id
            ))),
            None => Ok(()),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Reads every record of a FASTA stream. `source` only names the stream in
/// error messages. Any malformed record fails the whole stream.
pub fn read_fasta<R: Read>(reader: R, source: &str) -> Result<Vec<SequenceRecord>, ScanError> {
    let mut ret = vec![];
    for (index, record) in fasta::Reader::new(reader).records().enumerate() {
        let record = record.map_err(|e| {
            ScanError::parse(format!("Could not parse FASTA '{source}': {e}"))
        })?;
        record.check().map_err(|e| {
            ScanError::parse(format!(
                "Invalid FASTA record #{} in '{source}': {e}",
                index + 1
            ))
        })?;
        ret.push(SequenceRecord::from_fasta_record(&record));
    }
    Ok(ret)
}

pub fn read_fasta_file<P: AsRef<Path>>(path: P) -> Result<Vec<SequenceRecord>, ScanError> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let file = File::open(path)
        .map_err(|e| ScanError::parse(format!("Could not open FASTA '{source}': {e}")))?;
    read_fasta(file, &source)
}
