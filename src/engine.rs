use crate::{
    aggregate::{Batch, ScanReport, aggregate},
    error::ScanError,
    fan_out::FanOut,
    inverted_repeat::{MAX_GAP, MIN_ARM},
    motif_catalog::{INVERTED_REPEAT, MOTIF_CATALOG},
    motif_engine::{MotifEngine, RecordScanner},
    parameters::ScanParameters,
    sequence_record::{SequenceRecord, read_fasta_file},
};
use log::{debug, info, warn};
use motifscan_protocol::{COLUMNS, ResultTable};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotifSummary {
    pub name: String,
    pub pattern: String,
    pub engine: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub protocol_version: String,
    pub motifs: Vec<MotifSummary>,
    pub procedural_motifs: Vec<MotifSummary>,
    pub columns: Vec<String>,
    pub supported_output_formats: Vec<String>,
}

/// Drives scans end to end: batches are handled one after another, records
/// within a batch are scanned in parallel.
pub struct MotifScanner<S: RecordScanner = MotifEngine<'static>> {
    parameters: ScanParameters,
    fan_out: FanOut,
    scanner: S,
}

impl MotifScanner {
    pub fn new(parameters: ScanParameters) -> Result<Self, ScanError> {
        Self::with_scanner(parameters, MotifEngine::new())
    }

    pub fn capabilities() -> Capabilities {
        let motifs = MOTIF_CATALOG
            .iter()
            .map(|motif| MotifSummary {
                name: motif.name().to_string(),
                pattern: motif.pattern().to_string(),
                engine: if motif.matcher().is_backtracking() {
                    "backtracking".to_string()
                } else {
                    "regex".to_string()
                },
            })
            .collect();
        Capabilities {
            protocol_version: "v1".to_string(),
            motifs,
            procedural_motifs: vec![MotifSummary {
                name: INVERTED_REPEAT.to_string(),
                pattern: format!("([ACGT]{{{MIN_ARM},}}).{{0,{MAX_GAP}}}(reversed \\1)"),
                engine: "inverted-repeat".to_string(),
            }],
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            supported_output_formats: ["table", "csv", "json", "report", "summary"]
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

impl<S: RecordScanner> MotifScanner<S> {
    pub fn with_scanner(parameters: ScanParameters, scanner: S) -> Result<Self, ScanError> {
        let fan_out = FanOut::new(&parameters)?;
        Ok(Self {
            parameters,
            fan_out,
            scanner,
        })
    }

    pub fn parameters(&self) -> &ScanParameters {
        &self.parameters
    }

    pub fn threads(&self) -> usize {
        self.fan_out.threads()
    }

    /// Scans one batch; fails as a whole if any record fails.
    pub fn scan_records(&self, records: &[SequenceRecord]) -> Result<ResultTable, ScanError> {
        let matches = self.fan_out.scan_batch(&self.scanner, records)?;
        Ok(aggregate(records.iter().zip(matches)))
    }

    /// Scans batches in order. Unless the parameters ask for atomic runs, a
    /// failing batch is recorded in the report and the next one is scanned.
    pub fn scan_batches<I>(&self, batches: I) -> Result<ScanReport, ScanError>
    where
        I: IntoIterator<Item = Batch>,
    {
        let mut report = ScanReport::default();
        for batch in batches {
            let outcome = batch.records.and_then(|records| {
                debug!("Scanning {} records from '{}'", records.len(), batch.source);
                let matches = self.fan_out.scan_batch(&self.scanner, &records)?;
                Ok((records, matches))
            });
            match outcome {
                Ok((records, matches)) => report.add_batch(&records, matches),
                Err(e) if self.parameters.atomic => {
                    return Err(ScanError::new(
                        e.code,
                        format!("{}: {}", batch.source, e.message),
                    ));
                }
                Err(e) => {
                    warn!("Skipping '{}': {e}", batch.source);
                    report.add_failure(&batch.source, e);
                }
            }
        }
        info!(
            "Scanned {} records in {} files: {} matches, {} failed files",
            report.records_scanned,
            report.files_scanned,
            report.table.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Reads and scans FASTA files one at a time, in the given order.
    pub fn scan_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<ScanReport, ScanError> {
        self.scan_batches(paths.iter().map(|path| {
            let source = path.as_ref().display().to_string();
            match read_fasta_file(path) {
                Ok(records) => Batch::new(source, records),
                Err(e) => Batch::failed(source, e),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate::ReportStatus, error::ErrorCode};
    use motifscan_protocol::MotifMatch;

    struct FailOn(&'static str);

    impl RecordScanner for FailOn {
        fn scan_record(&self, record: &SequenceRecord) -> Result<Vec<MotifMatch>, ScanError> {
            if record.id() == self.0 {
                return Err(ScanError::invalid_input("refused"));
            }
            MotifEngine::new().scan_record(record)
        }
    }

    fn params(atomic: bool) -> ScanParameters {
        ScanParameters {
            threads: Some(2),
            atomic,
            ..Default::default()
        }
    }

    fn batches() -> Vec<Batch> {
        vec![
            Batch::new(
                "one.fa",
                vec![SequenceRecord::new("z", "TTCGCGCGCGCGCGTT")],
            ),
            Batch::new("two.fa", vec![SequenceRecord::new("bad", "GGGAGGGAGGGAGGG")]),
            Batch::failed("three.fa", ScanError::parse("Expected >")),
            Batch::new(
                "four.fa",
                vec![SequenceRecord::new("g4", "GGGAGGGAGGGAGGG")],
            ),
        ]
    }

    #[test]
    fn test_scan_records() {
        let scanner = MotifScanner::new(params(false)).unwrap();
        let records = vec![
            SequenceRecord::new("z", "CGCGCGCGCGCGCGCG"),
            SequenceRecord::new("none", "AT"),
        ];
        let table = scanner.scan_records(&records).unwrap();
        assert_eq!(table.rows()[0].sequence_id, "z");
        assert_eq!(table.rows()[0].length, 16);
        assert!(table.rows().iter().all(|r| r.sequence_id == "z"));
        let z: Vec<_> = table.rows().iter().filter(|r| r.motif == "Z-DNA").collect();
        assert_eq!(z.len(), 1);
        assert_eq!((z[0].start, z[0].end), (1, 16));
    }

    #[test]
    fn test_scan_zero_records() {
        let scanner = MotifScanner::new(params(false)).unwrap();
        let table = scanner.scan_records(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), COLUMNS.len());
    }

    #[test]
    fn test_non_atomic_keeps_going() {
        let scanner = MotifScanner::with_scanner(params(false), FailOn("bad")).unwrap();
        let report = scanner.scan_batches(batches()).unwrap();
        assert_eq!(report.status(), ReportStatus::MotifsFound);
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.table.sequence_ids(), vec!["z", "g4"]);
        let failed: Vec<&str> = report.failures.iter().map(|f| f.source.as_str()).collect();
        assert_eq!(failed, vec!["two.fa", "three.fa"]);
        assert_eq!(report.failures[0].error, ScanError::invalid_input("refused"));
        assert_eq!(report.failures[1].error.code, ErrorCode::Parse);
    }

    #[test]
    fn test_atomic_stops_at_first_failure() {
        let scanner = MotifScanner::with_scanner(params(true), FailOn("bad")).unwrap();
        let err = scanner.scan_batches(batches()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(err.message, "two.fa: refused");
    }

    #[test]
    fn test_non_ascii_sequence_fails_its_batch() {
        let scanner = MotifScanner::new(params(false)).unwrap();
        let report = scanner
            .scan_batches(vec![
                Batch::new("<inline>", vec![SequenceRecord::new("x", "GGGAGGGAGGGAGGGé")]),
                Batch::new("g4.fa", vec![SequenceRecord::new("g4", "GGGAGGGAGGGAGGG")]),
            ])
            .unwrap();
        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.failures[0].source, "<inline>");
        assert_eq!(report.failures[0].error.code, ErrorCode::InvalidInput);
        assert_eq!(report.table.sequence_ids(), vec!["g4"]);
    }

    #[test]
    fn test_no_motifs_found() {
        let scanner = MotifScanner::new(params(true)).unwrap();
        let report = scanner
            .scan_batches(vec![Batch::new("at.fa", vec![SequenceRecord::new("at", "ATAT")])])
            .unwrap();
        assert_eq!(report.status(), ReportStatus::NoMotifsFound);
        assert_eq!(report.records_scanned, 1);
        assert!(report.table.is_empty());
    }

    #[test]
    fn test_capabilities_list_catalog() {
        let caps = MotifScanner::capabilities();
        assert_eq!(caps.motifs.len(), 11);
        assert_eq!(caps.motifs[0].name, "Slipped DNA");
        assert_eq!(caps.motifs[0].engine, "backtracking");
        assert_eq!(caps.motifs[1].engine, "regex");
        assert_eq!(caps.procedural_motifs[0].name, INVERTED_REPEAT);
        assert_eq!(caps.columns.len(), 6);
    }
}
