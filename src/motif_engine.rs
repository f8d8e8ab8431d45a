use crate::{
    error::ScanError,
    inverted_repeat::find_inverted_repeats,
    motif_catalog::{MOTIF_CATALOG, MotifCatalog},
    scanner::scan_pattern,
    sequence_record::SequenceRecord,
};
use motifscan_protocol::MotifMatch;

/// Anything that turns one record into its ordered list of matches.
/// Implementations are shared across worker threads.
pub trait RecordScanner: Sync {
    fn scan_record(&self, record: &SequenceRecord) -> Result<Vec<MotifMatch>, ScanError>;
}

#[derive(Clone, Copy, Debug)]
pub struct MotifEngine<'c> {
    catalog: &'c MotifCatalog,
}

impl Default for MotifEngine<'static> {
    fn default() -> Self {
        Self {
            catalog: &*MOTIF_CATALOG,
        }
    }
}

impl MotifEngine<'static> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'c> MotifEngine<'c> {
    pub fn with_catalog(catalog: &'c MotifCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &MotifCatalog {
        self.catalog
    }

    /// All catalog matches in catalog order, followed by the inverted repeats.
    pub fn scan_sequence(&self, sequence: &[u8]) -> Vec<MotifMatch> {
        let mut ret: Vec<MotifMatch> = self
            .catalog
            .iter()
            .flat_map(|motif| scan_pattern(motif.name(), motif.matcher(), sequence))
            .collect();
        ret.extend(find_inverted_repeats(sequence));
        ret
    }
}

impl RecordScanner for MotifEngine<'_> {
    fn scan_record(&self, record: &SequenceRecord) -> Result<Vec<MotifMatch>, ScanError> {
        record.check()?;
        Ok(self.scan_sequence(record.sequence()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motif_catalog::INVERTED_REPEAT;

    const MIXED: &[u8] = b"TTCGCGCGCGCGCGAAGGGAGGGAGGGAGGGTTAAAACCCGGGTTTNNNNTTTGGGCCCAAAA";

    #[test]
    fn test_scan_is_idempotent() {
        let engine = MotifEngine::new();
        assert_eq!(engine.scan_sequence(MIXED), engine.scan_sequence(MIXED));
    }

    #[test]
    fn test_catalog_order_then_inverted_repeats() {
        let engine = MotifEngine::new();
        let matches = engine.scan_sequence(MIXED);
        assert!(!matches.is_empty());
        let names = engine.catalog().names();
        let rank = |motif: &str| {
            names
                .iter()
                .position(|n| *n == motif)
                .unwrap_or(names.len())
        };
        for pair in matches.windows(2) {
            assert!(rank(&pair[0].motif) <= rank(&pair[1].motif));
        }
        assert!(matches.iter().any(|m| m.motif == "Z-DNA"));
        assert!(matches.iter().any(|m| m.motif == "G-Quadruplex"));
        assert_eq!(matches.last().map(|m| m.motif.as_str()), Some(INVERTED_REPEAT));
    }

    #[test]
    fn test_matches_per_motif_do_not_overlap() {
        let engine = MotifEngine::new();
        let matches = engine.scan_sequence(MIXED);
        for pair in matches.windows(2) {
            if pair[0].motif == pair[1].motif {
                assert!(!pair[0].overlaps(&pair[1]));
            }
        }
        for m in &matches {
            assert!(m.start >= 1 && m.start <= m.end && m.end <= MIXED.len());
            assert_eq!(m.matched.len(), m.span_len());
        }
    }

    #[test]
    fn test_custom_catalog() {
        let catalog = MotifCatalog::from_patterns(&[("CG run", "(?:CG){2,}")]).unwrap();
        let engine = MotifEngine::with_catalog(&catalog);
        let record = SequenceRecord::new("r", "ATCGCGTT");
        let matches = engine.scan_record(&record).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].motif, "CG run");
        assert_eq!((matches[0].start, matches[0].end), (3, 6));
    }

    #[test]
    fn test_non_ascii_record_is_refused() {
        let record = SequenceRecord::new("u", "CGCGCGCGCGCGÇG");
        let err = MotifEngine::new().scan_record(&record).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidInput);
    }

    #[test]
    fn test_empty_sequence_has_no_matches() {
        assert!(MotifEngine::new().scan_sequence(b"").is_empty());
    }
}
