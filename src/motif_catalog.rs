//! The fixed catalog of structural DNA motif patterns.

use crate::{error::ScanError, pattern::Matcher};
use lazy_static::lazy_static;

pub const INVERTED_REPEAT: &str = "Inverted Repeat";

/// Catalog entries in scan order: name, pattern.
pub const MOTIF_PATTERNS: [(&str, &str); 11] = [
    ("Slipped DNA", r"([ACGT]{2,6})\1+"),
    ("Z-DNA", r"(?:CG){6,}"),
    ("Short Tandem Repeat", r"([ACGT]{2,6})\1{2,}"),
    ("I-Motif", r"(?:C[A|T]C){3,}"),
    ("R-Loop", r"A{4,}[CG]{2,}A{4,}"),
    ("Cruciform", r"([ACGT]{4,6})\1+"),
    ("G-Quadruplex", r"G{3,}.{1,5}G{3,}.{1,5}G{3,}.{1,5}G{3,}"),
    ("Hairpin", r"([ACGT]{3,6})\1{2,}"),
    ("Triplex", r"A{3,}.*A{3,}"),
    ("H-DNA", r"[AG]{4,}[TC]{4,}[AG]{4,}"),
    ("TFO", r".{6,}[AG]{4,}[TC]{4,}"),
];

#[derive(Clone, Debug)]
pub struct MotifDefinition {
    name: String,
    matcher: Matcher,
}

impl MotifDefinition {
    pub fn new(name: &str, pattern: &str) -> Result<Self, ScanError> {
        Ok(Self {
            name: name.to_string(),
            matcher: Matcher::new(pattern)?,
        })
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn pattern(&self) -> &str {
        self.matcher.source()
    }

    #[inline(always)]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}

#[derive(Clone, Debug, Default)]
pub struct MotifCatalog {
    motifs: Vec<MotifDefinition>,
}

impl MotifCatalog {
    /// Builds a catalog from `(name, pattern)` pairs, keeping their order.
    pub fn from_patterns(patterns: &[(&str, &str)]) -> Result<Self, ScanError> {
        let mut motifs: Vec<MotifDefinition> = Vec::with_capacity(patterns.len());
        for (name, pattern) in patterns {
            if motifs.iter().any(|m| m.name() == *name) {
                return Err(ScanError::invalid_pattern(format!(
                    "Duplicate motif name '{name}'"
                )));
            }
            motifs.push(MotifDefinition::new(name, pattern)?);
        }
        Ok(Self { motifs })
    }

    pub fn builtin() -> Result<Self, ScanError> {
        Self::from_patterns(&MOTIF_PATTERNS)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MotifDefinition> {
        self.motifs.iter()
    }

    pub fn get(&self, name: &str) -> Option<&MotifDefinition> {
        self.motifs.iter().find(|m| m.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.motifs.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.motifs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motifs.is_empty()
    }
}

lazy_static! {
    /// Process-wide catalog, compiled on first use and never mutated.
    pub static ref MOTIF_CATALOG: MotifCatalog = match MotifCatalog::builtin() {
        Ok(catalog) => catalog,
        Err(e) => panic!("Built-in motif catalog does not compile: {e}"),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_order() {
        assert_eq!(
            MOTIF_CATALOG.names(),
            vec![
                "Slipped DNA",
                "Z-DNA",
                "Short Tandem Repeat",
                "I-Motif",
                "R-Loop",
                "Cruciform",
                "G-Quadruplex",
                "Hairpin",
                "Triplex",
                "H-DNA",
                "TFO",
            ]
        );
        assert!(MOTIF_CATALOG.get(INVERTED_REPEAT).is_none());
    }

    #[test]
    fn test_repeat_motifs_use_backtracking() {
        for name in ["Slipped DNA", "Short Tandem Repeat", "Cruciform", "Hairpin"] {
            assert!(MOTIF_CATALOG.get(name).unwrap().matcher().is_backtracking());
        }
        for name in ["Z-DNA", "G-Quadruplex", "TFO"] {
            assert!(!MOTIF_CATALOG.get(name).unwrap().matcher().is_backtracking());
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = MotifCatalog::from_patterns(&[("A", "A+"), ("A", "C+")]).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidPattern);
    }

    #[test]
    fn test_i_motif_class_is_literal() {
        let m = MOTIF_CATALOG.get("I-Motif").unwrap().matcher();
        assert_eq!(m.find_at(b"CACCTCC|C", 0), Some((0, 9)));
        assert_eq!(m.find_at(b"CACCTCCGC", 0), None);
    }
}
