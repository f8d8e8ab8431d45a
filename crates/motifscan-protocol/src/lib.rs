//! Shared machine-readable contracts between the motifscan engine and its
//! exporters: single matches, result rows, and the flattened result table.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const COLUMN_SEQUENCE_ID: &str = "Sequence ID";
pub const COLUMN_MOTIF: &str = "Motif";
pub const COLUMN_START: &str = "Start";
pub const COLUMN_END: &str = "End";
pub const COLUMN_MATCHED_SEQUENCE: &str = "Matched Sequence";
pub const COLUMN_LENGTH: &str = "Length";

/// Fixed column schema of every result table, in output order.
pub const COLUMNS: [&str; 6] = [
    COLUMN_SEQUENCE_ID,
    COLUMN_MOTIF,
    COLUMN_START,
    COLUMN_END,
    COLUMN_MATCHED_SEQUENCE,
    COLUMN_LENGTH,
];

/// One motif occurrence inside a single sequence.
///
/// `start` and `end` are 1-based and inclusive, so `end` equals the 0-based
/// exclusive end of the underlying span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotifMatch {
    pub motif: String,
    pub start: usize,
    pub end: usize,
    pub matched: String,
}

impl MotifMatch {
    /// Builds a match from a 0-based half-open span `from..to` of `sequence`.
    pub fn from_span(motif: &str, sequence: &[u8], from: usize, to: usize) -> Self {
        Self {
            motif: motif.to_string(),
            start: from + 1,
            end: to,
            matched: String::from_utf8_lossy(&sequence[from..to]).to_string(),
        }
    }

    #[inline(always)]
    pub fn span_len(&self) -> usize {
        self.end + 1 - self.start
    }

    /// True when both matches cover at least one common position.
    pub fn overlaps(&self, other: &MotifMatch) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "Sequence ID")]
    pub sequence_id: String,
    #[serde(rename = "Motif")]
    pub motif: String,
    #[serde(rename = "Start")]
    pub start: usize,
    #[serde(rename = "End")]
    pub end: usize,
    #[serde(rename = "Matched Sequence")]
    pub matched_sequence: String,
    #[serde(rename = "Length")]
    pub length: usize,
}

impl ResultRow {
    pub fn new(sequence_id: &str, sequence_length: usize, m: MotifMatch) -> Self {
        Self {
            sequence_id: sequence_id.to_string(),
            motif: m.motif,
            start: m.start,
            end: m.end,
            matched_sequence: m.matched,
            length: sequence_length,
        }
    }

    /// Line used by the printable report.
    pub fn report_line(&self) -> String {
        format!(
            "{} | {} | Start: {} | End: {}",
            self.sequence_id, self.motif, self.start, self.end
        )
    }
}

/// Ordered result rows plus the column schema.
///
/// The schema is serialized alongside the rows so that an empty table is
/// still self-describing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<ResultRow>,
}

impl Default for ResultTable {
    fn default() -> Self {
        Self {
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: vec![],
        }
    }
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline(always)]
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn push_matches(
        &mut self,
        sequence_id: &str,
        sequence_length: usize,
        matches: Vec<MotifMatch>,
    ) {
        self.rows.extend(
            matches
                .into_iter()
                .map(|m| ResultRow::new(sequence_id, sequence_length, m)),
        );
    }

    /// Appends all rows of `other`, keeping their order.
    pub fn append(&mut self, other: ResultTable) {
        self.rows.extend(other.rows);
    }

    /// Sequence identifiers in order of first appearance.
    pub fn sequence_ids(&self) -> Vec<&str> {
        first_appearance(self.rows.iter().map(|r| r.sequence_id.as_str()))
    }

    /// Motif names in order of first appearance.
    pub fn motifs(&self) -> Vec<&str> {
        first_appearance(self.rows.iter().map(|r| r.motif.as_str()))
    }

    /// Number of rows per motif, in order of first appearance.
    pub fn motif_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for row in &self.rows {
            *counts.entry(row.motif.as_str()).or_default() += 1;
        }
        self.motifs()
            .into_iter()
            .map(|motif| (motif.to_string(), counts[motif]))
            .collect()
    }
}

fn first_appearance<'a>(items: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(*item)).collect()
}
