pub mod about;
pub mod aggregate;
pub mod engine;
pub mod error;
pub mod fan_out;
pub mod inverted_repeat;
pub mod motif_catalog;
pub mod motif_engine;
pub mod parameters;
pub mod pattern;
pub mod scanner;
pub mod sequence_record;

pub use aggregate::{ReportStatus, ScanReport};
pub use engine::MotifScanner;
pub use error::{ErrorCode, ScanError};
pub use motif_catalog::MOTIF_CATALOG;
pub use motif_engine::{MotifEngine, RecordScanner};
pub use motifscan_protocol::{MotifMatch, ResultRow, ResultTable};
pub use parameters::ScanParameters;
pub use sequence_record::SequenceRecord;
