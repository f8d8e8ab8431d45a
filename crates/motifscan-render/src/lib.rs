//! Headless exporters for motifscan result tables.
//!
//! Every function here is a stateless conversion from a [`ResultTable`]; the
//! output is regenerated from scratch on each call.

pub mod chart;
pub mod csv_export;
pub mod report;

pub use chart::export_motif_chart_svg;
pub use csv_export::{table_to_csv, write_csv};
pub use report::{render_report, render_summary, render_text_table};

pub use motifscan_protocol::ResultTable;
