use motifscan_protocol::{COLUMNS, ResultTable};

const PAGE_BREAK: char = '\u{0c}';
const MAX_MATCHED_WIDTH: usize = 40;

/// Paginated plain-text report, one line per row. Pages are separated by a
/// form feed and carry a numbered header.
pub fn render_report(table: &ResultTable, rows_per_page: usize) -> String {
    let rows_per_page = rows_per_page.max(1);
    let lines: Vec<String> = table.rows().iter().map(|r| r.report_line()).collect();
    if lines.is_empty() {
        return "Motif Detection Report - page 1/1\n\nNo motifs found\n".to_string();
    }
    let pages: Vec<&[String]> = lines.chunks(rows_per_page).collect();
    let total = pages.len();
    let mut out = String::new();
    for (idx, page) in pages.iter().enumerate() {
        if idx > 0 {
            out.push(PAGE_BREAK);
        }
        out += &format!("Motif Detection Report - page {}/{total}\n\n", idx + 1);
        for line in page.iter() {
            out += line;
            out.push('\n');
        }
    }
    out
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut ret: String = s.chars().take(width.saturating_sub(3)).collect();
    ret += "...";
    ret
}

/// Aligned table for terminal output. Long matched sequences are shortened.
pub fn render_text_table(table: &ResultTable) -> String {
    let cells: Vec<[String; 6]> = table
        .rows()
        .iter()
        .map(|r| {
            [
                r.sequence_id.clone(),
                r.motif.clone(),
                r.start.to_string(),
                r.end.to_string(),
                truncate(&r.matched_sequence, MAX_MATCHED_WIDTH),
                r.length.to_string(),
            ]
        })
        .collect();
    let mut widths = COLUMNS.map(|c| c.len());
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    let format_line = |cols: &[&str]| -> String {
        cols.iter()
            .enumerate()
            .map(|(i, c)| format!("{c:<width$}", width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = format_line(&COLUMNS);
    out.push('\n');
    out += &format_line(&widths.map(|w| "-".repeat(w)).each_ref().map(|s| s.as_str()));
    out.push('\n');
    for row in &cells {
        out += &format_line(&row.each_ref().map(|s| s.as_str()));
        out.push('\n');
    }
    out
}

/// Per-motif counts, in order of first appearance.
pub fn render_summary(table: &ResultTable) -> String {
    if table.is_empty() {
        return "No motifs found\n".to_string();
    }
    let counts = table.motif_counts();
    let width = counts.iter().map(|(m, _)| m.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (motif, count) in counts {
        out += &format!("{motif:<width$}  {count}\n");
    }
    out += &format!(
        "{} matches in {} sequences\n",
        table.len(),
        table.sequence_ids().len()
    );
    out
}
