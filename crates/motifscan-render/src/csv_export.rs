use csv::{QuoteStyle, WriterBuilder};
use motifscan_protocol::{COLUMNS, ResultTable};
use std::io::Write;

/// Writes the table as CSV. The header is always written, so an empty table
/// still yields its schema. Every field is quoted so that matched sequences
/// are never mistaken for numbers by spreadsheet readers.
pub fn write_csv<W: Write>(table: &ResultTable, writer: W) -> csv::Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);
    wtr.write_record(COLUMNS)?;
    for row in table.rows() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn table_to_csv(table: &ResultTable) -> csv::Result<String> {
    let mut buffer = vec![];
    write_csv(table, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use motifscan_protocol::MotifMatch;

    #[test]
    fn test_empty_table_has_header() {
        let csv = table_to_csv(&ResultTable::new()).unwrap();
        assert_eq!(
            csv.trim_end(),
            "\"Sequence ID\",\"Motif\",\"Start\",\"End\",\"Matched Sequence\",\"Length\""
        );
    }

    #[test]
    fn test_rows_are_quoted() {
        let seq = b"CGCGCGCGCGCGCGCG";
        let mut table = ResultTable::new();
        table.push_matches(
            "chr1",
            seq.len(),
            vec![MotifMatch::from_span("Z-DNA", seq, 0, 16)],
        );
        let csv = table_to_csv(&table).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "\"chr1\",\"Z-DNA\",\"1\",\"16\",\"CGCGCGCGCGCGCGCG\",\"16\""
        );
    }

    #[test]
    fn test_round_trip_through_reader() {
        let seq = b"AAAACCAAAA";
        let mut table = ResultTable::new();
        table.push_matches(
            "r, with comma",
            seq.len(),
            vec![MotifMatch::from_span("R-Loop", seq, 0, 10)],
        );
        let csv = table_to_csv(&table).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), COLUMNS.to_vec());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "r, with comma");
        assert_eq!(&record[4], "AAAACCAAAA");
    }
}
