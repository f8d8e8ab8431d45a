use motifscan_protocol::ResultTable;
use std::collections::HashMap;
use svg::Document;
use svg::node::element::{Circle, Line, Rectangle, Text};

const W: f32 = 1200.0;
const MARGIN_LEFT: f32 = 180.0;
const MARGIN_RIGHT: f32 = 220.0;
const MARGIN_TOP: f32 = 60.0;
const MARGIN_BOTTOM: f32 = 50.0;
const LANE_HEIGHT: f32 = 28.0;
const FONT: &str = "Helvetica, Arial, sans-serif";

const PALETTE: [&str; 12] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf", "#393b79", "#637939",
];

fn motif_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Scatter chart of motif occurrences: x = start position, one lane per
/// sequence identifier, colored by motif, with a legend on the right.
pub fn export_motif_chart_svg(table: &ResultTable) -> String {
    let lanes = table.sequence_ids();
    let motifs = table.motifs();
    let lane_of: HashMap<&str, usize> = lanes.iter().enumerate().map(|(i, l)| (*l, i)).collect();
    let motif_of: HashMap<&str, usize> = motifs.iter().enumerate().map(|(i, m)| (*m, i)).collect();
    let lane_count = lanes.len().max(1) as f32;
    let h = MARGIN_TOP + MARGIN_BOTTOM + lane_count * LANE_HEIGHT;
    let plot_w = W - MARGIN_LEFT - MARGIN_RIGHT;
    let max_x = table
        .rows()
        .iter()
        .map(|r| r.end.max(r.length))
        .max()
        .unwrap_or(1)
        .max(1) as f32;
    let x_of = |pos: usize| MARGIN_LEFT + plot_w * (pos as f32 / max_x);

    let mut doc = Document::new()
        .set("viewBox", (0, 0, W, h))
        .set("width", W)
        .set("height", h)
        .set("style", "background:#ffffff");

    doc = doc.add(
        Text::new("Structural DNA motifs")
            .set("x", 24)
            .set("y", 34)
            .set("font-family", FONT)
            .set("font-size", 20)
            .set("fill", "#202020"),
    );

    if table.is_empty() {
        return doc
            .add(
                Text::new("No motifs found")
                    .set("x", W / 2.0)
                    .set("y", MARGIN_TOP + LANE_HEIGHT / 2.0)
                    .set("text-anchor", "middle")
                    .set("font-family", FONT)
                    .set("font-size", 14)
                    .set("fill", "#606060"),
            )
            .to_string();
    }

    for (idx, lane) in lanes.iter().enumerate() {
        let y = MARGIN_TOP + (idx as f32 + 0.5) * LANE_HEIGHT;
        doc = doc
            .add(
                Line::new()
                    .set("x1", MARGIN_LEFT)
                    .set("y1", y)
                    .set("x2", MARGIN_LEFT + plot_w)
                    .set("y2", y)
                    .set("stroke", "#e4e4e4")
                    .set("stroke-width", 1),
            )
            .add(
                Text::new(lane.to_string())
                    .set("x", MARGIN_LEFT - 8.0)
                    .set("y", y)
                    .set("text-anchor", "end")
                    .set("dominant-baseline", "middle")
                    .set("font-family", FONT)
                    .set("font-size", 11)
                    .set("fill", "#101010"),
            );
    }

    let axis_y = MARGIN_TOP + lane_count * LANE_HEIGHT + 8.0;
    doc = doc
        .add(
            Line::new()
                .set("x1", MARGIN_LEFT)
                .set("y1", axis_y)
                .set("x2", MARGIN_LEFT + plot_w)
                .set("y2", axis_y)
                .set("stroke", "#8a8a8a")
                .set("stroke-width", 1),
        )
        .add(
            Text::new("1")
                .set("x", MARGIN_LEFT)
                .set("y", axis_y + 16.0)
                .set("text-anchor", "middle")
                .set("font-family", FONT)
                .set("font-size", 10)
                .set("fill", "#404040"),
        )
        .add(
            Text::new(format!("{}", max_x as usize))
                .set("x", MARGIN_LEFT + plot_w)
                .set("y", axis_y + 16.0)
                .set("text-anchor", "middle")
                .set("font-family", FONT)
                .set("font-size", 10)
                .set("fill", "#404040"),
        );

    for row in table.rows() {
        let (Some(&lane), Some(&motif_idx)) = (
            lane_of.get(row.sequence_id.as_str()),
            motif_of.get(row.motif.as_str()),
        ) else {
            continue;
        };
        let y = MARGIN_TOP + (lane as f32 + 0.5) * LANE_HEIGHT;
        let color = motif_color(motif_idx);
        let x = x_of(row.start);
        let span_w = (x_of(row.end) - x).max(1.0);
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", x)
                    .set("y", y - 2.0)
                    .set("width", span_w)
                    .set("height", 4)
                    .set("fill", color)
                    .set("fill-opacity", 0.35),
            )
            .add(
                Circle::new()
                    .set("cx", x)
                    .set("cy", y)
                    .set("r", 4)
                    .set("fill", color)
                    .set("stroke", "#303030")
                    .set("stroke-width", 0.5),
            );
    }

    let legend_x = W - MARGIN_RIGHT + 24.0;
    for (idx, motif) in motifs.iter().enumerate() {
        let y = MARGIN_TOP + idx as f32 * 18.0;
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", legend_x)
                    .set("y", y - 5.0)
                    .set("width", 10)
                    .set("height", 10)
                    .set("fill", motif_color(idx)),
            )
            .add(
                Text::new(motif.to_string())
                    .set("x", legend_x + 16.0)
                    .set("y", y)
                    .set("dominant-baseline", "middle")
                    .set("font-family", FONT)
                    .set("font-size", 11)
                    .set("fill", "#101010"),
            );
    }

    doc.to_string()
}
