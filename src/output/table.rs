//! Tabular rendering of report snapshots.
//!
//! Column widths are recomputed from the live data on every redraw so the
//! table never jumps as counts grow.

use crate::statistics::{band_edges, ReportSnapshot, BAND_COUNT, BAND_LABELS};

const NANOS_PER_MICRO: u64 = 1_000;
const COLUMN_GAP: &str = "  ";

/// Microseconds with one decimal, computed in integer arithmetic.
pub fn format_us(ns: u64) -> String {
    format!("{}.{}", ns / NANOS_PER_MICRO, (ns % NANOS_PER_MICRO) / 100)
}

/// `HH:MM:SS.mmm` out of a nanosecond total.
pub fn format_hms_ns(total_ns: u64) -> String {
    let hours = total_ns / (3600 * 1_000_000_000);
    let minutes = (total_ns / (60 * 1_000_000_000)) % 60;
    let seconds = (total_ns / 1_000_000_000) % 60;
    let millis = (total_ns / 1_000_000) % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Renderer for the severity table.
#[derive(Debug, Clone)]
pub struct Table {
    bucket_width_ns: u64,
}

impl Table {
    pub fn new(bucket_width_ns: u64) -> Self {
        Self { bucket_width_ns }
    }

    /// Bucket column headers derived from the width: `<125us`, ...,
    /// `>=1000us`.
    pub fn bucket_headers(&self) -> [String; BAND_COUNT] {
        let edges = band_edges(self.bucket_width_ns);
        [
            format!("<{}us", edges[0] / NANOS_PER_MICRO),
            format!("<{}us", edges[1] / NANOS_PER_MICRO),
            format!("<{}us", edges[2] / NANOS_PER_MICRO),
            format!("<{}us", edges[3] / NANOS_PER_MICRO),
            format!(">={}us", edges[3] / NANOS_PER_MICRO),
        ]
    }

    /// Render the header plus one row per snapshot.
    pub fn render(&self, rows: &[(&'static str, ReportSnapshot)]) -> String {
        let buckets = self.bucket_headers();
        let mut header: Vec<String> = vec![String::new(), "Samples".to_string()];
        header.extend(buckets.iter().cloned());
        header.extend(
            ["p50 (us)", "p99 (us)", "Max (us)", "Iter"]
                .iter()
                .map(|s| s.to_string()),
        );

        let mut body: Vec<Vec<String>> = Vec::with_capacity(rows.len());
        for (label, snap) in rows {
            let mut cells = vec![label.to_string(), snap.samples.to_string()];
            cells.extend(snap.buckets.iter().map(u64::to_string));
            cells.push(format_us(snap.p50_deviation_ns));
            cells.push(format_us(snap.p99_deviation_ns));
            cells.push(format_us(snap.max_period_ns));
            cells.push(snap.max_index.to_string());
            body.push(cells);
        }

        let mut widths: Vec<usize> = header.iter().map(String::len).collect();
        for row in &body {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let mut out = String::new();
        render_line(&mut out, &header, &widths);
        for row in &body {
            render_line(&mut out, row, &widths);
        }
        out
    }

    /// One-line legend naming the severity bands.
    pub fn band_legend(&self) -> String {
        let edges = band_edges(self.bucket_width_ns);
        format!(
            "Bands: {} < {} us, {} < {} us, {} < {} us, {} < {} us, {} >= {} us",
            BAND_LABELS[0],
            edges[0] / NANOS_PER_MICRO,
            BAND_LABELS[1],
            edges[1] / NANOS_PER_MICRO,
            BAND_LABELS[2],
            edges[2] / NANOS_PER_MICRO,
            BAND_LABELS[3],
            edges[3] / NANOS_PER_MICRO,
            BAND_LABELS[4],
            edges[3] / NANOS_PER_MICRO,
        )
    }

    /// Per-row closing summary: the worst period and where it happened.
    pub fn max_summary(&self, label: &str, snap: &ReportSnapshot) -> Option<String> {
        if snap.samples == 0 {
            return None;
        }
        Some(format!(
            "{label} max period: {} us (iteration {})",
            format_us(snap.max_period_ns),
            snap.max_index
        ))
    }
}

fn render_line(out: &mut String, cells: &[String], widths: &[usize]) {
    for (index, (cell, &width)) in cells.iter().zip(widths).enumerate() {
        if index > 0 {
            out.push_str(COLUMN_GAP);
        }
        // Left-align the label column, right-align the numbers.
        if index == 0 {
            out.push_str(&format!("{cell:<width$}"));
        } else {
            out.push_str(&format!("{cell:>width$}"));
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::TimerReport;

    fn snapshot() -> ReportSnapshot {
        let mut report = TimerReport::new(1_000_000, 125_000);
        report.add_observation(1_001_000, 1);
        report.add_observation(1_400_000, 2);
        report.snapshot()
    }

    #[test]
    fn headers_follow_the_bucket_width() {
        let table = Table::new(125_000);
        assert_eq!(
            table.bucket_headers(),
            ["<125us", "<250us", "<500us", "<1000us", ">=1000us"]
        );
        let table = Table::new(50_000);
        assert_eq!(
            table.bucket_headers(),
            ["<50us", "<100us", "<200us", "<400us", ">=400us"]
        );
    }

    #[test]
    fn render_contains_labels_counts_and_max() {
        let table = Table::new(125_000);
        let text = table.render(&[("Cyclic", snapshot())]);
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("Samples"));
        assert!(header.contains("<125us"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Cyclic"));
        assert!(row.contains('2')); // sample count
        assert!(row.contains("1400.0")); // max period in us
    }

    #[test]
    fn integer_microsecond_formatting() {
        assert_eq!(format_us(0), "0.0");
        assert_eq!(format_us(125_000), "125.0");
        assert_eq!(format_us(1_234_567), "1234.5");
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_hms_ns(0), "00:00:00.000");
        let ns = ((2 * 3600 + 3 * 60 + 4) * 1_000_000_000u64) + 56_000_000;
        assert_eq!(format_hms_ns(ns), "02:03:04.056");
    }

    #[test]
    fn summary_names_the_worst_iteration() {
        let table = Table::new(125_000);
        let line = table.max_summary("Sender", &snapshot()).unwrap();
        assert_eq!(line, "Sender max period: 1400.0 us (iteration 2)");
        let empty = TimerReport::new(1_000_000, 125_000).snapshot();
        assert!(table.max_summary("Sender", &empty).is_none());
    }

    #[test]
    fn legend_spells_out_all_five_bands() {
        let table = Table::new(125_000);
        let legend = table.band_legend();
        for label in BAND_LABELS {
            assert!(legend.contains(label));
        }
        assert!(legend.contains("Great < 125 us"));
        assert!(legend.contains("Pathetic >= 1000 us"));
    }
}
