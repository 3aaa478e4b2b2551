//! The live reporter: redraw the table in place at 20 Hz.
//!
//! Each redraw locks every report slot just long enough to snapshot it,
//! moves the cursor up over the previous frame, clears to the end of the
//! screen, and reprints. The final summary after all threads join is
//! rendered without any cursor control.

use std::io::Write;
use std::time::{Duration, Instant};

use crate::runtime;
use crate::statistics::ReportSlot;

use super::table::{format_hms_ns, Table};

/// 20 Hz redraw pacing.
pub const REPORT_INTERVAL: Duration = Duration::from_millis(50);

/// ANSI: cursor up `lines`, then clear to end of screen.
fn erase_frame(lines: usize) -> String {
    if lines == 0 {
        String::new()
    } else {
        format!("\x1b[{lines}A\x1b[J")
    }
}

/// Render one full frame; returns the text and its line count.
pub fn render_report(
    table: &Table,
    slots: &[&ReportSlot],
    elapsed: Duration,
) -> (String, usize) {
    let rows: Vec<_> = slots
        .iter()
        .map(|slot| (slot.label(), slot.snapshot()))
        .collect();

    let mut frame = table.render(&rows);
    frame.push_str(&format!(
        "Elapsed: {}\n",
        format_hms_ns(elapsed.as_nanos() as u64)
    ));
    for (label, snap) in &rows {
        if let Some(summary) = table.max_summary(label, snap) {
            frame.push_str(&summary);
            frame.push('\n');
        }
    }
    let lines = frame.lines().count();
    (frame, lines)
}

/// Body of the reporter thread. Returns the line count of the last frame so
/// the final plain summary can replace it.
pub fn live_report_loop(table: &Table, slots: &[&ReportSlot], start: Instant) -> usize {
    let mut previous_lines = 0usize;
    let stdout = std::io::stdout();
    while runtime::live_report_enabled() {
        let (frame, lines) = render_report(table, slots, start.elapsed());
        let mut out = stdout.lock();
        let _ = write!(out, "{}{}", erase_frame(previous_lines), frame);
        let _ = out.flush();
        previous_lines = lines;
        std::thread::sleep(REPORT_INTERVAL);
    }
    previous_lines
}

/// Replace the last live frame with the closing summary, ANSI-free except
/// for the one erase of the live output.
pub fn print_final(table: &Table, slots: &[&ReportSlot], start: Instant, live_lines: usize) {
    let (frame, _) = render_report(table, slots, start.elapsed());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let _ = write!(out, "{}{}", erase_frame(live_lines), frame);
    let _ = writeln!(out, "{}", table.band_legend());
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::{ReportSlot, TimerReport};

    #[test]
    fn frame_line_count_matches_rendered_text() {
        let table = Table::new(125_000);
        let cyclic = ReportSlot::new("Cyclic", TimerReport::new(1_000_000, 125_000));
        cyclic.lock().add_observation(1_000_500, 1);
        let (frame, lines) = render_report(&table, &[&cyclic], Duration::from_millis(1500));
        assert_eq!(frame.lines().count(), lines);
        // Header + row + elapsed + one max summary.
        assert_eq!(lines, 4);
        assert!(frame.contains("Elapsed: 00:00:01.500"));
    }

    #[test]
    fn empty_reports_render_without_summaries() {
        let table = Table::new(125_000);
        let sender = ReportSlot::new("Sender", TimerReport::new(1_000_000, 125_000));
        let receiver = ReportSlot::new("Receiver", TimerReport::new(1_000_000, 125_000));
        let (frame, lines) = render_report(&table, &[&sender, &receiver], Duration::ZERO);
        // Header + two rows + elapsed, no max lines yet.
        assert_eq!(lines, 4);
        assert!(frame.contains("Sender"));
        assert!(frame.contains("Receiver"));
    }

    #[test]
    fn erase_frame_is_silent_on_first_draw() {
        assert_eq!(erase_frame(0), "");
        assert_eq!(erase_frame(7), "\x1b[7A\x1b[J");
    }
}
