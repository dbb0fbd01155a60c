//! Human-facing progress output.
//!
//! None of this is a compatibility contract: the exact text, spacing and
//! carriage-return behavior may change freely. `tracing` events carry the same
//! information in structured form for non-interactive contexts (see the
//! `debug!` calls alongside these).

use std::io::Write;
use yansi::Paint;

/// One rewritten status line describing scheduler progress.
pub struct Progress {
    pub waiting: usize,
    pub scheduled: usize,
    pub running: usize,
    pub lines_done: u64,
    pub lines_total: u64,
    pub elapsed_secs: f64,
}

impl Progress {
    /// Estimated time remaining, or `None` if no work has completed yet.
    ///
    /// Reported as `Option<f64>` rather than an actual `f64::NAN`: NaN compares
    /// unequal to itself and silently poisons any downstream arithmetic, so the
    /// "no data yet" case is made explicit instead.
    pub fn eta_secs(&self) -> Option<f64> {
        if self.lines_done == 0 || self.lines_total == 0 {
            None
        } else {
            let fraction = self.lines_done as f64 / self.lines_total as f64;
            Some(self.elapsed_secs / fraction)
        }
    }

    pub fn percent(&self) -> f64 {
        if self.lines_total == 0 {
            0.0
        } else {
            100.0 * self.lines_done as f64 / self.lines_total as f64
        }
    }

    /// Writes the carriage-return-terminated status line to `out`.
    pub fn write_line(&self, mut out: impl Write) {
        let eta = self.eta_secs().map(|e| format!("{e:.1}")).unwrap_or_else(|| "?".into());
        let _ = write!(
            out,
            "\x1b[2K\rProgress: {} waiting, {} scheduled, {} running, \
             {}/{} lines ({}%), Elapsed/ETA: {:.1}/{} s",
            self.waiting,
            self.scheduled,
            self.running,
            self.lines_done,
            self.lines_total,
            Paint::green(format!("{:.1}", self.percent())),
            self.elapsed_secs,
            eta,
        );
        let _ = out.flush();
    }
}

/// Clears the current status line and prints a full line below it.
pub fn announce(out: &mut impl Write, message: impl std::fmt::Display) {
    let _ = writeln!(out, "\x1b[2K\r{}", Paint::new(message));
}

/// A single completed compilation's timing, retained for the optional `DEBUG` table.
#[derive(Debug, Clone)]
pub struct Timing {
    pub source: String,
    pub wall_secs: f64,
    pub line_count: usize,
}

/// Prints the 20 slowest sources, gated on the `DEBUG` environment variable.
pub fn print_slowest(mut timings: Vec<Timing>) {
    timings.sort_by(|a, b| b.wall_secs.partial_cmp(&a.wall_secs).unwrap());
    timings.truncate(20);
    let Some(name_width) = timings.iter().map(|t| t.source.len()).max() else { return };
    println!("{:<width$}    {:<8}  {:<6}", "File", "Time [s]", "Lines", width = name_width + 2);
    for t in &timings {
        println!(
            "  {:<width$}  {:>6.2}  {:>6}",
            t.source,
            t.wall_secs,
            t.line_count,
            width = name_width + 2
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eta_is_none_before_any_progress() {
        let p = Progress {
            waiting: 1,
            scheduled: 0,
            running: 0,
            lines_done: 0,
            lines_total: 10,
            elapsed_secs: 1.0,
        };
        assert_eq!(p.eta_secs(), None);
    }

    #[test]
    fn eta_scales_with_remaining_fraction() {
        let p = Progress {
            waiting: 0,
            scheduled: 0,
            running: 0,
            lines_done: 5,
            lines_total: 10,
            elapsed_secs: 10.0,
        };
        assert_eq!(p.eta_secs(), Some(20.0));
    }
}
