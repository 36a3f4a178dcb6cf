//! Best-effort sync progress on stdout.
//!
//! On a terminal the current counts redraw in place behind a spinner; off a
//! terminal one line is printed every `interval` notes so logs stay readable.

use std::io::{IsTerminal, Write};

use snout_core::{SyncProgress, SyncReport};

const SPINNER_FRAMES: &[char] = &['|', '/', '-', '\\'];

pub struct ProgressPrinter {
    label: &'static str,
    interval: usize,
    is_tty: bool,
    frame: usize,
    last_line_len: usize,
    last_logged: Option<usize>,
}

impl ProgressPrinter {
    pub fn stdout(label: &'static str) -> Self {
        Self {
            label,
            interval: 25,
            is_tty: std::io::stdout().is_terminal(),
            frame: 0,
            last_line_len: 0,
            last_logged: None,
        }
    }

    pub fn update(&mut self, progress: &SyncProgress) {
        if self.is_tty {
            let prefix = SPINNER_FRAMES[self.frame % SPINNER_FRAMES.len()];
            self.frame += 1;
            self.redraw(&self.format_line(progress, &prefix.to_string()));
            return;
        }

        let at_end = progress.processed == progress.total;
        let on_interval = progress.processed % self.interval == 0;
        if (!at_end && !on_interval) || self.last_logged == Some(progress.processed) {
            return;
        }
        self.last_logged = Some(progress.processed);
        println!("{}", self.format_line(progress, "progress"));
    }

    pub fn finish(&mut self, report: &SyncReport) {
        let progress = SyncProgress {
            processed: report.processed,
            total: report.processed,
            updated: report.updated,
            skipped: report.skipped,
            failed: report.failed,
        };
        if self.is_tty {
            self.redraw(&self.format_line(&progress, "done"));
            println!();
        } else {
            println!("{}", self.format_line(&progress, "done"));
        }
    }

    fn format_line(&self, progress: &SyncProgress, prefix: &str) -> String {
        format!(
            "{prefix} {} {}/{} updated:{} skipped:{} failed:{}",
            self.label,
            progress.processed,
            progress.total,
            progress.updated,
            progress.skipped,
            progress.failed
        )
    }

    fn redraw(&mut self, line: &str) {
        let padding = self.last_line_len.saturating_sub(line.len());
        print!("\r{line}{}", " ".repeat(padding));
        let _ = std::io::stdout().flush();
        self.last_line_len = line.len();
    }
}
