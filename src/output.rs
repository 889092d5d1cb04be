use std::io::{self, Write};
use std::path::Path;

use crate::app::{ProgressEvent, ProgressSink};
use crate::report::RunReport;

/// Per-row progress lines and the end-of-run summary on stdout.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn print_banner(total: usize) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "Updating topic classifications for {total} datasets...")?;
        Ok(())
    }

    pub fn print_summary(
        report: &RunReport,
        log_path: &Path,
        report_path: &Path,
    ) -> io::Result<()> {
        let summary = report.summary();
        let mut stdout = io::stdout();
        writeln!(stdout)?;
        writeln!(
            stdout,
            "Done: {} succeeded, {} partially succeeded, {} failed.",
            summary.success, summary.partial, summary.failure
        )?;
        writeln!(stdout, " - log:    {}", log_path.display())?;
        writeln!(stdout, " - report: {}", report_path.display())?;
        Ok(())
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        println!("[{}/{}] {}", event.index, event.total, event.message);
    }
}

/// Sink that swallows progress events.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn event(&self, _event: ProgressEvent) {}
}
