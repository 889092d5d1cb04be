use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::{Outcome, RowOutcome};
use crate::error::UpdaterError;

/// Append-only record of one run, in row-processing order.
#[derive(Debug, Default)]
pub struct RunReport {
    outcomes: Vec<RowOutcome>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub success: usize,
    pub partial: usize,
    pub failure: usize,
}

#[derive(Serialize)]
struct ReportRecord<'a> {
    #[serde(rename = "DOI")]
    doi: &'a str,
    #[serde(rename = "Success")]
    success: &'a str,
    #[serde(rename = "ErrorReason")]
    error_reason: &'a str,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: RowOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[RowOutcome] {
        &self.outcomes
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for row in &self.outcomes {
            match &row.outcome {
                Outcome::Success { .. } => summary.success += 1,
                Outcome::PartialSuccess { .. } => summary.partial += 1,
                Outcome::Failure { .. } => summary.failure += 1,
            }
        }
        summary
    }

    /// Writes the results table: one row per DOI with columns
    /// DOI, Success (true/partial/false), ErrorReason.
    pub fn write_csv(&self, path: &Path) -> Result<(), UpdaterError> {
        let to_report_error = |message: String| UpdaterError::ReportWrite {
            path: path.to_path_buf(),
            message,
        };

        let mut writer =
            csv::Writer::from_path(path).map_err(|err| to_report_error(err.to_string()))?;
        for row in &self.outcomes {
            let (success, reason) = match &row.outcome {
                Outcome::Success { .. } => ("true", String::new()),
                Outcome::PartialSuccess { reason } => ("partial", reason.clone()),
                Outcome::Failure { stage, reason } => ("false", format!("{stage}: {reason}")),
            };
            writer
                .serialize(ReportRecord {
                    doi: &row.doi,
                    success,
                    error_reason: &reason,
                })
                .map_err(|err| to_report_error(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| to_report_error(err.to_string()))?;

        let summary = self.summary();
        info!(
            path = %path.display(),
            success = summary.success,
            partial = summary.partial,
            failure = summary.failure,
            "wrote run report"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{Outcome, Stage};

    use super::*;

    fn sample_report() -> RunReport {
        let mut report = RunReport::new();
        report.record(RowOutcome {
            doi: "doi:10.1/a".to_string(),
            outcome: Outcome::success(),
        });
        report.record(RowOutcome {
            doi: "doi:10.1/b".to_string(),
            outcome: Outcome::partial("publish failed: 500"),
        });
        report.record(RowOutcome {
            doi: "doi:10.1/c".to_string(),
            outcome: Outcome::failure(Stage::Fetch, "status 404"),
        });
        report
    }

    #[test]
    fn summary_counts_each_kind() {
        let summary = sample_report().summary();
        assert_eq!(summary.success, 1);
        assert_eq!(summary.partial, 1);
        assert_eq!(summary.failure, 1);
    }

    #[test]
    fn outcomes_keep_processing_order() {
        let report = sample_report();
        let dois: Vec<&str> = report.outcomes().iter().map(|row| row.doi.as_str()).collect();
        assert_eq!(dois, vec!["doi:10.1/a", "doi:10.1/b", "doi:10.1/c"]);
    }

    #[test]
    fn csv_has_expected_columns_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        sample_report().write_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("DOI,Success,ErrorReason"));
        assert_eq!(lines.next(), Some("doi:10.1/a,true,"));
        assert_eq!(lines.next(), Some("doi:10.1/b,partial,publish failed: 500"));
        assert_eq!(lines.next(), Some("doi:10.1/c,false,fetch: status 404"));
    }
}
