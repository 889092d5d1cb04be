use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{error, info, warn};

use crate::dataverse::DataverseClient;
use crate::domain::{Doi, Outcome, ReleaseType, RowOutcome, Stage, UpdateStrategy};
use crate::error::UpdaterError;
use crate::input::InputRow;
use crate::metadata::{build_topic_payload, prepare_draft_payload, triplets_from_groups};
use crate::report::RunReport;
use crate::triplets::parse_triplets;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub strategy: UpdateStrategy,
    pub release_type: ReleaseType,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            strategy: UpdateStrategy::Metadata,
            release_type: ReleaseType::Minor,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub index: usize,
    pub total: usize,
    pub message: String,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Drives the per-row update pipeline. Rows are processed strictly
/// sequentially in input order; the client is the only I/O boundary.
pub struct App<C: DataverseClient> {
    client: C,
    options: PipelineOptions,
}

impl<C: DataverseClient> App<C> {
    pub fn new(client: C, options: PipelineOptions) -> Self {
        Self { client, options }
    }

    pub fn run(&self, rows: &[InputRow], sink: &dyn ProgressSink) -> RunReport {
        let mut report = RunReport::new();
        let total = rows.len();

        for (index, row) in rows.iter().enumerate() {
            let outcome = self.process_row(row);
            sink.event(ProgressEvent {
                index: index + 1,
                total,
                message: format!("{}: {}", row.doi, describe(&outcome)),
            });
            report.record(RowOutcome {
                doi: row.doi.clone(),
                outcome,
            });
        }

        report
    }

    /// Row boundary: every failure, including a panic from anywhere inside
    /// the row, becomes an `Outcome` so one bad row never stops the batch.
    fn process_row(&self, row: &InputRow) -> Outcome {
        match catch_unwind(AssertUnwindSafe(|| self.try_row(row))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                error!(doi = %row.doi, "row failed outside a pipeline stage: {err}");
                Outcome::failure(Stage::Unknown, err.to_string())
            }
            Err(panic) => {
                let reason = panic_message(panic);
                error!(doi = %row.doi, "row panicked: {reason}");
                Outcome::failure(Stage::Unknown, reason)
            }
        }
    }

    fn try_row(&self, row: &InputRow) -> Result<Outcome, UpdaterError> {
        // Validate
        if row.topics.trim().is_empty() {
            warn!(doi = %row.doi, "row has no classification triplets, skipping");
            return Ok(Outcome::failure(
                Stage::Validation,
                "row has no classification triplets",
            ));
        }
        let doi = match row.doi.parse::<Doi>() {
            Ok(doi) => doi,
            Err(err) => {
                warn!(doi = %row.doi, "row has no usable DOI, skipping");
                return Ok(Outcome::failure(Stage::Validation, err.to_string()));
            }
        };

        // Fetch
        let snapshot = match self.client.fetch_dataset(&doi) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(doi = %doi, "failed to fetch dataset metadata: {err}");
                return Ok(Outcome::failure(Stage::Fetch, err.to_string()));
            }
        };
        let Some(state) = snapshot.version_state() else {
            error!(doi = %doi, "could not determine the version state");
            return Ok(Outcome::failure(
                Stage::Fetch,
                "could not determine the latest version state",
            ));
        };

        // Transform + update
        let triplets = triplets_from_groups(&parse_triplets(&row.topics));
        let update = match self.options.strategy {
            UpdateStrategy::Metadata => self
                .client
                .update_metadata(&doi, &build_topic_payload(&triplets)),
            UpdateStrategy::Draft => {
                let latest = snapshot.latest_version().ok_or_else(|| {
                    UpdaterError::DataverseDecode("snapshot has no latestVersion".to_string())
                })?;
                self.client
                    .update_draft_version(&doi, &prepare_draft_payload(latest, &triplets))
            }
        };
        if let Err(err) = update {
            error!(doi = %doi, "failed to update dataset metadata: {err}");
            return Ok(Outcome::failure(Stage::Update, err.to_string()));
        }

        // Publish, unless the latest version is still a draft
        if state.is_draft() {
            info!(doi = %doi, "updated; dataset is in draft, no publish needed");
            return Ok(Outcome::success_with_note("draft, no publish needed"));
        }
        match self
            .client
            .publish_dataset(&doi, self.options.release_type)
        {
            Ok(_) => {
                info!(doi = %doi, "updated and published");
                Ok(Outcome::success())
            }
            Err(err) => {
                warn!(doi = %doi, "update succeeded but publish failed: {err}");
                Ok(Outcome::partial(format!("publish failed: {err}")))
            }
        }
    }
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Success { note: Some(note) } => format!("success ({note})"),
        Outcome::Success { note: None } => "success".to_string(),
        Outcome::PartialSuccess { reason } => format!("partial ({reason})"),
        Outcome::Failure { stage, reason } => format!("failed at {stage} ({reason})"),
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic".to_string()
    }
}
