use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use serde_json::{Value, json};

use dataverse_topic_updater::app::{App, PipelineOptions};
use dataverse_topic_updater::dataverse::{DataverseClient, DatasetSnapshot};
use dataverse_topic_updater::domain::{
    Doi, Outcome, ReleaseType, RowOutcome, Stage, UpdateStrategy,
};
use dataverse_topic_updater::error::UpdaterError;
use dataverse_topic_updater::input::InputRow;
use dataverse_topic_updater::output::NullSink;

#[derive(Default)]
struct MockState {
    version_states: HashMap<String, String>,
    fetch_failures: Vec<String>,
    update_failures: Vec<String>,
    publish_failures: Vec<String>,
    panic_on_update: Vec<String>,
    calls: Mutex<Vec<String>>,
    last_draft_payload: Mutex<Option<Value>>,
}

#[derive(Default, Clone)]
struct MockDataverse {
    state: Arc<MockState>,
}

impl MockDataverse {
    fn with_state(doi: &str, version_state: &str) -> Self {
        mock_with(|state| {
            state
                .version_states
                .insert(doi.to_string(), version_state.to_string());
        })
    }

    fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }

    fn record(&self, operation: &str, doi: &Doi) {
        self.state
            .calls
            .lock()
            .unwrap()
            .push(format!("{operation} {doi}"));
    }
}

fn mock_with(configure: impl FnOnce(&mut MockState)) -> MockDataverse {
    let mut state = MockState::default();
    configure(&mut state);
    MockDataverse {
        state: Arc::new(state),
    }
}

impl DataverseClient for MockDataverse {
    fn fetch_dataset(&self, doi: &Doi) -> Result<DatasetSnapshot, UpdaterError> {
        self.record("fetch", doi);
        if self.state.fetch_failures.iter().any(|d| d == doi.as_str()) {
            return Err(UpdaterError::DataverseStatus {
                status: 404,
                message: "dataset not found".to_string(),
            });
        }
        let version_state = self
            .state
            .version_states
            .get(doi.as_str())
            .cloned()
            .unwrap_or_else(|| "RELEASED".to_string());
        Ok(DatasetSnapshot::new(json!({
            "id": 42,
            "latestVersion": {
                "id": 7,
                "versionState": version_state,
                "versionNumber": 1,
                "files": [],
                "metadataBlocks": {
                    "citation": {
                        "displayName": "Citation Metadata",
                        "fields": [
                            {"typeName": "title", "value": "A study"},
                            {
                                "typeName": "topicClassification",
                                "multiple": true,
                                "typeClass": "compound",
                                "value": [{"topicClassValue": {"value": "OLD"}}],
                            },
                        ],
                    },
                },
            },
        })))
    }

    fn update_metadata(&self, doi: &Doi, _payload: &Value) -> Result<Value, UpdaterError> {
        self.record("update", doi);
        if self.state.panic_on_update.iter().any(|d| d == doi.as_str()) {
            panic!("mock exploded for {doi}");
        }
        if self.state.update_failures.iter().any(|d| d == doi.as_str()) {
            return Err(UpdaterError::DataverseStatus {
                status: 400,
                message: "bad update".to_string(),
            });
        }
        Ok(json!({}))
    }

    fn update_draft_version(&self, doi: &Doi, payload: &Value) -> Result<Value, UpdaterError> {
        self.record("update", doi);
        *self.state.last_draft_payload.lock().unwrap() = Some(payload.clone());
        if self.state.update_failures.iter().any(|d| d == doi.as_str()) {
            return Err(UpdaterError::DataverseStatus {
                status: 400,
                message: "bad update".to_string(),
            });
        }
        Ok(json!({}))
    }

    fn publish_dataset(&self, doi: &Doi, _release_type: ReleaseType) -> Result<Value, UpdaterError> {
        self.record("publish", doi);
        if self.state.publish_failures.iter().any(|d| d == doi.as_str()) {
            return Err(UpdaterError::DataverseStatus {
                status: 500,
                message: "publish rejected".to_string(),
            });
        }
        Ok(json!({}))
    }
}

fn row(doi: &str, topics: &str) -> InputRow {
    InputRow {
        dataset_id: None,
        title: None,
        url: None,
        doi: doi.to_string(),
        topics: topics.to_string(),
    }
}

fn run_rows(client: MockDataverse, rows: &[InputRow]) -> Vec<RowOutcome> {
    let app = App::new(client, PipelineOptions::default());
    app.run(rows, &NullSink).outcomes().to_vec()
}

#[test]
fn draft_dataset_is_updated_but_not_published() {
    let client = MockDataverse::with_state("doi:10.1/draft", "DRAFT");
    let outcomes = run_rows(client.clone(), &[row("doi:10.1/draft", "A;v;u")]);

    assert_matches!(
        &outcomes[0].outcome,
        Outcome::Success { note: Some(note) } if note == "draft, no publish needed"
    );
    assert_eq!(
        client.calls(),
        vec!["fetch doi:10.1/draft", "update doi:10.1/draft"]
    );
}

#[test]
fn released_dataset_is_updated_and_published() {
    let client = MockDataverse::with_state("doi:10.1/rel", "RELEASED");
    let outcomes = run_rows(client.clone(), &[row("doi:10.1/rel", "A;v;u")]);

    assert_matches!(&outcomes[0].outcome, Outcome::Success { note: None });
    assert_eq!(
        client.calls(),
        vec![
            "fetch doi:10.1/rel",
            "update doi:10.1/rel",
            "publish doi:10.1/rel"
        ]
    );
}

#[test]
fn failed_publish_is_a_partial_success() {
    let client = mock_with(|state| {
        state
            .version_states
            .insert("doi:10.1/rel".to_string(), "RELEASED".to_string());
        state.publish_failures.push("doi:10.1/rel".to_string());
    });
    let outcomes = run_rows(client, &[row("doi:10.1/rel", "A;v;u")]);

    assert_matches!(&outcomes[0].outcome, Outcome::PartialSuccess { reason } if reason.contains("publish failed"));
}

#[test]
fn empty_classification_cell_makes_no_remote_calls() {
    let client = MockDataverse::default();
    let outcomes = run_rows(client.clone(), &[row("doi:10.1/x", "  ")]);

    assert_matches!(
        &outcomes[0].outcome,
        Outcome::Failure { stage: Stage::Validation, .. }
    );
    assert!(client.calls().is_empty());
}

#[test]
fn unparseable_doi_is_a_validation_failure() {
    let client = MockDataverse::default();
    let outcomes = run_rows(client.clone(), &[row("not-a-doi", "A;v;u")]);

    assert_matches!(
        &outcomes[0].outcome,
        Outcome::Failure { stage: Stage::Validation, .. }
    );
    assert!(client.calls().is_empty());
}

#[test]
fn failed_update_is_terminal_for_the_row() {
    let client = mock_with(|state| {
        state.update_failures.push("doi:10.1/x".to_string());
    });
    let outcomes = run_rows(client.clone(), &[row("doi:10.1/x", "A;v;u")]);

    assert_matches!(
        &outcomes[0].outcome,
        Outcome::Failure { stage: Stage::Update, .. }
    );
    assert_eq!(client.calls(), vec!["fetch doi:10.1/x", "update doi:10.1/x"]);
}

#[test]
fn three_row_batch_reports_outcomes_in_input_order() {
    let client = mock_with(|state| {
        state
            .version_states
            .insert("doi:10.1/draft".to_string(), "DRAFT".to_string());
        state
            .version_states
            .insert("doi:10.1/rel".to_string(), "RELEASED".to_string());
        state.fetch_failures.push("doi:10.1/gone".to_string());
    });
    let rows = vec![
        row("doi:10.1/draft", "A;v;u"),
        row("doi:10.1/rel", "B;w;x"),
        row("doi:10.1/gone", "C;y;z"),
    ];

    let app = App::new(client, PipelineOptions::default());
    let report = app.run(&rows, &NullSink);

    let outcomes = report.outcomes();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].doi, "doi:10.1/draft");
    assert_matches!(&outcomes[0].outcome, Outcome::Success { note: Some(_) });
    assert_eq!(outcomes[1].doi, "doi:10.1/rel");
    assert_matches!(&outcomes[1].outcome, Outcome::Success { note: None });
    assert_eq!(outcomes[2].doi, "doi:10.1/gone");
    assert_matches!(
        &outcomes[2].outcome,
        Outcome::Failure { stage: Stage::Fetch, .. }
    );

    let summary = report.summary();
    assert_eq!(summary.success, 2);
    assert_eq!(summary.failure, 1);
}

#[test]
fn panicking_row_does_not_stop_the_batch() {
    let client = mock_with(|state| {
        state.panic_on_update.push("doi:10.1/boom".to_string());
    });
    let rows = vec![row("doi:10.1/boom", "A;v;u"), row("doi:10.1/ok", "B;w;x")];

    let outcomes = run_rows(client, &rows);

    assert_matches!(
        &outcomes[0].outcome,
        Outcome::Failure { stage: Stage::Unknown, .. }
    );
    assert_matches!(&outcomes[1].outcome, Outcome::Success { .. });
}

#[test]
fn missing_version_state_is_a_fetch_failure() {
    #[derive(Clone)]
    struct NoStateClient;

    impl DataverseClient for NoStateClient {
        fn fetch_dataset(&self, _doi: &Doi) -> Result<DatasetSnapshot, UpdaterError> {
            Ok(DatasetSnapshot::new(json!({"id": 42})))
        }
        fn update_metadata(&self, _doi: &Doi, _payload: &Value) -> Result<Value, UpdaterError> {
            unreachable!("update must not run without a version state")
        }
        fn update_draft_version(
            &self,
            _doi: &Doi,
            _payload: &Value,
        ) -> Result<Value, UpdaterError> {
            unreachable!("update must not run without a version state")
        }
        fn publish_dataset(
            &self,
            _doi: &Doi,
            _release_type: ReleaseType,
        ) -> Result<Value, UpdaterError> {
            unreachable!("publish must not run without a version state")
        }
    }

    let app = App::new(NoStateClient, PipelineOptions::default());
    let report = app.run(&[row("doi:10.1/x", "A;v;u")], &NullSink);

    assert_matches!(
        &report.outcomes()[0].outcome,
        Outcome::Failure { stage: Stage::Fetch, .. }
    );
}

#[test]
fn draft_strategy_sends_a_cleaned_snapshot_with_replaced_topics() {
    let client = MockDataverse::with_state("doi:10.1/x", "DRAFT");
    let app = App::new(
        client.clone(),
        PipelineOptions {
            strategy: UpdateStrategy::Draft,
            release_type: ReleaseType::Minor,
        },
    );
    let report = app.run(&[row("doi:10.1/x", "A;v;u")], &NullSink);
    assert_matches!(&report.outcomes()[0].outcome, Outcome::Success { .. });

    let payload = client
        .state
        .last_draft_payload
        .lock()
        .unwrap()
        .clone()
        .expect("draft strategy must send the version document");
    assert!(payload.get("versionState").is_none());
    assert!(payload.get("files").is_none());
    let fields = payload["metadataBlocks"]["citation"]["fields"]
        .as_array()
        .unwrap();
    assert_eq!(fields.len(), 2);
    let topics = &fields[1];
    assert_eq!(topics["typeName"], "topicClassification");
    assert_eq!(topics["value"][0]["topicClassValue"]["value"], "A");
    assert_eq!(topics["value"].as_array().unwrap().len(), 1);
}
