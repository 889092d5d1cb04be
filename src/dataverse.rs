use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{debug, error};

use crate::domain::{Doi, ReleaseType, VersionState};
use crate::error::UpdaterError;

const API_KEY_HEADER: &str = "X-Dataverse-key";

/// Full metadata document of one dataset as fetched from the repository,
/// held only for the duration of the row that requested it.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    data: Value,
}

impl DatasetSnapshot {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    pub fn latest_version(&self) -> Option<&Value> {
        self.data.get("latestVersion")
    }

    /// State of the latest version, if the snapshot carries one. A missing
    /// state usually means the dataset was deaccessioned.
    pub fn version_state(&self) -> Option<VersionState> {
        self.latest_version()
            .and_then(|version| version.get("versionState"))
            .and_then(Value::as_str)
            .map(VersionState::parse)
    }
}

pub trait DataverseClient: Send + Sync {
    fn fetch_dataset(&self, doi: &Doi) -> Result<DatasetSnapshot, UpdaterError>;
    fn update_metadata(&self, doi: &Doi, payload: &Value) -> Result<Value, UpdaterError>;
    fn update_draft_version(&self, doi: &Doi, payload: &Value) -> Result<Value, UpdaterError>;
    fn publish_dataset(&self, doi: &Doi, release_type: ReleaseType) -> Result<Value, UpdaterError>;
}

/// Blocking HTTP client sharing one authenticated session across all rows.
/// Each operation is a single round-trip; there are no retries.
#[derive(Clone)]
pub struct DataverseHttpClient {
    client: Client,
    base_url: String,
}

impl DataverseHttpClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, UpdaterError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(api_key)
                .map_err(|err| UpdaterError::DataverseHttp(err.to_string()))?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("dv-topics/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| UpdaterError::DataverseHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| UpdaterError::DataverseHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn handle_status(
        doi: &Doi,
        operation: &str,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, UpdaterError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "Dataverse request failed".to_string());
        error!(doi = %doi, operation, status, "dataverse request failed: {message}");
        Err(UpdaterError::DataverseStatus { status, message })
    }

    fn data_member(
        doi: &Doi,
        operation: &str,
        response: reqwest::blocking::Response,
    ) -> Result<Value, UpdaterError> {
        let body: Value = response.json().map_err(|err| {
            error!(doi = %doi, operation, "dataverse response was not JSON: {err}");
            UpdaterError::DataverseDecode(err.to_string())
        })?;
        Ok(body.get("data").cloned().unwrap_or_else(|| Value::Object(Default::default())))
    }
}

impl DataverseClient for DataverseHttpClient {
    fn fetch_dataset(&self, doi: &Doi) -> Result<DatasetSnapshot, UpdaterError> {
        debug!(doi = %doi, "fetching dataset metadata");
        let response = self
            .client
            .get(self.endpoint("/api/datasets/:persistentId/"))
            .query(&[("persistentId", doi.as_str())])
            .send()
            .map_err(|err| UpdaterError::DataverseHttp(err.to_string()))?;
        let response = Self::handle_status(doi, "fetch", response)?;
        let data = Self::data_member(doi, "fetch", response)?;
        Ok(DatasetSnapshot::new(data))
    }

    fn update_metadata(&self, doi: &Doi, payload: &Value) -> Result<Value, UpdaterError> {
        debug!(doi = %doi, "updating dataset metadata");
        let body = serde_json::to_string(payload)
            .map_err(|err| UpdaterError::DataverseDecode(err.to_string()))?;
        let response = self
            .client
            .put(self.endpoint("/api/datasets/:persistentId/metadata"))
            .query(&[("persistentId", doi.as_str()), ("replace", "false")])
            .header(CONTENT_TYPE, "application/ld+json")
            .body(body)
            .send()
            .map_err(|err| UpdaterError::DataverseHttp(err.to_string()))?;
        let response = Self::handle_status(doi, "update", response)?;
        Self::data_member(doi, "update", response)
    }

    fn update_draft_version(&self, doi: &Doi, payload: &Value) -> Result<Value, UpdaterError> {
        debug!(doi = %doi, "replacing draft version document");
        let response = self
            .client
            .put(self.endpoint("/api/datasets/:persistentId/versions/:draft"))
            .query(&[("persistentId", doi.as_str())])
            .json(payload)
            .send()
            .map_err(|err| UpdaterError::DataverseHttp(err.to_string()))?;
        let response = Self::handle_status(doi, "update", response)?;
        Self::data_member(doi, "update", response)
    }

    fn publish_dataset(&self, doi: &Doi, release_type: ReleaseType) -> Result<Value, UpdaterError> {
        debug!(doi = %doi, %release_type, "publishing dataset");
        let release = release_type.to_string();
        let response = self
            .client
            .post(self.endpoint("/api/datasets/:persistentId/actions/:publish"))
            .query(&[("persistentId", doi.as_str()), ("type", release.as_str())])
            .send()
            .map_err(|err| UpdaterError::DataverseHttp(err.to_string()))?;
        let response = Self::handle_status(doi, "publish", response)?;
        Self::data_member(doi, "publish", response)
    }
}
