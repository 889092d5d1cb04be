use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::UpdaterError;

/// Persistent identifier of a dataset, normalized to the `doi:`-prefixed
/// form Dataverse expects as a `persistentId` query value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Doi(String);

impl Doi {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Doi {
    type Err = UpdaterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let bare = trimmed.strip_prefix("doi:").unwrap_or(trimmed);
        let re = Regex::new(r"^10\.\d+(\.\d+)*/\S+$").unwrap();
        if !re.is_match(bare) {
            return Err(UpdaterError::InvalidDoi(value.to_string()));
        }
        Ok(Self(format!("doi:{bare}")))
    }
}

/// One subject-classification entry: exactly three non-empty components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triplet {
    pub value: String,
    pub vocabulary: String,
    pub vocabulary_uri: String,
}

impl Triplet {
    /// Builds a triplet from a parsed component group. Groups without
    /// exactly three non-empty components yield `None`.
    pub fn from_components(components: &[String]) -> Option<Self> {
        match components {
            [value, vocabulary, uri]
                if !value.is_empty() && !vocabulary.is_empty() && !uri.is_empty() =>
            {
                Some(Self {
                    value: value.clone(),
                    vocabulary: vocabulary.clone(),
                    vocabulary_uri: uri.clone(),
                })
            }
            _ => None,
        }
    }
}

/// State of a dataset's latest version as reported by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionState {
    Draft,
    Released,
    Other(String),
}

impl VersionState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "DRAFT" => VersionState::Draft,
            "RELEASED" => VersionState::Released,
            other => VersionState::Other(other.to_string()),
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, VersionState::Draft)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    /// JSON-LD merge of the topic-classification block only.
    Metadata,
    /// Full replacement of the draft version document.
    Draft,
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStrategy::Metadata => write!(f, "metadata"),
            UpdateStrategy::Draft => write!(f, "draft"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Minor,
    Major,
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseType::Minor => write!(f, "minor"),
            ReleaseType::Major => write!(f, "major"),
        }
    }
}

/// Pipeline stage a row failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Validation,
    Fetch,
    Update,
    Publish,
    Unknown,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validation => write!(f, "validation"),
            Stage::Fetch => write!(f, "fetch"),
            Stage::Update => write!(f, "update"),
            Stage::Publish => write!(f, "publish"),
            Stage::Unknown => write!(f, "unknown"),
        }
    }
}

/// Terminal result of one row. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { note: Option<String> },
    PartialSuccess { reason: String },
    Failure { stage: Stage, reason: String },
}

impl Outcome {
    pub fn success() -> Self {
        Outcome::Success { note: None }
    }

    pub fn success_with_note(note: impl Into<String>) -> Self {
        Outcome::Success {
            note: Some(note.into()),
        }
    }

    pub fn partial(reason: impl Into<String>) -> Self {
        Outcome::PartialSuccess {
            reason: reason.into(),
        }
    }

    pub fn failure(stage: Stage, reason: impl Into<String>) -> Self {
        Outcome::Failure {
            stage,
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Outcome::PartialSuccess { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }
}

/// Outcome paired with the raw DOI cell it belongs to. The raw cell is kept
/// so rows that fail validation still appear in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    pub doi: String,
    pub outcome: Outcome,
}
