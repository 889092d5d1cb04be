use std::env;
use std::path::Path;

use crate::error::UpdaterError;

pub const ENV_DATAVERSE_URL: &str = "DATAVERSE_URL";
pub const ENV_DATAVERSE_API_KEY: &str = "DATAVERSE_API_KEY";

/// Connection settings for the target Dataverse instance. Both values are
/// required and read from the process environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub api_key: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, UpdaterError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, UpdaterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_DATAVERSE_URL)
            .filter(|value| !value.trim().is_empty())
            .ok_or(UpdaterError::MissingEnv(ENV_DATAVERSE_URL))?;
        let api_key = lookup(ENV_DATAVERSE_API_KEY)
            .filter(|value| !value.trim().is_empty())
            .ok_or(UpdaterError::MissingEnv(ENV_DATAVERSE_API_KEY))?;
        Ok(Self { base_url, api_key })
    }
}

/// Startup check on the input path: the file must exist and carry a `.csv`
/// suffix. Column presence is checked later when the file is read.
pub fn validate_input_path(path: &Path) -> Result<(), UpdaterError> {
    if !path.is_file() {
        return Err(UpdaterError::InputNotFound(path.to_path_buf()));
    }
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(UpdaterError::InputNotCsv(path.to_path_buf()));
    }
    Ok(())
}
