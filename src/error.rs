use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum UpdaterError {
    #[error("invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("environment value {0} is not set")]
    #[diagnostic(help("export {0} before running, e.g. from an .env file sourced into the shell"))]
    MissingEnv(&'static str),

    #[error("input file does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("input file {0} does not have a .csv suffix")]
    InputNotCsv(PathBuf),

    #[error("column '{0}' was not found in the input file")]
    MissingColumn(String),

    #[error("failed to read input file {path}: {message}")]
    InputRead { path: PathBuf, message: String },

    #[error("Dataverse request failed: {0}")]
    DataverseHttp(String),

    #[error("Dataverse returned status {status}: {message}")]
    DataverseStatus { status: u16, message: String },

    #[error("Dataverse response was not JSON: {0}")]
    DataverseDecode(String),

    #[error("failed to write report {path}: {message}")]
    ReportWrite { path: PathBuf, message: String },

    #[error("failed to create log file {path}: {message}")]
    LogSetup { path: PathBuf, message: String },
}
