use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraderError {
    // Configuration
    #[error("at least one grader is required")]
    NoGraders,

    #[error("grader names must be unique, '{0}' appears more than once")]
    DuplicateGrader(String),

    #[error("{0:?} is not a directory. Point this at the unzipped Brightspace submissions folder")]
    NotADirectory(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Validation
    #[error("weight for grader '{grader}' must be finite and >= 0, got {weight}")]
    InvalidWeight { grader: String, weight: f64 },

    #[error("score {0} is invalid: {1}")]
    InvalidScore(f64, String),

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("column '{column}' holds '{value}', which is not a number")]
    NonNumeric { column: String, value: String },

    #[error("student id '{0}' appears more than once in the class list")]
    DuplicateStudent(String),

    #[error("student '{0}' has no group")]
    MissingGroup(String),

    // Internal consistency
    #[error("internal error: quotas sum to {actual} but {expected} were required")]
    QuotaMismatch { expected: usize, actual: usize },

    // Preconditions
    #[error("the following students have multiple submissions:\n{0}\nPlease delete extras or consolidate into one folder.")]
    DuplicateSubmissions(String),

    #[error("no folders in {0:?} look like a raw Brightspace export (\"<name> - <student id> <date>\"). Have they already been renamed?")]
    NoRawSubmissionFolders(PathBuf),

    #[error("cannot parse submission folder '{name}': {reason}")]
    MalformedSubmissionName { name: String, reason: String },

    #[error("no grader sheets found in {0:?}")]
    NoGraderSheets(PathBuf),

    // Infrastructure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, GraderError>;

impl From<tempfile::PersistError> for GraderError {
    fn from(e: tempfile::PersistError) -> Self {
        GraderError::Io(e.error)
    }
}
