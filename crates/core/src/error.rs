use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown alert status: {0}")]
    UnknownStatus(String),

    #[error("Metric not found: {0}")]
    MissingMetric(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
