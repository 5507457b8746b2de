use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EvalError {
    /// A required file, template or setting is missing or unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An external call failed or returned data we could not use
    #[error("Service error: {0}")]
    Service(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EvalError {
    pub fn service(err: impl std::fmt::Display) -> Self {
        EvalError::Service(err.to_string())
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for EvalError {
    fn from(err: reqwest::Error) -> Self {
        EvalError::Service(err.to_string())
    }
}

pub type EvalResult<T> = Result<T, EvalError>;
