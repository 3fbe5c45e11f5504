use std::result::Result as StdResult;

use thiserror::Error;

/// Unified error type for the wizard, storage and API layers.
#[derive(Error, Debug)]
pub enum ChecklistError {
    #[error("{0}")]
    Validation(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = StdResult<T, ChecklistError>;

impl ChecklistError {
    /// True for failures raised by the remote service or the transport to it.
    pub fn is_network(&self) -> bool {
        matches!(self, ChecklistError::Network(_) | ChecklistError::Api { .. })
    }
}

/// User-facing CLI error wrapper.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ChecklistError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
    #[error("Prompt failed: {0}")]
    Prompt(String),
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl From<std::io::Error> for ChecklistError {
    fn from(err: std::io::Error) -> Self {
        ChecklistError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ChecklistError {
    fn from(err: serde_json::Error) -> Self {
        ChecklistError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Prompt(err.to_string())
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        CliError::Prompt(err.to_string())
    }
}
