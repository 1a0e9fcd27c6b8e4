use std::result::Result as StdResult;

use thiserror::Error;

use crate::profile::form::FormError;

/// Unified error type for the profile page, its storage and configuration.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No user record is loaded for the current session")]
    NoUserLoaded,
    #[error(transparent)]
    Form(#[from] FormError),
}

pub type Result<T> = StdResult<T, ProfileError>;

/// User-facing CLI error wrapper.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ProfileError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<std::io::Error> for ProfileError {
    fn from(err: std::io::Error) -> Self {
        ProfileError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ProfileError {
    fn from(err: serde_json::Error) -> Self {
        ProfileError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}
