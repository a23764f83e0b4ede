//! Error types for the Jira user lookup

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Jira API error: {0}")]
    Api(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Error retrieving user {username}: {source}")]
    Request {
        username: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<Error> for caseport_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Auth(message) => caseport_core::Error::Unauthorized(message),
            Error::Config(message) => caseport_core::Error::Config(message),
            other => caseport_core::Error::UserLookup(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
