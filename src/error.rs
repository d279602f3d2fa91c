use thiserror::Error;

#[derive(Error, Debug)]
pub enum VsInsertionsError {
    #[error("Remote service unavailable ({url}): {reason}")]
    RemoteUnavailable { url: String, reason: String },

    #[error("Failed to parse response: {0}")]
    ParseFailure(String),

    #[error("Remote rejected the request (status {status}): {body}")]
    RemoteRejected { status: u16, body: String },

    #[error("Unrecognized vote value: {0}")]
    UnrecognizedVote(i64),

    #[error("Pull request {0} is already being abandoned")]
    AbandonInProgress(String),

    #[error("Pull request {id} cannot be abandoned while {status}")]
    InvalidTransition { id: String, status: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for VsInsertionsError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VsInsertionsError>;
