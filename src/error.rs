use std::fmt::Display;
use thiserror::Error;

/// An upstream invariant was violated. These are logic errors in whatever
/// produced the input and abort the whole pipeline.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct PreconditionError {
  pub message: String
}

impl PreconditionError {
  pub fn new<S: Display>(message: S) -> Self {
    PreconditionError { message: message.to_string() }
  }
}

#[derive(Debug, Error)]
pub enum DecodeError {
  #[error("Malformed path: {0}")]
  MalformedPath(String),

  #[error("Malformed project: {0}")]
  MalformedProject(#[from] serde_json::Error)
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Precondition(#[from] PreconditionError),

  #[error(transparent)]
  Decode(#[from] DecodeError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Invalid pattern: {0}")]
  Pattern(#[from] glob::PatternError)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand used by stages that can only fail on a broken invariant.
pub fn precondition<T, S: Display>(message: S) -> std::result::Result<T, PreconditionError> {
  Err(PreconditionError::new(message))
}
