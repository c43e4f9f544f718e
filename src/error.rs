use thiserror::Error;

/// Error returned by a reducer alongside the state it produced.
///
/// The store still adopts that state unless
/// [`Options::rollback_on_error`](crate::Options::rollback_on_error) is set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ReducerError(String);

impl ReducerError {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The message the reducer gave.
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors surfaced by [`Store`](crate::Store) operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot create store: {0}")]
    Construction(&'static str),

    #[error("store requires a running tokio runtime")]
    NoRuntime,

    #[error("invalid store configuration: {0}")]
    Config(String),

    #[error("action queue is full")]
    QueueFull,

    #[error("store dispatcher has stopped")]
    Closed,

    #[error("reducer failed: {0}")]
    Reducer(#[from] ReducerError),
}

impl StoreError {
    /// The reducer error carried by this value, if any.
    pub fn reducer_error(&self) -> Option<&ReducerError> {
        match self {
            StoreError::Reducer(e) => Some(e),
            _ => None,
        }
    }
}
