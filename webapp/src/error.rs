// ---------------------------------------------------------------------------
// Error types shared by the partitioner, the registry and the store layer
// ---------------------------------------------------------------------------

use thiserror::Error;

/// Rejected user input. Reported synchronously; nothing is generated or
/// written when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("a block needs exactly 4 corner points, got {0}")]
    CornerCount(usize),
    #[error("corner point {0} is not a finite coordinate")]
    NonFiniteCorner(usize),
    #[error("shop count must be between 1 and {max}, got {count}")]
    CellCount { count: usize, max: usize },
    #[error("invalid shop number range {start}..={end}")]
    NumberRange { start: i64, end: i64 },
    #[error("shop name must not be empty")]
    EmptyName,
    #[error("program value must not be empty")]
    EmptyProgramValue,
    #[error("program {0:?} already exists")]
    DuplicateProgram(String),
    #[error("program {0:?} is still assigned to shops")]
    ProgramInUse(String),
    #[error("unknown program {0:?}")]
    UnknownProgram(String),
}

/// Failure of a single store call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decoding error: {0}")]
    Decode(String),
    #[error("encoding error: {0}")]
    Encode(String),
    #[error("document {0:?} already exists")]
    AlreadyExists(String),
    #[error("document {0:?} not found")]
    NotFound(String),
}

/// One or more batch commits failed. Batches that did commit stay committed.
#[derive(Debug, Error)]
#[error("{failed} of {total} batches failed ({committed_ops} operations committed): {first}")]
pub struct PersistenceError {
    pub total: usize,
    pub failed: usize,
    pub committed_ops: usize,
    #[source]
    pub first: StoreError,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("user {user:?} is not allowed to {action}")]
    Unauthorized { user: String, action: &'static str },
}

impl Error {
    /// True for errors the operator can fix by changing their input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_messages_name_the_problem() {
        let msg = InvalidInputError::CellCount { count: 251, max: 250 }.to_string();
        assert!(msg.contains("251"), "got: {msg}");
        assert!(msg.contains("250"), "got: {msg}");

        let msg = InvalidInputError::CornerCount(3).to_string();
        assert!(msg.contains("exactly 4"), "got: {msg}");
    }

    #[test]
    fn persistence_error_exposes_source() {
        let err = PersistenceError {
            total: 3,
            failed: 1,
            committed_ops: 900,
            first: StoreError::NotFound("x".into()),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("1 of 3 batches failed"), "got: {msg}");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn io_error_converts_into_store_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = StoreError::from(io).into();
        assert!(matches!(err, Error::Store(StoreError::Io(_))));
    }
}
