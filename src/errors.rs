//! Error handling for the election engine

use crate::types::ElectionPhase;

/// Result type alias for the election engine
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the election engine
///
/// Duplicate votes and repeat registrations are deliberately absent:
/// both are expected, recoverable outcomes reported through
/// [`CastOutcome`](crate::engine::CastOutcome) and
/// [`RegisterOutcome`](crate::engine::RegisterOutcome) rather than
/// through this enum.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed request data (blank candidate name, bad payload)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A referenced candidate, voter or ballot does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The operation is not legal in the current lifecycle phase
    #[error("{operation} is not allowed while the election is {phase}")]
    IllegalState {
        operation: &'static str,
        phase: ElectionPhase,
    },

    /// A lifecycle transition was attempted with unmet requirements
    #[error("Precondition failed: {message}")]
    PreconditionFailed { message: String },

    /// Store access exceeded its bounded timeout; retry to find out
    #[error("Store unavailable: {operation} timed out")]
    Unavailable { operation: &'static str },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new invalid-input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new not-found error for the given entity kind and id
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a new illegal-state error
    pub fn illegal_state(operation: &'static str, phase: ElectionPhase) -> Self {
        Self::IllegalState { operation, phase }
    }

    /// Create a new precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            message: message.into(),
        }
    }

    /// Create a new unavailable error
    pub fn unavailable(operation: &'static str) -> Self {
        Self::Unavailable { operation }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Convenience macros for creating specific error types
#[macro_export]
macro_rules! input_error {
    ($msg:expr) => {
        $crate::Error::invalid_input($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::invalid_input(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! precondition_error {
    ($msg:expr) => {
        $crate::Error::precondition($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::precondition(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let input_err = Error::invalid_input("test input error");
        assert!(matches!(input_err, Error::InvalidInput { .. }));

        let not_found_err = Error::not_found("candidate", 7);
        assert!(matches!(not_found_err, Error::NotFound { .. }));
        assert_eq!(not_found_err.to_string(), "candidate 7 not found");

        let state_err = Error::illegal_state("cast_ballot", ElectionPhase::Closed);
        assert!(matches!(state_err, Error::IllegalState { .. }));
        assert_eq!(
            state_err.to_string(),
            "cast_ballot is not allowed while the election is closed"
        );

        let unavailable_err = Error::unavailable("open_election");
        assert!(matches!(unavailable_err, Error::Unavailable { .. }));
    }

    #[test]
    fn test_error_macros() {
        let input_err = input_error!("bad payload");
        assert!(matches!(input_err, Error::InvalidInput { .. }));

        let precondition_err = precondition_error!("need {} candidates", 2);
        assert!(matches!(precondition_err, Error::PreconditionFailed { .. }));
        assert_eq!(
            precondition_err.to_string(),
            "Precondition failed: need 2 candidates"
        );
    }
}
