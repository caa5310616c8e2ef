// =====================================================
// GATEWAY ERRORS
// Stable error kinds surfaced by every gateway operation
// =====================================================

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Machine-checkable category of a [`GatewayError`].
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    InvalidIdentifier,
    InvalidInput,
    StatementRejected,
    ConnectionFailed,
    ExecutionFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidIdentifier => "invalid_identifier",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::StatementRejected => "statement_rejected",
            ErrorKind::ConnectionFailed => "connection_failed",
            ErrorKind::ExecutionFailed => "execution_failed",
        }
    }

    /// Validation failures are detected before any statement is issued.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidIdentifier | ErrorKind::InvalidInput | ErrorKind::StatementRejected
        )
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Statement rejected: {0}")]
    StatementRejected(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Unauthorized(_) => ErrorKind::Unauthorized,
            GatewayError::NotFound(_) => ErrorKind::NotFound,
            GatewayError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            GatewayError::InvalidInput(_) => ErrorKind::InvalidInput,
            GatewayError::StatementRejected(_) => ErrorKind::StatementRejected,
            GatewayError::ConnectionFailed(_) => ErrorKind::ConnectionFailed,
            GatewayError::ExecutionFailed(_) => ErrorKind::ExecutionFailed,
        }
    }

    /// Human-readable detail without the kind prefix.
    pub fn detail(&self) -> &str {
        match self {
            GatewayError::Unauthorized(detail)
            | GatewayError::NotFound(detail)
            | GatewayError::InvalidIdentifier(detail)
            | GatewayError::InvalidInput(detail)
            | GatewayError::StatementRejected(detail)
            | GatewayError::ConnectionFailed(detail)
            | GatewayError::ExecutionFailed(detail) => detail,
        }
    }

    pub fn invalid_input(detail: impl Into<String>) -> Self {
        GatewayError::InvalidInput(detail.into())
    }

    pub fn rejected(detail: impl Into<String>) -> Self {
        GatewayError::StatementRejected(detail.into())
    }
}

impl Serialize for GatewayError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GatewayError", 2)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("detail", self.detail())?;
        state.end()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
