//! Error types for generated handlers

use crate::store::{RowError, StoreError};

/// Failure of a generated CRUD operation
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Missing or malformed request input
    #[error("{0}")]
    InvalidArgument(String),

    /// The addressed row does not exist
    #[error("{0}")]
    NotFound(String),

    /// A create collided with a unique constraint
    #[error("{0}")]
    AlreadyExists(String),

    /// Storage failure, wrapped with the entity and action that hit it
    #[error("failed to {action} {entity}: {source}")]
    Storage {
        /// Entity label, e.g. `user`
        entity: &'static str,
        /// Operation that failed, e.g. `create`
        action: &'static str,
        /// Backend error
        #[source]
        source: StoreError,
    },

    /// A selected row could not be decoded
    #[error("failed to scan {entity}: {source}")]
    Scan {
        /// Entity label
        entity: &'static str,
        /// Decode error
        #[source]
        source: RowError,
    },
}

impl HandlerError {
    /// [`HandlerError::InvalidArgument`] with `message`
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        HandlerError::InvalidArgument(message.into())
    }

    pub(crate) fn storage(entity: &'static str, action: &'static str, source: StoreError) -> Self {
        HandlerError::Storage {
            entity,
            action,
            source,
        }
    }

    /// The gRPC status code this error maps to
    pub fn code(&self) -> tonic::Code {
        match self {
            HandlerError::InvalidArgument(_) => tonic::Code::InvalidArgument,
            HandlerError::NotFound(_) => tonic::Code::NotFound,
            HandlerError::AlreadyExists(_) => tonic::Code::AlreadyExists,
            HandlerError::Storage { .. } | HandlerError::Scan { .. } => tonic::Code::Internal,
        }
    }
}

impl From<HandlerError> for tonic::Status {
    fn from(e: HandlerError) -> Self {
        tonic::Status::new(e.code(), e.to_string())
    }
}

/// Fail with `InvalidArgument` naming the first field whose check did not pass
///
/// Each entry pairs a field name with "value is present".
pub fn require(checks: &[(&str, bool)]) -> Result<(), HandlerError> {
    match checks.iter().find(|(_, present)| !present) {
        Some((field, _)) => Err(HandlerError::invalid_argument(format!("{field} is required"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_reports_first_missing() {
        assert!(require(&[("name", true), ("code", true)]).is_ok());

        let err = require(&[("name", true), ("code", false), ("title", false)]).unwrap_err();
        assert_eq!(err.to_string(), "code is required");
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }

    #[test]
    fn test_status_mapping() {
        let status: tonic::Status = HandlerError::NotFound("user not found".to_string()).into();
        assert_eq!(status.code(), tonic::Code::NotFound);
        assert_eq!(status.message(), "user not found");

        let status: tonic::Status =
            HandlerError::storage("user", "create", StoreError::Backend("connection reset".into()))
                .into();
        assert_eq!(status.code(), tonic::Code::Internal);
        assert_eq!(status.message(), "failed to create user: connection reset");

        let status: tonic::Status = HandlerError::AlreadyExists("user already exists".into()).into();
        assert_eq!(status.code(), tonic::Code::AlreadyExists);
    }
}
