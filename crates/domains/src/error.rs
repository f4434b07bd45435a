//! # Errors
//!
//! Centralized error handling for the community board core.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

use crate::models::{BoardId, CommentId, MemberId};

/// Failures raised by store adapters. Propagated unmodified by the services.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backing store could not be reached (pool exhausted, DB down).
    #[error("store connection failed: {0}")]
    Connection(String),

    /// A query or mutation failed while executing (constraint violation, bad SQL).
    #[error("store query failed: {0}")]
    Query(String),

    /// A stored row could not be mapped back to a domain model.
    #[error("stored row could not be decoded: {0}")]
    Decode(String),
}

/// Coarse classification an outer layer uses to pick a client or server failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Invalid,
    Internal,
}

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("board not found with ID {0}")]
    BoardNotFound(BoardId),

    #[error("member not found with ID {0}")]
    MemberNotFound(MemberId),

    #[error("comment not found with ID {0}")]
    CommentNotFound(CommentId),

    /// Ownership mismatch (e.g., editing someone else's board).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Validation failure (e.g., blank comment, page size out of range)
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BoardNotFound(_) | Self::MemberNotFound(_) | Self::CommentNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Validation(_) => ErrorKind::Invalid,
            Self::Repository(_) => ErrorKind::Internal,
        }
    }
}

/// A specialized Result type for community board logic.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_share_a_kind() {
        assert_eq!(DomainError::BoardNotFound(BoardId(3)).kind(), ErrorKind::NotFound);
        assert_eq!(DomainError::MemberNotFound(MemberId(3)).kind(), ErrorKind::NotFound);
        assert_eq!(DomainError::CommentNotFound(CommentId(3)).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn repository_failures_are_internal_and_keep_their_message() {
        let err: DomainError = RepositoryError::Connection("pool timed out".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "store connection failed: pool timed out");
    }

    #[test]
    fn display_includes_the_identifier() {
        assert_eq!(
            DomainError::BoardNotFound(BoardId(42)).to_string(),
            "board not found with ID 42"
        );
    }
}
