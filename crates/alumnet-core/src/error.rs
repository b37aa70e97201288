// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Alumnet mentorship engine.

use thiserror::Error;

use crate::types::{RequestStatus, ServiceKind, ViewerRole};

/// The primary error type used across collaborator traits and engine operations.
#[derive(Debug, Error)]
pub enum AlumnetError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Local durable store errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A remote collaborator could not be reached or answered with an error.
    #[error("{service} service error: {message}")]
    Remote {
        service: ServiceKind,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A lifecycle transition that the request state machine does not allow.
    #[error("cannot move request from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    /// A local invariant refused the action. Never forwarded to a remote service.
    #[error(transparent)]
    Guard(#[from] GuardRejection),

    /// The mentorship request is unknown to every source.
    #[error("mentorship request {0} not found")]
    NotFound(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AlumnetError {
    /// Shorthand for a remote failure without an underlying error value.
    pub fn remote(service: ServiceKind, message: impl Into<String>) -> Self {
        Self::Remote {
            service,
            message: message.into(),
            source: None,
        }
    }

    /// Whether the error is something the user can act on, as opposed to a
    /// transport problem that is recovered locally.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Guard(_) | Self::InvalidTransition { .. } | Self::NotFound(_)
        )
    }
}

/// Reasons a lifecycle action is refused locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardRejection {
    /// Calls and completion need an accepted request.
    #[error("request is {status}, calls and completion require an accepted request")]
    NotAccepted { status: RequestStatus },

    /// The running segment is below the configured minimum.
    #[error("the session needs {remaining_minutes} more minute(s) before it can be completed")]
    TooShort { remaining_minutes: u32 },

    /// Completion is hidden while the other side is still in the room.
    #[error("the other participant is still in the call")]
    CounterpartActive,

    /// The requester has not paid.
    #[error("payment required: the requester has not paid for this mentorship")]
    Unpaid,

    #[error("no call is in progress for this request")]
    NoActiveCall,

    #[error("a call is already in progress for this request")]
    CallInProgress,

    #[error("a rejection reason is required")]
    EmptyReason,

    /// Accept and reject belong to the mentor.
    #[error("only the mentor can answer a request, not the {role}")]
    NotMentor { role: ViewerRole },
}
