// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Alumnet mentorship engine.
//!
//! This crate provides the domain types, the error taxonomy, and the
//! collaborator traits (session log, presence, payment, request repository,
//! durable store, clock) that the engine is written against.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AlumnetError, GuardRejection};
pub use types::{
    CallHistoryEntry, CallRecord, CallStatus, CallType, HealthStatus, MentorshipRequest,
    PresenceStatus, RequestId, RequestStatus, ServiceKind, UserId, Viewer, ViewerRole,
    PRESET_REJECTION_REASONS, call_duration_minutes,
};

pub use traits::{
    CallRoomProbe, Clock, FallbackStore, PaymentService, PresenceService, RequestRepository, ServiceAdapter,
    SessionLogService, SystemClock,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alumnet_error_has_all_variants() {
        let _config = AlumnetError::Config("test".into());
        let _storage = AlumnetError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _remote = AlumnetError::remote(ServiceKind::SessionLog, "down");
        let _timeout = AlumnetError::Timeout {
            duration: std::time::Duration::from_secs(10),
        };
        let _transition = AlumnetError::InvalidTransition {
            from: RequestStatus::Completed,
            to: RequestStatus::Accepted,
        };
        let _guard = AlumnetError::from(GuardRejection::Unpaid);
        let _not_found = AlumnetError::NotFound("r1".into());
        let _internal = AlumnetError::Internal("test".into());
    }

    #[test]
    fn guard_errors_are_user_facing_and_remote_errors_are_not() {
        assert!(AlumnetError::from(GuardRejection::CounterpartActive).is_user_facing());
        assert!(!AlumnetError::remote(ServiceKind::Payment, "timeout").is_user_facing());
    }

    #[test]
    fn remote_error_names_the_service() {
        let err = AlumnetError::remote(ServiceKind::SessionLog, "connection refused");
        assert_eq!(
            err.to_string(),
            "session_log service error: connection refused"
        );
    }

    #[test]
    fn service_kind_round_trips_through_strings() {
        use std::str::FromStr;
        for kind in [
            ServiceKind::SessionLog,
            ServiceKind::Presence,
            ServiceKind::Payment,
            ServiceKind::Requests,
            ServiceKind::FallbackStore,
        ] {
            assert_eq!(ServiceKind::from_str(&kind.to_string()).unwrap(), kind);
        }
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _session_log(_: &dyn SessionLogService) {}
        fn _presence(_: &dyn PresenceService) {}
        fn _payment(_: &dyn PaymentService) {}
        fn _requests(_: &dyn RequestRepository) {}
        fn _store(_: &dyn FallbackStore) {}
        fn _clock(_: &dyn Clock) {}
    }
}
