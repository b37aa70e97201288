// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the collaborator traits and the mentorship engine.
//!
//! Wire-facing structs serialize as camelCase JSON so the same shapes are
//! used for the remote services and for the local fallback cache.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a mentorship request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a user (student requester or alumni mentor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle status of a mentorship request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl RequestStatus {
    /// `rejected` and `completed` accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Completed)
    }

    /// Forward-only transition table: `pending -> {accepted, rejected}`,
    /// `accepted -> completed`.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted)
                | (Self::Pending, Self::Rejected)
                | (Self::Accepted, Self::Completed)
        )
    }

    /// Whether `next` lies on a forward path from `self`, in any number of
    /// steps. A status always reaches itself.
    pub fn can_reach(self, next: RequestStatus) -> bool {
        self == next
            || self.can_transition_to(next)
            || (self == Self::Pending && next == Self::Completed)
    }
}

/// Kind of call placed through the call-room provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallType {
    Video,
    Audio,
}

/// Status of a single call segment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// Whole minutes between two instants, rounded half-up and clamped at zero.
pub fn call_duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let millis = (end - start).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis as f64 / 60_000.0).round() as u32
}

/// One discrete call segment within a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub call_id: String,
    pub call_type: CallType,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Minutes, present once the call has ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub status: CallStatus,
}

impl CallRecord {
    /// A record for a call that has just been initiated.
    pub fn started(call_id: String, call_type: CallType, start_time: DateTime<Utc>) -> Self {
        Self {
            call_id,
            call_type,
            start_time,
            end_time: None,
            duration: None,
            status: CallStatus::InProgress,
        }
    }

    /// A completed record spanning `start_time..end_time`.
    pub fn completed(
        call_id: String,
        call_type: CallType,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            call_id,
            call_type,
            start_time,
            end_time: Some(end_time),
            duration: Some(call_duration_minutes(start_time, end_time)),
            status: CallStatus::Completed,
        }
    }

    /// Minutes this record contributes to the request total.
    pub fn counted_minutes(&self) -> u32 {
        match self.status {
            CallStatus::Completed => self.duration.unwrap_or(0),
            _ => 0,
        }
    }
}

/// A mentorship request as seen by one viewer after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorshipRequest {
    pub id: RequestId,
    pub requester_id: UserId,
    pub counterpart_id: UserId,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub call_history: Vec<CallRecord>,
    #[serde(default)]
    pub total_call_duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_call_completed_at: Option<DateTime<Utc>>,
    /// Set when completion came from the manual path rather than a call end.
    #[serde(default)]
    pub completed_manually: bool,
}

impl MentorshipRequest {
    /// A fresh pending request with no call history.
    pub fn pending(id: RequestId, requester_id: UserId, counterpart_id: UserId) -> Self {
        Self {
            id,
            requester_id,
            counterpart_id,
            status: RequestStatus::Pending,
            rejection_reason: None,
            call_history: Vec::new(),
            total_call_duration: 0,
            last_call_completed_at: None,
            completed_manually: false,
        }
    }
}

/// Call history for one request, as returned by the session log and as
/// stored in the local fallback cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallHistoryEntry {
    pub request_id: RequestId,
    #[serde(default)]
    pub history: Vec<CallRecord>,
    #[serde(default)]
    pub total_call_duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_call_completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
}

impl CallHistoryEntry {
    pub fn empty(request_id: RequestId) -> Self {
        Self {
            request_id,
            history: Vec::new(),
            total_call_duration: 0,
            last_call_completed_at: None,
            completed: false,
        }
    }

    /// Snapshot of a merged request, used to refresh the fallback cache.
    pub fn from_request(request: &MentorshipRequest) -> Self {
        Self {
            request_id: request.id.clone(),
            history: request.call_history.clone(),
            total_call_duration: request.total_call_duration,
            last_call_completed_at: request.last_call_completed_at,
            completed: request.status == RequestStatus::Completed,
        }
    }
}

/// Live presence for the call room of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceStatus {
    #[serde(default)]
    pub is_student_active: bool,
    #[serde(default)]
    pub is_alumni_active: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_started_at: Option<DateTime<Utc>>,
}

impl PresenceStatus {
    /// Whether the party on the other side of `role` is inside the call.
    pub fn counterpart_active(&self, role: ViewerRole) -> bool {
        match role {
            ViewerRole::Requester => self.is_alumni_active,
            ViewerRole::Mentor => self.is_student_active,
        }
    }
}

/// Which side of a request the current viewer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViewerRole {
    /// The student who asked for mentorship (and pays for it).
    Requester,
    /// The alumni mentor.
    Mentor,
}

/// The user a controller acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Viewer {
    pub user_id: UserId,
    pub role: ViewerRole,
}

impl Viewer {
    pub fn new(user_id: UserId, role: ViewerRole) -> Self {
        Self { user_id, role }
    }

    /// Resolve the viewer's role from the request participants.
    pub fn of_request(request: &MentorshipRequest, user_id: &UserId) -> Option<Self> {
        if &request.requester_id == user_id {
            Some(Self::new(user_id.clone(), ViewerRole::Requester))
        } else if &request.counterpart_id == user_id {
            Some(Self::new(user_id.clone(), ViewerRole::Mentor))
        } else {
            None
        }
    }
}

/// Preset rejection reasons offered alongside free text.
pub const PRESET_REJECTION_REASONS: &[&str] = &[
    "Not available at this time",
    "Outside my area of expertise",
    "Mentorship capacity is full",
    "Request lacks enough detail",
];

/// Identifies a remote collaborator in errors and health reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ServiceKind {
    SessionLog,
    Presence,
    Payment,
    Requests,
    FallbackStore,
}

/// Health status reported by collaborator health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Collaborator is fully operational.
    Healthy,
    /// Collaborator is operational but experiencing issues.
    Degraded(String),
    /// Collaborator is not operational.
    Unhealthy(String),
}
