// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mentorship request repository collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AlumnetError;
use crate::traits::adapter::ServiceAdapter;
use crate::types::{MentorshipRequest, RequestId, RequestStatus};

/// A status write for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub completed_manually: bool,
}

/// Remote store of mentorship requests and their lifecycle status.
#[async_trait]
pub trait RequestRepository: ServiceAdapter {
    async fn get(&self, id: &RequestId) -> Result<Option<MentorshipRequest>, AlumnetError>;

    async fn update_status(&self, id: &RequestId, update: &StatusUpdate)
        -> Result<(), AlumnetError>;
}
