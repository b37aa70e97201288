// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait that every collaborator adapter implements.

use async_trait::async_trait;

use crate::error::AlumnetError;
use crate::types::{HealthStatus, ServiceKind};

/// Identity and health reporting shared by all collaborator adapters.
#[async_trait]
pub trait ServiceAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Which collaborator this adapter speaks to.
    fn service_kind(&self) -> ServiceKind;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, AlumnetError>;
}
