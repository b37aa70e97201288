// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use tracing::info;

use alumnet_config::model::ServicesConfig;
use alumnet_core::traits::StatusUpdate;
use alumnet_core::{
    AlumnetError, HealthStatus, MentorshipRequest, RequestId, RequestRepository, ServiceAdapter,
    ServiceKind,
};

use crate::api::ApiClient;

/// Mentorship request repository (`GET /{id}`, `PATCH /{id}`).
#[derive(Debug, Clone)]
pub struct HttpRequests {
    api: ApiClient,
}

impl HttpRequests {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn from_config(config: &ServicesConfig) -> Result<Self, AlumnetError> {
        Ok(Self::new(ApiClient::new(
            ServiceKind::Requests,
            &config.requests_url,
            config.timeout(),
            config.max_retries,
        )?))
    }
}

#[async_trait]
impl ServiceAdapter for HttpRequests {
    fn name(&self) -> &str {
        "http-requests"
    }

    fn service_kind(&self) -> ServiceKind {
        ServiceKind::Requests
    }

    async fn health_check(&self) -> Result<HealthStatus, AlumnetError> {
        Ok(self.api.probe().await)
    }
}

#[async_trait]
impl RequestRepository for HttpRequests {
    async fn get(&self, id: &RequestId) -> Result<Option<MentorshipRequest>, AlumnetError> {
        self.api.get_json(self.api.endpoint(&[id.as_str()])).await
    }

    async fn update_status(
        &self,
        id: &RequestId,
        update: &StatusUpdate,
    ) -> Result<(), AlumnetError> {
        let found = self
            .api
            .patch(self.api.endpoint(&[id.as_str()]), update)
            .await?;
        if !found {
            return Err(AlumnetError::NotFound(id.to_string()));
        }
        info!(request_id = %id, status = %update.status, "request status written");
        Ok(())
    }
}
