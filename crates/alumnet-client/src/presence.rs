// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;

use alumnet_config::model::ServicesConfig;
use alumnet_core::traits::SessionStart;
use alumnet_core::{
    AlumnetError, HealthStatus, PresenceService, PresenceStatus, RequestId, ServiceAdapter,
    ServiceKind,
};

use crate::api::ApiClient;

/// Call-room presence service. An unknown request reads as nobody present.
#[derive(Debug, Clone)]
pub struct HttpPresence {
    api: ApiClient,
}

impl HttpPresence {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn from_config(config: &ServicesConfig) -> Result<Self, AlumnetError> {
        Ok(Self::new(ApiClient::new(
            ServiceKind::Presence,
            &config.presence_url,
            config.timeout(),
            config.max_retries,
        )?))
    }
}

#[async_trait]
impl ServiceAdapter for HttpPresence {
    fn name(&self) -> &str {
        "http-presence"
    }

    fn service_kind(&self) -> ServiceKind {
        ServiceKind::Presence
    }

    async fn health_check(&self) -> Result<HealthStatus, AlumnetError> {
        Ok(self.api.probe().await)
    }
}

#[async_trait]
impl PresenceService for HttpPresence {
    async fn status(&self, request_id: &RequestId) -> Result<PresenceStatus, AlumnetError> {
        let status: Option<PresenceStatus> = self
            .api
            .get_json(self.api.endpoint(&["status", request_id.as_str()]))
            .await?;
        Ok(status.unwrap_or_default())
    }

    async fn session_start(&self, start: &SessionStart) -> Result<(), AlumnetError> {
        self.api
            .post(self.api.endpoint(&["session-start"]), start)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::test_client;
    use alumnet_core::ViewerRole;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn status_decodes_presence_flags() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isStudentActive": true,
                "isAlumniActive": false,
                "isActive": true,
                "sessionStartedAt": "2026-03-01T10:00:00Z"
            })))
            .mount(&server)
            .await;

        let presence = HttpPresence::new(test_client(ServiceKind::Presence, &server.uri()));
        let status = presence.status(&"r1".into()).await.unwrap();
        assert!(status.counterpart_active(ViewerRole::Mentor));
        assert!(!status.counterpart_active(ViewerRole::Requester));
        assert!(status.session_started_at.is_some());
    }

    #[tokio::test]
    async fn unknown_request_reads_as_empty_room() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let presence = HttpPresence::new(test_client(ServiceKind::Presence, &server.uri()));
        assert_eq!(
            presence.status(&"nope".into()).await.unwrap(),
            PresenceStatus::default()
        );
    }

    #[tokio::test]
    async fn session_start_announces_channel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session-start"))
            .and(body_json(json!({
                "requestId": "r1",
                "participantIds": ["s1", "m1"],
                "channelName": "mentorship-r1",
                "attendeeLink": "https://meet.example/mentorship-r1"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let presence = HttpPresence::new(test_client(ServiceKind::Presence, &server.uri()));
        presence
            .session_start(&SessionStart {
                request_id: "r1".into(),
                participant_ids: vec!["s1".into(), "m1".into()],
                channel_name: "mentorship-r1".into(),
                attendee_link: "https://meet.example/mentorship-r1".into(),
            })
            .await
            .unwrap();
    }
}
