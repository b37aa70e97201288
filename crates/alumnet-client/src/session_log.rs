// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session log service binding: `POST start`, `POST end`, `GET by-requests`.

use async_trait::async_trait;
use tracing::debug;

use alumnet_config::model::ServicesConfig;
use alumnet_core::traits::{EndAck, EndCall, StartCall};
use alumnet_core::{
    AlumnetError, CallHistoryEntry, HealthStatus, RequestId, ServiceAdapter, ServiceKind,
    SessionLogService,
};

use crate::api::ApiClient;

/// Remote ledger of call segments.
#[derive(Debug, Clone)]
pub struct HttpSessionLog {
    api: ApiClient,
}

impl HttpSessionLog {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn from_config(config: &ServicesConfig) -> Result<Self, AlumnetError> {
        Ok(Self::new(ApiClient::new(
            ServiceKind::SessionLog,
            &config.session_log_url,
            config.timeout(),
            config.max_retries,
        )?))
    }
}

#[async_trait]
impl ServiceAdapter for HttpSessionLog {
    fn name(&self) -> &str {
        "http-session-log"
    }

    fn service_kind(&self) -> ServiceKind {
        ServiceKind::SessionLog
    }

    async fn health_check(&self) -> Result<HealthStatus, AlumnetError> {
        Ok(self.api.probe().await)
    }
}

#[async_trait]
impl SessionLogService for HttpSessionLog {
    async fn record_start(&self, start: &StartCall) -> Result<(), AlumnetError> {
        self.api.post(self.api.endpoint(&["start"]), start).await
    }

    async fn record_end(&self, end: &EndCall) -> Result<EndAck, AlumnetError> {
        self.api.post_json(self.api.endpoint(&["end"]), end).await
    }

    async fn by_requests(&self, ids: &[RequestId]) -> Result<Vec<CallHistoryEntry>, AlumnetError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids
            .iter()
            .map(RequestId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = self
            .api
            .endpoint_with_query(&["by-requests"], &[("ids", joined.as_str())]);
        let entries: Option<Vec<CallHistoryEntry>> = self.api.get_json(url).await?;
        let entries = entries.unwrap_or_default();
        debug!(requested = ids.len(), returned = entries.len(), "call history fetched");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::test_client;
    use alumnet_core::{CallType, RequestStatus};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn log_for(server: &MockServer) -> HttpSessionLog {
        HttpSessionLog::new(test_client(ServiceKind::SessionLog, &server.uri()))
    }

    #[tokio::test]
    async fn record_start_posts_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/start"))
            .and(body_json(json!({
                "requestId": "r1",
                "callType": "video",
                "startTime": "2026-03-01T10:00:00Z"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        log_for(&server)
            .record_start(&StartCall {
                request_id: "r1".into(),
                call_type: CallType::Video,
                start_time: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn record_end_decodes_ack_with_status_flip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/end"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "callId": "c-42",
                "requestUpdated": { "status": "completed" }
            })))
            .mount(&server)
            .await;

        let start = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let ack = log_for(&server)
            .record_end(&EndCall {
                request_id: "r1".into(),
                call_type: CallType::Audio,
                start_time: start,
                end_time: start + chrono::Duration::seconds(90),
                duration: 2,
            })
            .await
            .unwrap();
        assert_eq!(ack.call_id, "c-42");
        assert_eq!(
            ack.request_updated.map(|u| u.status),
            Some(RequestStatus::Completed)
        );
    }

    #[tokio::test]
    async fn by_requests_joins_ids_into_one_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/by-requests"))
            .and(query_param("ids", "r1,r2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "requestId": "r1", "history": [], "totalCallDuration": 0, "completed": false },
                { "requestId": "r2", "totalCallDuration": 5, "completed": true }
            ])))
            .mount(&server)
            .await;

        let entries = log_for(&server)
            .by_requests(&["r1".into(), "r2".into()])
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[1].completed);
        assert_eq!(entries[1].total_call_duration, 5);
    }

    #[tokio::test]
    async fn by_requests_with_no_ids_skips_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        assert!(log_for(&server).by_requests(&[]).await.unwrap().is_empty());
    }
}
