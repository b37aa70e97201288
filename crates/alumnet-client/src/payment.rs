// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use serde::Deserialize;

use alumnet_config::model::ServicesConfig;
use alumnet_core::{
    AlumnetError, HealthStatus, PaymentService, RequestId, ServiceAdapter, ServiceKind, UserId,
};

use crate::api::ApiClient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentAnswer {
    has_paid: bool,
}

/// Payment-status lookup keyed by (payer, payee, request).
#[derive(Debug, Clone)]
pub struct HttpPayment {
    api: ApiClient,
}

impl HttpPayment {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn from_config(config: &ServicesConfig) -> Result<Self, AlumnetError> {
        Ok(Self::new(ApiClient::new(
            ServiceKind::Payment,
            &config.payment_url,
            config.timeout(),
            config.max_retries,
        )?))
    }
}

#[async_trait]
impl ServiceAdapter for HttpPayment {
    fn name(&self) -> &str {
        "http-payment"
    }

    fn service_kind(&self) -> ServiceKind {
        ServiceKind::Payment
    }

    async fn health_check(&self) -> Result<HealthStatus, AlumnetError> {
        Ok(self.api.probe().await)
    }
}

#[async_trait]
impl PaymentService for HttpPayment {
    async fn has_paid(
        &self,
        payer: &UserId,
        payee: &UserId,
        request_id: &RequestId,
    ) -> Result<bool, AlumnetError> {
        let url = self.api.endpoint_with_query(
            &["has-paid"],
            &[
                ("payer", payer.as_str()),
                ("payee", payee.as_str()),
                ("requestId", request_id.as_str()),
            ],
        );
        // No payment record is the same as not paid.
        let answer: Option<PaymentAnswer> = self.api.get_json(url).await?;
        Ok(answer.is_some_and(|a| a.has_paid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn has_paid_passes_all_three_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/has-paid"))
            .and(query_param("payer", "s1"))
            .and(query_param("payee", "m1"))
            .and(query_param("requestId", "r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hasPaid": true })))
            .mount(&server)
            .await;

        let payment = HttpPayment::new(test_client(ServiceKind::Payment, &server.uri()));
        assert!(payment
            .has_paid(&"s1".into(), &"m1".into(), &"r1".into())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn missing_record_means_unpaid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let payment = HttpPayment::new(test_client(ServiceKind::Payment, &server.uri()));
        assert!(!payment
            .has_paid(&"s1".into(), &"m1".into(), &"r1".into())
            .await
            .unwrap());
    }
}
