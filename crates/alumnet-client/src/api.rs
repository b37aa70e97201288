// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared JSON-over-HTTP plumbing for the collaborator bindings.

use std::time::Duration;

use alumnet_core::{AlumnetError, HealthStatus, ServiceKind};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// HTTP client bound to one collaborator's base URL.
///
/// Handles JSON encoding, the per-request timeout, and retry of transient
/// statuses (429, 500, 502, 503). A 404 is handed back to the caller so it
/// can decide between "absent" and "error".
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    service: ServiceKind,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl ApiClient {
    pub fn new(
        service: ServiceKind,
        base_url: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, AlumnetError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            AlumnetError::Config(format!("invalid {service} base URL '{base_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AlumnetError::Config(format!(
                "{service} base URL '{base_url}' cannot carry a path"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AlumnetError::Remote {
                service,
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            service,
            timeout,
            max_retries,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Overrides the pause between attempts (tests use zero).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn service(&self) -> ServiceKind {
        self.service
    }

    /// Base URL with `segments` appended, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Like [`endpoint`](Self::endpoint) with a query string.
    pub fn endpoint_with_query(&self, segments: &[&str], params: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint(segments);
        url.query_pairs_mut().extend_pairs(params);
        url
    }

    /// GET a JSON document. `Ok(None)` on 404.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, AlumnetError> {
        let response = self.execute(Method::GET, url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.decode(response).await.map(Some)
    }

    /// POST a JSON body and decode the JSON answer.
    pub async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, AlumnetError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = self.encode(body)?;
        let response = self.execute(Method::POST, url.clone(), Some(&payload)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(self.not_found(&url));
        }
        self.decode(response).await
    }

    /// POST a JSON body, ignoring whatever comes back.
    pub async fn post<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<(), AlumnetError> {
        let payload = self.encode(body)?;
        let response = self.execute(Method::POST, url.clone(), Some(&payload)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(self.not_found(&url));
        }
        Ok(())
    }

    /// PATCH a JSON body. Returns `false` on 404.
    pub async fn patch<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<bool, AlumnetError> {
        let payload = self.encode(body)?;
        let response = self.execute(Method::PATCH, url, Some(&payload)).await?;
        Ok(response.status() != StatusCode::NOT_FOUND)
    }

    /// Single unretried GET against the base URL.
    ///
    /// Any answer below 500 counts as reachable.
    pub async fn probe(&self) -> HealthStatus {
        match self.client.get(self.base_url.clone()).send().await {
            Ok(response) if response.status().is_server_error() => {
                let status = response.status();
                warn!(service = %self.service, %status, "health probe degraded");
                HealthStatus::Degraded(format!("{} answered {status}", self.base_url))
            }
            Ok(_) => HealthStatus::Healthy,
            Err(e) => {
                warn!(service = %self.service, error = %e, "health probe failed");
                HealthStatus::Unhealthy(format!("{} unreachable: {e}", self.base_url))
            }
        }
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, AlumnetError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(service = %self.service, attempt, "retrying request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(payload) = body {
                request = request.json(payload);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    return Err(AlumnetError::Timeout {
                        duration: self.timeout,
                    });
                }
                Err(e) => {
                    return Err(AlumnetError::Remote {
                        service: self.service,
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    });
                }
            };

            let status = response.status();
            debug!(service = %self.service, %method, %url, %status, attempt, "response received");

            if status.is_success() || status == StatusCode::NOT_FOUND {
                return Ok(response);
            }

            let text = response.text().await.unwrap_or_default();
            let error = AlumnetError::remote(
                self.service,
                format!("{method} {} returned {status}: {text}", url.path()),
            );

            if is_transient_status(status) && attempt < self.max_retries {
                warn!(service = %self.service, %status, "transient error, will retry");
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error
            .unwrap_or_else(|| AlumnetError::remote(self.service, "request failed after retries")))
    }

    fn encode<B: Serialize + ?Sized>(&self, body: &B) -> Result<serde_json::Value, AlumnetError> {
        serde_json::to_value(body).map_err(|e| AlumnetError::Internal(format!(
            "failed to encode {} request body: {e}",
            self.service
        )))
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, AlumnetError> {
        let text = response.text().await.map_err(|e| AlumnetError::Remote {
            service: self.service,
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        serde_json::from_str(&text).map_err(|e| AlumnetError::Remote {
            service: self.service,
            message: format!("failed to parse response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    fn not_found(&self, url: &Url) -> AlumnetError {
        AlumnetError::remote(self.service, format!("{} not found", url.path()))
    }
}

/// Statuses worth a second attempt.
fn is_transient_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}
