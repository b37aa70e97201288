// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `alumnet health` command implementation.
//!
//! Asks each remote collaborator and the local SQLite store for its health
//! concurrently and prints one line per adapter. Exits non-zero when anything is
//! unhealthy.

use std::sync::Arc;

use alumnet_client::RemoteServices;
use alumnet_config::model::AlumnetConfig;
use alumnet_core::{AlumnetError, HealthStatus, ServiceAdapter};
use alumnet_storage::SqliteFallbackStore;
use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

/// One adapter's line in the report.
#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub service: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AdapterHealth {
    fn new(adapter: &dyn ServiceAdapter, outcome: Result<HealthStatus, AlumnetError>) -> Self {
        let (status, detail) = match outcome {
            Ok(HealthStatus::Healthy) => ("healthy", None),
            Ok(HealthStatus::Degraded(detail)) => ("degraded", Some(detail)),
            Ok(HealthStatus::Unhealthy(detail)) => ("unhealthy", Some(detail)),
            Err(e) => ("unhealthy", Some(e.to_string())),
        };
        Self {
            name: adapter.name().to_string(),
            service: adapter.service_kind().to_string(),
            status,
            detail,
        }
    }

    fn is_unhealthy(&self) -> bool {
        self.status == "unhealthy"
    }
}

fn format_line(health: &AdapterHealth) -> String {
    let mark = match health.status {
        "healthy" => "[OK]  ",
        "degraded" => "[WARN]",
        _ => "[FAIL]",
    };
    match &health.detail {
        Some(detail) => format!("    {mark} {:<14} {} ({detail})", health.service, health.name),
        None => format!("    {mark} {:<14} {}", health.service, health.name),
    }
}

pub async fn run_health(config: &AlumnetConfig, json: bool) -> Result<(), AlumnetError> {
    let services = RemoteServices::from_config(&config.services)?;

    let store = Arc::new(SqliteFallbackStore::new(config.storage.clone()));
    if let Err(e) = store.initialize().await {
        warn!(error = %e, "fallback store could not be opened");
    }

    let adapters: [Arc<dyn ServiceAdapter>; 5] = [
        services.session_log,
        services.presence,
        services.payment,
        services.requests,
        store,
    ];

    let outcomes = join_all(adapters.iter().map(|adapter| adapter.health_check())).await;
    let report: Vec<AdapterHealth> = adapters
        .iter()
        .zip(outcomes)
        .map(|(adapter, outcome)| AdapterHealth::new(adapter.as_ref(), outcome))
        .collect();

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| AlumnetError::Internal(format!("failed to render health report: {e}")))?;
        println!("{rendered}");
    } else {
        println!();
        println!("  {} health", config.app.name);
        println!("  {}", "-".repeat(35));
        for health in &report {
            println!("{}", format_line(health));
        }
        println!();
    }

    let failing = report.iter().filter(|h| h.is_unhealthy()).count();
    if failing > 0 {
        return Err(AlumnetError::Internal(format!(
            "{failing} of {} adapters unhealthy",
            report.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alumnet_core::ServiceKind;
    use async_trait::async_trait;

    struct Fixed;

    #[async_trait]
    impl ServiceAdapter for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn service_kind(&self) -> ServiceKind {
            ServiceKind::Presence
        }

        async fn health_check(&self) -> Result<HealthStatus, AlumnetError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[test]
    fn healthy_line_has_no_detail() {
        let health = AdapterHealth::new(&Fixed, Ok(HealthStatus::Healthy));
        assert_eq!(format_line(&health), "    [OK]   presence       fixed");
        assert!(!health.is_unhealthy());
    }

    #[test]
    fn errors_count_as_unhealthy() {
        let health = AdapterHealth::new(
            &Fixed,
            Err(AlumnetError::remote(ServiceKind::Presence, "connection refused")),
        );
        assert!(health.is_unhealthy());
        assert!(format_line(&health).contains("[FAIL]"));
        assert!(health.detail.unwrap().contains("connection refused"));
    }

    #[test]
    fn degraded_serializes_detail() {
        let health = AdapterHealth::new(&Fixed, Ok(HealthStatus::Degraded("503".into())));
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["detail"], "503");
        assert_eq!(json["service"], "presence");
    }
}
