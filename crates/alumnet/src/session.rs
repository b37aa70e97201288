// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle commands: `view`, `accept`, `reject`, `start-call`, `end-call`,
//! `complete` and `watch`.
//!
//! Each command wires the engine against the configured HTTP collaborators
//! and the SQLite fallback store, opens one lifecycle controller, runs the
//! action and closes the controller again. Timer state lives in the store,
//! so a call started by one invocation can be ended by the next.

use std::fmt::Write as _;
use std::sync::Arc;

use alumnet_client::RemoteServices;
use alumnet_config::model::AlumnetConfig;
use alumnet_core::{
    AlumnetError, CallType, MentorshipRequest, RequestId, SystemClock, UserId,
};
use alumnet_mentorship::{
    CallLaunch, Collaborators, CompletionAvailability, LifecycleController, MentorshipEngine,
    SessionSettings,
};
use alumnet_storage::SqliteFallbackStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::Target;
use crate::shutdown::install_signal_handler;

/// An engine wired for one CLI invocation.
struct Wiring {
    engine: Arc<MentorshipEngine>,
    store: Arc<SqliteFallbackStore>,
    root: CancellationToken,
}

impl Wiring {
    async fn connect(config: &AlumnetConfig) -> Result<Self, AlumnetError> {
        let services = RemoteServices::from_config(&config.services)?;

        let store = Arc::new(SqliteFallbackStore::new(config.storage.clone()));
        store.initialize().await?;

        let collaborators = Collaborators {
            session_log: services.session_log,
            presence: services.presence,
            payment: services.payment,
            requests: services.requests,
            store: store.clone(),
            clock: Arc::new(SystemClock),
        };
        let engine = Arc::new(MentorshipEngine::new(
            collaborators,
            SessionSettings::from_config(config),
        ));
        debug!(database = %config.storage.database_path, "engine wired");

        Ok(Self {
            engine,
            store,
            root: CancellationToken::new(),
        })
    }

    async fn open(&self, target: &Target) -> Result<LifecycleController, AlumnetError> {
        self.engine
            .open(
                &UserId::from(target.user.as_str()),
                &RequestId::from(target.request.as_str()),
                &self.root,
            )
            .await
    }

    /// Stop background work and checkpoint the store.
    async fn finish(self, controller: LifecycleController) -> Result<(), AlumnetError> {
        controller.close().await;
        self.root.cancel();
        self.store.flush().await
    }
}

/// JSON shape of `--json` output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewReport<'a> {
    request: &'a MentorshipRequest,
    completion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    call_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    call: Option<&'a CallLaunch>,
}

fn describe_availability(availability: &CompletionAvailability) -> String {
    match availability {
        CompletionAvailability::Available => "available".to_string(),
        CompletionAvailability::Hidden => "hidden (counterpart still in the call room)".to_string(),
        CompletionAvailability::Waiting { remaining_minutes } => {
            format!("available in {remaining_minutes} min")
        }
        CompletionAvailability::PaymentRequired => "payment required".to_string(),
        CompletionAvailability::NotAccepted => "not applicable".to_string(),
    }
}

fn render_view(
    request: &MentorshipRequest,
    availability: &CompletionAvailability,
    call_started_at: Option<DateTime<Utc>>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  request   {}", request.id);
    let _ = writeln!(out, "  status    {}", request.status);
    if let Some(reason) = &request.rejection_reason {
        let _ = writeln!(out, "  reason    {reason}");
    }
    let _ = writeln!(
        out,
        "  calls     {} ({} min total)",
        request.call_history.len(),
        request.total_call_duration
    );
    if let Some(at) = request.last_call_completed_at {
        let _ = writeln!(out, "  last call {}", at.to_rfc3339());
    }
    if let Some(at) = call_started_at {
        let _ = writeln!(out, "  in call   since {}", at.to_rfc3339());
    }
    let _ = writeln!(out, "  complete  {}", describe_availability(availability));
    out
}

async fn report(
    controller: &LifecycleController,
    view: &MentorshipRequest,
    launch: Option<&CallLaunch>,
    json: bool,
) -> Result<(), AlumnetError> {
    let availability = controller.completion_availability().await;
    let call_started_at = controller.call_started_at().await;

    if json {
        let report = ViewReport {
            request: view,
            completion: describe_availability(&availability),
            call_started_at,
            call: launch,
        };
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| AlumnetError::Internal(format!("failed to render view: {e}")))?;
        println!("{rendered}");
    } else {
        if let Some(launch) = launch {
            println!("  join      {}", launch.attendee_link);
        }
        print!("{}", render_view(view, &availability, call_started_at));
    }
    Ok(())
}

pub async fn run_view(config: &AlumnetConfig, target: &Target, json: bool) -> Result<(), AlumnetError> {
    let wiring = Wiring::connect(config).await?;
    let controller = wiring.open(target).await?;
    let view = controller.merged_view().await;
    report(&controller, &view, None, json).await?;
    wiring.finish(controller).await
}

pub async fn run_accept(config: &AlumnetConfig, target: &Target, json: bool) -> Result<(), AlumnetError> {
    let wiring = Wiring::connect(config).await?;
    let controller = wiring.open(target).await?;
    let view = controller.accept().await?;
    info!(request_id = %target.request, "request accepted");
    report(&controller, &view, None, json).await?;
    wiring.finish(controller).await
}

pub async fn run_reject(
    config: &AlumnetConfig,
    target: &Target,
    reason: &str,
    json: bool,
) -> Result<(), AlumnetError> {
    let wiring = Wiring::connect(config).await?;
    let controller = wiring.open(target).await?;
    let view = controller.reject(reason).await?;
    report(&controller, &view, None, json).await?;
    wiring.finish(controller).await
}

pub async fn run_start_call(
    config: &AlumnetConfig,
    target: &Target,
    call_type: CallType,
    json: bool,
) -> Result<(), AlumnetError> {
    let wiring = Wiring::connect(config).await?;
    let controller = wiring.open(target).await?;
    let launch = controller.start_call(call_type).await?;
    let view = controller.merged_view().await;
    report(&controller, &view, Some(&launch), json).await?;
    wiring.finish(controller).await
}

pub async fn run_end_call(
    config: &AlumnetConfig,
    target: &Target,
    call_type: CallType,
    json: bool,
) -> Result<(), AlumnetError> {
    let wiring = Wiring::connect(config).await?;
    let controller = wiring.open(target).await?;
    let view = controller.end_call(call_type).await?;
    report(&controller, &view, None, json).await?;
    wiring.finish(controller).await
}

pub async fn run_complete(config: &AlumnetConfig, target: &Target, json: bool) -> Result<(), AlumnetError> {
    let wiring = Wiring::connect(config).await?;
    let controller = wiring.open(target).await?;
    let view = controller.mark_completed().await?;
    report(&controller, &view, None, json).await?;
    wiring.finish(controller).await
}

/// Follow one request until Ctrl+C or until it reaches a terminal status.
pub async fn run_watch(config: &AlumnetConfig, target: &Target) -> Result<(), AlumnetError> {
    let wiring = Wiring::connect(config).await?;
    let controller = wiring.open(target).await?;
    let stop = install_signal_handler();

    let mut ticker = tokio::time::interval(config.poller.interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last = String::new();

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let view = controller.refresh().await;
        let rendered = render_view(
            &view,
            &controller.completion_availability().await,
            controller.call_started_at().await,
        );
        if rendered != last {
            println!("{rendered}");
            last = rendered;
        }
        if view.status.is_terminal() {
            info!(request_id = %target.request, status = %view.status, "request settled, stopping watch");
            break;
        }
    }

    wiring.finish(controller).await
}
