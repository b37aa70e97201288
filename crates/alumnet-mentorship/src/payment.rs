// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment gate in front of calls and completion.

use std::sync::Arc;

use alumnet_core::{MentorshipRequest, PaymentService, RequestId, UserId};
use tracing::{debug, warn};

/// Answers "has the requester paid the mentor for this request?".
///
/// Every question goes to the payment collaborator. A transport failure is
/// read as unpaid so calls stay locked.
#[derive(Clone)]
pub struct PaymentGate {
    service: Arc<dyn PaymentService>,
}

impl PaymentGate {
    pub fn new(service: Arc<dyn PaymentService>) -> Self {
        Self { service }
    }

    pub async fn has_paid(&self, request_id: &RequestId, payer: &UserId, payee: &UserId) -> bool {
        match self.service.has_paid(payer, payee, request_id).await {
            Ok(paid) => {
                debug!(request_id = %request_id, paid, "payment status checked");
                paid
            }
            Err(e) => {
                warn!(
                    request_id = %request_id,
                    error = %e,
                    "payment check failed, treating request as unpaid"
                );
                false
            }
        }
    }

    /// The requester pays, the counterpart is paid.
    pub async fn request_paid(&self, request: &MentorshipRequest) -> bool {
        self.has_paid(&request.id, &request.requester_id, &request.counterpart_id)
            .await
    }
}
