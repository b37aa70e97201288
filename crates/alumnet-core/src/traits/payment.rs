// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment-status collaborator.

use async_trait::async_trait;

use crate::error::AlumnetError;
use crate::traits::adapter::ServiceAdapter;
use crate::types::{RequestId, UserId};

/// Answers whether a payer has a verified payment to a payee for a request.
///
/// Payment records are written by the external gateway after checkout and
/// are immutable once `true`.
#[async_trait]
pub trait PaymentService: ServiceAdapter {
    async fn has_paid(
        &self,
        payer: &UserId,
        payee: &UserId,
        request_id: &RequestId,
    ) -> Result<bool, AlumnetError>;
}
