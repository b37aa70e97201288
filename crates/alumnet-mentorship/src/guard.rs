// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion guard: minimum duration, presence interlock and payment.

use alumnet_core::{GuardRejection, RequestId, RequestStatus};

use crate::timer::remaining_minutes;

/// Everything the guard looks at for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionInputs {
    pub status: RequestStatus,
    pub elapsed_minutes: f64,
    pub counterpart_active: bool,
    pub has_paid: bool,
}

/// What the UI should show for the "mark completed" action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionAvailability {
    Available,
    /// The counterpart is still in the call room.
    Hidden,
    Waiting { remaining_minutes: u32 },
    PaymentRequired,
    NotAccepted,
}

/// Proof that the guard passed. Only [`CompletionGuard::evaluate`] makes one.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionClearance {
    request_id: RequestId,
    elapsed_minutes: f64,
}

impl CompletionClearance {
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed_minutes
    }
}

/// Decides whether a request may be marked completed.
///
/// Checks run in a fixed order (status, presence, payment, duration) so the
/// first failing rule is the one reported.
#[derive(Debug, Clone, Copy)]
pub struct CompletionGuard {
    minimum_minutes: f64,
}

impl CompletionGuard {
    pub fn new(minimum_minutes: f64) -> Self {
        Self { minimum_minutes }
    }

    pub fn minimum_minutes(&self) -> f64 {
        self.minimum_minutes
    }

    /// Checks run in a fixed order: status, presence, payment, duration.
    pub fn evaluate(
        &self,
        request_id: &RequestId,
        inputs: &CompletionInputs,
    ) -> Result<CompletionClearance, GuardRejection> {
        if inputs.status != RequestStatus::Accepted {
            return Err(GuardRejection::NotAccepted {
                status: inputs.status,
            });
        }
        if inputs.counterpart_active {
            return Err(GuardRejection::CounterpartActive);
        }
        if !inputs.has_paid {
            return Err(GuardRejection::Unpaid);
        }
        if inputs.elapsed_minutes < self.minimum_minutes {
            return Err(GuardRejection::TooShort {
                remaining_minutes: remaining_minutes(self.minimum_minutes, inputs.elapsed_minutes)
                    .max(1),
            });
        }
        Ok(CompletionClearance {
            request_id: request_id.clone(),
            elapsed_minutes: inputs.elapsed_minutes,
        })
    }

    pub fn availability(&self, request_id: &RequestId, inputs: &CompletionInputs) -> CompletionAvailability {
        match self.evaluate(request_id, inputs) {
            Ok(_) => CompletionAvailability::Available,
            Err(GuardRejection::CounterpartActive) => CompletionAvailability::Hidden,
            Err(GuardRejection::Unpaid) => CompletionAvailability::PaymentRequired,
            Err(GuardRejection::TooShort { remaining_minutes }) => {
                CompletionAvailability::Waiting { remaining_minutes }
            }
            Err(_) => CompletionAvailability::NotAccepted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> CompletionInputs {
        CompletionInputs {
            status: RequestStatus::Accepted,
            elapsed_minutes: 1.0,
            counterpart_active: false,
            has_paid: true,
        }
    }

    #[test]
    fn passes_at_exactly_the_minimum() {
        let guard = CompletionGuard::new(1.0);
        let clearance = guard.evaluate(&"r1".into(), &ready()).unwrap();
        assert_eq!(clearance.request_id().as_str(), "r1");
        assert_eq!(clearance.elapsed_minutes(), 1.0);
    }

    #[test]
    fn forty_seconds_is_too_short() {
        let guard = CompletionGuard::new(1.0);
        let inputs = CompletionInputs {
            elapsed_minutes: 40.0 / 60.0,
            ..ready()
        };
        assert_eq!(
            guard.evaluate(&"r1".into(), &inputs),
            Err(GuardRejection::TooShort { remaining_minutes: 1 })
        );
        assert_eq!(
            guard.availability(&"r1".into(), &inputs),
            CompletionAvailability::Waiting { remaining_minutes: 1 }
        );
    }

    #[test]
    fn counterpart_presence_hides_even_when_otherwise_ready() {
        let guard = CompletionGuard::new(1.0);
        let inputs = CompletionInputs {
            counterpart_active: true,
            elapsed_minutes: 30.0,
            ..ready()
        };
        assert_eq!(
            guard.availability(&"r1".into(), &inputs),
            CompletionAvailability::Hidden
        );
    }

    #[test]
    fn unpaid_and_wrong_status_are_reported() {
        let guard = CompletionGuard::new(1.0);
        let unpaid = CompletionInputs {
            has_paid: false,
            ..ready()
        };
        assert_eq!(
            guard.availability(&"r1".into(), &unpaid),
            CompletionAvailability::PaymentRequired
        );

        for status in [
            RequestStatus::Pending,
            RequestStatus::Rejected,
            RequestStatus::Completed,
        ] {
            let inputs = CompletionInputs { status, ..ready() };
            assert_eq!(
                guard.evaluate(&"r1".into(), &inputs),
                Err(GuardRejection::NotAccepted { status })
            );
        }
    }

    #[test]
    fn zero_minimum_accepts_an_instant_session() {
        let guard = CompletionGuard::new(0.0);
        let inputs = CompletionInputs {
            elapsed_minutes: 0.0,
            ..ready()
        };
        assert!(guard.evaluate(&"r1".into(), &inputs).is_ok());
    }
}
