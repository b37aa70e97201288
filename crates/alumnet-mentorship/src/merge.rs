// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation of call history from the ledger, the device fallback
//! cache and optimistic local records.
//!
//! [`merge`] is the only place these sources are combined. It is pure, so
//! the controller and the property tests see the same rules:
//!
//! 1. Ledger records are the base and always win a `callId` conflict.
//! 2. Fallback records are added only for `callId`s the ledger does not
//!    know. With an empty ledger this substitutes the fallback history,
//!    duration and completion flag wholesale.
//! 3. Optimistic records are appended when their `callId` is still absent.
//! 4. The total is recomputed over the deduplicated history.
//! 5. Completion is sticky: any source asserting it wins.
//! 6. Status only moves forward from the previously shown view, so a stale
//!    repository copy cannot reopen or reject a completed request.

use std::collections::HashSet;

use alumnet_core::{CallHistoryEntry, CallRecord, CallStatus, MentorshipRequest, RequestStatus};

/// The inputs folded into one request view.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeSources<'a> {
    /// Entry from the session log, `None` when the read failed.
    pub ledger: Option<&'a CallHistoryEntry>,
    /// Entry from the device fallback cache.
    pub fallback: Option<&'a CallHistoryEntry>,
    /// Records this process produced or already showed.
    pub optimistic: &'a [CallRecord],
    /// A remote acknowledgement or manual completion observed locally.
    pub completion_asserted: bool,
    /// Status of the view shown before this merge, if any.
    pub previous: Option<RequestStatus>,
}

pub fn merge(base: &MentorshipRequest, sources: &MergeSources<'_>) -> MentorshipRequest {
    let ledger_history = sources.ledger.map(|e| e.history.as_slice()).unwrap_or_default();
    let fallback_history = sources
        .fallback
        .map(|e| e.history.as_slice())
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let mut history: Vec<CallRecord> = Vec::new();
    for record in ledger_history
        .iter()
        .chain(fallback_history)
        .chain(sources.optimistic)
    {
        if seen.insert(record.call_id.as_str()) {
            history.push(record.clone());
        }
    }
    history.sort_by_key(|r| r.start_time);

    // Totals only survive on their own when no record backs them.
    let total_call_duration = if history.is_empty() {
        sources
            .fallback
            .or(sources.ledger)
            .map_or(base.total_call_duration, |e| e.total_call_duration)
    } else {
        history.iter().map(CallRecord::counted_minutes).sum()
    };

    let last_call_completed_at = history
        .iter()
        .filter(|r| r.status == CallStatus::Completed)
        .filter_map(|r| r.end_time)
        .max()
        .or_else(|| {
            [sources.ledger, sources.fallback]
                .into_iter()
                .flatten()
                .filter_map(|e| e.last_call_completed_at)
                .chain(base.last_call_completed_at)
                .max()
        });

    let completion_claimed = base.status == RequestStatus::Completed
        || sources.completion_asserted
        || sources.ledger.is_some_and(|e| e.completed)
        || sources.fallback.is_some_and(|e| e.completed);

    let claimed = if completion_claimed && base.status != RequestStatus::Rejected {
        RequestStatus::Completed
    } else {
        base.status
    };
    let status = match sources.previous {
        Some(previous) if !previous.can_reach(claimed) => previous,
        _ => claimed,
    };
    let rejection_reason = if status == RequestStatus::Rejected {
        base.rejection_reason.clone()
    } else {
        None
    };

    MentorshipRequest {
        id: base.id.clone(),
        requester_id: base.requester_id.clone(),
        counterpart_id: base.counterpart_id.clone(),
        status,
        rejection_reason,
        call_history: history,
        total_call_duration,
        last_call_completed_at,
        completed_manually: base.completed_manually,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alumnet_core::{CallType, RequestId};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
    }

    fn base() -> MentorshipRequest {
        let mut request = MentorshipRequest::pending("r1".into(), "s1".into(), "m1".into());
        request.status = RequestStatus::Accepted;
        request
    }

    fn done(call_id: &str, offset_min: i64, minutes: i64) -> CallRecord {
        let start = t0() + Duration::minutes(offset_min);
        CallRecord::completed(
            call_id.into(),
            CallType::Video,
            start,
            start + Duration::minutes(minutes),
        )
    }

    fn entry(history: Vec<CallRecord>, completed: bool) -> CallHistoryEntry {
        let total = history.iter().map(CallRecord::counted_minutes).sum();
        CallHistoryEntry {
            request_id: RequestId::from("r1"),
            history,
            total_call_duration: total,
            last_call_completed_at: None,
            completed,
        }
    }

    #[test]
    fn empty_ledger_takes_fallback_wholesale() {
        let ledger = entry(Vec::new(), false);
        let fallback = entry(vec![done("c1", 0, 5)], true);

        let merged = merge(
            &base(),
            &MergeSources {
                ledger: Some(&ledger),
                fallback: Some(&fallback),
                ..Default::default()
            },
        );

        assert_eq!(merged.total_call_duration, 5);
        assert_eq!(merged.status, RequestStatus::Completed);
        assert_eq!(merged.call_history.len(), 1);
        assert_eq!(merged.last_call_completed_at, Some(t0() + Duration::minutes(5)));
    }

    #[test]
    fn ledger_wins_call_id_conflicts() {
        let ledger = entry(vec![done("c1", 0, 3)], false);
        let fallback = entry(vec![done("c1", 0, 9), done("local-1", 30, 2)], false);

        let merged = merge(
            &base(),
            &MergeSources {
                ledger: Some(&ledger),
                fallback: Some(&fallback),
                ..Default::default()
            },
        );

        assert_eq!(merged.call_history.len(), 2);
        assert_eq!(merged.call_history[0].duration, Some(3));
        assert_eq!(merged.total_call_duration, 5);
        assert_eq!(merged.status, RequestStatus::Accepted);
    }

    #[test]
    fn optimistic_record_survives_an_empty_reread() {
        let optimistic = vec![done("local-abc", 0, 2)];
        let ledger = entry(Vec::new(), false);

        let merged = merge(
            &base(),
            &MergeSources {
                ledger: Some(&ledger),
                optimistic: &optimistic,
                ..Default::default()
            },
        );

        assert_eq!(merged.call_history, optimistic);
        assert_eq!(merged.total_call_duration, 2);
    }

    #[test]
    fn unavailable_sources_keep_the_base_view() {
        let mut request = base();
        request.total_call_duration = 7;

        let merged = merge(&request, &MergeSources::default());
        assert_eq!(merged.total_call_duration, 7);
        assert_eq!(merged.status, RequestStatus::Accepted);
    }

    #[test]
    fn in_progress_records_do_not_count() {
        let running = CallRecord::started("c2".into(), CallType::Audio, t0() + Duration::hours(1));
        let ledger = entry(vec![done("c1", 0, 4), running], false);

        let merged = merge(
            &base(),
            &MergeSources {
                ledger: Some(&ledger),
                ..Default::default()
            },
        );
        assert_eq!(merged.total_call_duration, 4);
    }

    #[test]
    fn rejected_requests_are_never_completed() {
        let mut request = base();
        request.status = RequestStatus::Rejected;

        let merged = merge(
            &request,
            &MergeSources {
                completion_asserted: true,
                ..Default::default()
            },
        );
        assert_eq!(merged.status, RequestStatus::Rejected);
    }

    #[test]
    fn stale_repository_copy_cannot_move_status_backward() {
        let mut stale = base();
        stale.status = RequestStatus::Rejected;
        stale.rejection_reason = Some("Schedule conflict".into());

        let merged = merge(
            &stale,
            &MergeSources {
                previous: Some(RequestStatus::Completed),
                ..Default::default()
            },
        );
        assert_eq!(merged.status, RequestStatus::Completed);
        assert_eq!(merged.rejection_reason, None);

        let mut pending = base();
        pending.status = RequestStatus::Pending;
        let merged = merge(
            &pending,
            &MergeSources {
                previous: Some(RequestStatus::Accepted),
                ..Default::default()
            },
        );
        assert_eq!(merged.status, RequestStatus::Accepted);
    }

    #[test]
    fn remote_progress_is_still_taken() {
        let mut remote = base();
        remote.status = RequestStatus::Completed;

        let merged = merge(
            &remote,
            &MergeSources {
                previous: Some(RequestStatus::Pending),
                ..Default::default()
            },
        );
        assert_eq!(merged.status, RequestStatus::Completed);
    }

    fn arb_record() -> impl Strategy<Value = CallRecord> {
        (0u8..6, 0i64..600, 0i64..90, any::<bool>()).prop_map(|(id, offset, minutes, finished)| {
            let call_id = format!("c{id}");
            if finished {
                done(&call_id, offset, minutes)
            } else {
                CallRecord::started(call_id, CallType::Video, t0() + Duration::minutes(offset))
            }
        })
    }

    proptest! {
        #[test]
        fn total_matches_deduplicated_history(
            ledger in prop::collection::vec(arb_record(), 0..6),
            fallback in prop::collection::vec(arb_record(), 0..6),
            optimistic in prop::collection::vec(arb_record(), 0..4),
        ) {
            let ledger = entry(ledger, false);
            let fallback = entry(fallback, false);
            let merged = merge(&base(), &MergeSources {
                ledger: Some(&ledger),
                fallback: Some(&fallback),
                optimistic: &optimistic,
                completion_asserted: false,
                previous: None,
            });

            let ids: HashSet<_> = merged.call_history.iter().map(|r| r.call_id.clone()).collect();
            prop_assert_eq!(ids.len(), merged.call_history.len());
            if !merged.call_history.is_empty() {
                let expected: u32 = merged.call_history.iter().map(CallRecord::counted_minutes).sum();
                prop_assert_eq!(merged.total_call_duration, expected);
            }
        }

        #[test]
        fn completion_is_never_rolled_back(
            ledger_done in any::<bool>(),
            fallback_done in any::<bool>(),
            asserted in any::<bool>(),
            records in prop::collection::vec(arb_record(), 0..4),
        ) {
            let ledger = entry(records.clone(), ledger_done);
            let fallback = entry(records, fallback_done);
            let first = merge(&base(), &MergeSources {
                ledger: Some(&ledger),
                fallback: Some(&fallback),
                optimistic: &[],
                completion_asserted: asserted,
                previous: None,
            });

            let silent = entry(Vec::new(), false);
            let reread = merge(&first, &MergeSources {
                ledger: Some(&silent),
                fallback: None,
                optimistic: &first.call_history,
                completion_asserted: false,
                previous: Some(first.status),
            });

            if ledger_done || fallback_done || asserted {
                prop_assert_eq!(first.status, RequestStatus::Completed);
            }
            if first.status == RequestStatus::Completed {
                prop_assert_eq!(reread.status, RequestStatus::Completed);
            }
            prop_assert_eq!(reread.call_history, first.call_history);
        }
    }
}
