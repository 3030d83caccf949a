//! Status transitions after a booking exists.
//!
//! ```text
//! pending ──► confirmed ──► checked_in ──► completed
//!    │            │
//!    └────────────┴──► cancelled
//! ```
//!
//! Every transition is a compare-and-set on the current status, so two
//! concurrent requests cannot both apply the same transition.

use chrono::{NaiveDateTime, SubsecRound};

use crate::errors::BookingError;
use crate::models::{Booking, BookingEventKind, BookingStatus};
use crate::services::reservation::BookingService;

fn rejection(from: BookingStatus, to: BookingStatus) -> BookingError {
    match (from, to) {
        (BookingStatus::Cancelled, BookingStatus::Cancelled) => BookingError::AlreadyCancelled,
        (BookingStatus::CheckedIn, BookingStatus::CheckedIn) => BookingError::AlreadyCheckedIn,
        (from, to) => BookingError::InvalidTransition { from, to },
    }
}

impl BookingService {
    /// Loads a booking the requester owns. Other users' bookings are reported
    /// as missing.
    async fn owned_booking(
        &self,
        booking_id: &str,
        requester_id: &str,
    ) -> Result<Booking, BookingError> {
        match self.store.get_booking(booking_id).await? {
            Some(b) if b.requester_id == requester_id => Ok(b),
            _ => Err(BookingError::NotFound(format!("booking {booking_id}"))),
        }
    }

    async fn apply(
        &self,
        booking: Booking,
        to: BookingStatus,
        check_in_time: Option<NaiveDateTime>,
        now: NaiveDateTime,
        kind: BookingEventKind,
    ) -> Result<Booking, BookingError> {
        let swapped = self
            .store
            .transition_status(&booking.id, booking.status, to, check_in_time, now)
            .await?;

        if !swapped {
            // Someone else moved it first; report against what they left behind.
            let current = self
                .store
                .get_booking(&booking.id)
                .await?
                .ok_or_else(|| BookingError::NotFound(format!("booking {}", booking.id)))?;
            tracing::info!(
                booking_id = %booking.id,
                expected = %booking.status,
                found = %current.status,
                "status changed concurrently"
            );
            return Err(rejection(current.status, to));
        }

        let updated = Booking {
            status: to,
            check_in_time: check_in_time.or(booking.check_in_time),
            updated_at: now,
            ..booking
        };
        tracing::info!(booking_id = %updated.id, status = %to, "booking status changed");
        self.publish(kind, &updated);
        Ok(updated)
    }

    /// Cancels a pending or confirmed booking before it starts. The slot is
    /// free again as soon as this returns.
    pub async fn cancel_booking(
        &self,
        booking_id: &str,
        requester_id: &str,
        now: NaiveDateTime,
    ) -> Result<Booking, BookingError> {
        let booking = self.owned_booking(booking_id, requester_id).await?;
        if !booking.status.can_transition_to(BookingStatus::Cancelled) {
            return Err(rejection(booking.status, BookingStatus::Cancelled));
        }
        if now >= booking.start_time {
            return Err(BookingError::PastStartTime);
        }

        let now = now.trunc_subsecs(0);
        self.apply(
            booking,
            BookingStatus::Cancelled,
            None,
            now,
            BookingEventKind::Cancelled,
        )
        .await
    }

    /// Marks a confirmed booking as in use and records when that happened.
    pub async fn check_in(
        &self,
        booking_id: &str,
        requester_id: &str,
        now: NaiveDateTime,
    ) -> Result<Booking, BookingError> {
        let booking = self.owned_booking(booking_id, requester_id).await?;
        if !booking.status.can_transition_to(BookingStatus::CheckedIn) {
            return Err(rejection(booking.status, BookingStatus::CheckedIn));
        }

        let now = now.trunc_subsecs(0);
        self.apply(
            booking,
            BookingStatus::CheckedIn,
            Some(now),
            now,
            BookingEventKind::CheckedIn,
        )
        .await
    }

    /// Administrative close-out; not reachable by end users.
    pub async fn complete_booking(
        &self,
        booking_id: &str,
        now: NaiveDateTime,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {booking_id}")))?;
        if !booking.status.can_transition_to(BookingStatus::Completed) {
            return Err(rejection(booking.status, BookingStatus::Completed));
        }
        if now < booking.start_time {
            return Err(BookingError::NotStarted);
        }

        let now = now.trunc_subsecs(0);
        self.apply(
            booking,
            BookingStatus::Completed,
            None,
            now,
            BookingEventKind::Completed,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::queries::fixtures::*;
    use crate::services::reservation::test_support::*;

    async fn booked(svc: &BookingService, start: &str, end: &str) -> Booking {
        svc.create_booking(request("ws-1", "user-1", start, end), morning())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_cancellation_frees_the_slot() {
        let svc = service(seeded_db());
        let first = booked(&svc, "2025-06-16 09:00", "2025-06-16 11:00").await;

        let cancelled = svc
            .cancel_booking(&first.id, "user-1", dt("2025-06-16 08:00"))
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let again = svc
            .create_booking(
                request("ws-1", "user-2", "2025-06-16 09:00", "2025-06-16 11:00"),
                dt("2025-06-16 08:00"),
            )
            .await
            .unwrap();
        assert_eq!(again.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_cancel_after_start_is_rejected() {
        let svc = service(seeded_db());
        let booking = booked(&svc, "2025-06-16 09:00", "2025-06-16 11:00").await;

        for now in ["2025-06-16 09:00", "2025-06-16 10:00"] {
            let err = svc
                .cancel_booking(&booking.id, "user-1", dt(now))
                .await
                .unwrap_err();
            assert_eq!(err, BookingError::PastStartTime);
        }

        let stored = svc.store().get_booking(&booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_cancel_twice_reports_already_cancelled() {
        let svc = service(seeded_db());
        let booking = booked(&svc, "2025-06-16 09:00", "2025-06-16 11:00").await;
        svc.cancel_booking(&booking.id, "user-1", morning())
            .await
            .unwrap();

        let err = svc
            .cancel_booking(&booking.id, "user-1", morning())
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::AlreadyCancelled);
    }

    #[tokio::test]
    async fn test_other_requester_sees_not_found() {
        let svc = service(seeded_db());
        let booking = booked(&svc, "2025-06-16 09:00", "2025-06-16 11:00").await;

        let err = svc
            .cancel_booking(&booking.id, "user-2", morning())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
        let err = svc
            .check_in(&booking.id, "user-2", morning())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
        let err = svc
            .check_in("missing", "user-1", morning())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_check_in_is_idempotent() {
        let svc = service(seeded_db());
        let booking = booked(&svc, "2025-06-16 09:00", "2025-06-16 11:00").await;

        let first_at = dt("2025-06-16 09:02");
        let checked_in = svc.check_in(&booking.id, "user-1", first_at).await.unwrap();
        assert_eq!(checked_in.status, BookingStatus::CheckedIn);
        assert_eq!(checked_in.check_in_time, Some(first_at));

        let err = svc
            .check_in(&booking.id, "user-1", dt("2025-06-16 09:30"))
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::AlreadyCheckedIn);

        let stored = svc.store().get_booking(&booking.id).await.unwrap().unwrap();
        assert_eq!(stored.check_in_time, Some(first_at));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_check_in_applies_once() {
        let svc = Arc::new(service(seeded_db()));
        let booking = booked(&svc, "2025-06-16 09:00", "2025-06-16 11:00").await;

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let svc = Arc::clone(&svc);
                let id = booking.id.clone();
                tokio::spawn(async move {
                    let at = dt("2025-06-16 09:00") + chrono::Duration::minutes(i);
                    svc.check_in(&id, "user-1", at).await
                })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert_eq!(e, BookingError::AlreadyCheckedIn),
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn test_checked_in_booking_cannot_be_cancelled() {
        let svc = service(seeded_db());
        let booking = booked(&svc, "2025-06-16 09:00", "2025-06-16 11:00").await;
        svc.check_in(&booking.id, "user-1", morning()).await.unwrap();

        let err = svc
            .cancel_booking(&booking.id, "user-1", morning())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BookingError::InvalidTransition {
                from: BookingStatus::CheckedIn,
                to: BookingStatus::Cancelled,
            }
        );
    }

    #[tokio::test]
    async fn test_terminal_states_reject_everything() {
        let svc = service(seeded_db());
        let booking = booked(&svc, "2025-06-16 09:00", "2025-06-16 11:00").await;
        svc.check_in(&booking.id, "user-1", dt("2025-06-16 09:00"))
            .await
            .unwrap();
        let completed = svc
            .complete_booking(&booking.id, dt("2025-06-16 11:00"))
            .await
            .unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
        assert!(completed.check_in_time.is_some());

        let err = svc
            .check_in(&booking.id, "user-1", dt("2025-06-16 11:05"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));
        let err = svc
            .complete_booking(&booking.id, dt("2025-06-16 11:05"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));

        let stored = svc.store().get_booking(&booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn test_completion_before_start_keeps_the_slot_blocked() {
        let svc = service(seeded_db());
        let booking = booked(&svc, "2025-06-16 09:00", "2025-06-16 11:00").await;

        let err = svc
            .complete_booking(&booking.id, dt("2025-06-16 08:59"))
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::NotStarted);

        let stored = svc.store().get_booking(&booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);

        let err = svc
            .create_booking(
                request("ws-1", "user-2", "2025-06-16 10:00", "2025-06-16 12:00"),
                morning(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::Conflict);

        let completed = svc
            .complete_booking(&booking.id, dt("2025-06-16 09:00"))
            .await
            .unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn test_cancelled_booking_cannot_check_in() {
        let svc = service(seeded_db());
        let booking = booked(&svc, "2025-06-16 09:00", "2025-06-16 11:00").await;
        svc.cancel_booking(&booking.id, "user-1", morning())
            .await
            .unwrap();

        let err = svc
            .check_in(&booking.id, "user-1", morning())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BookingError::InvalidTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::CheckedIn,
            }
        );
    }

    #[tokio::test]
    async fn test_transitions_publish_events() {
        let svc = service(seeded_db());
        let booking = booked(&svc, "2025-06-16 09:00", "2025-06-16 11:00").await;
        let mut rx = svc.subscribe();

        svc.check_in(&booking.id, "user-1", morning()).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, BookingEventKind::CheckedIn);
        assert_eq!(event.booking.status, BookingStatus::CheckedIn);
    }
}
