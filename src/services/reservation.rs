use std::sync::Arc;

use chrono::{NaiveDateTime, SubsecRound};
use tokio::sync::broadcast;

use crate::db::{BookingStore, StoreError};
use crate::errors::BookingError;
use crate::models::{Booking, BookingEvent, BookingEventKind, BookingStatus, NewBooking};
use crate::services::availability;
use crate::services::notification::{BookingConfirmation, Notifier};
use crate::services::payment::{PaymentError, PaymentGateway, PaymentRequest};
use crate::services::pricing;

/// Entry point for every booking write: reservations here, status
/// transitions in `services::transitions`.
pub struct BookingService {
    pub(crate) store: Arc<dyn BookingStore>,
    payments: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<BookingEvent>,
    check_in_base_url: String,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        payments: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        check_in_base_url: String,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            store,
            payments,
            notifier,
            events,
            check_in_base_url: check_in_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn store(&self) -> &dyn BookingStore {
        self.store.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.events.subscribe()
    }

    /// Link encoded into the check-in QR code.
    pub fn check_in_url(&self, booking_id: &str) -> String {
        format!("{}/check-in/{booking_id}", self.check_in_base_url)
    }

    pub(crate) fn publish(&self, kind: BookingEventKind, booking: &Booking) {
        // No subscribers is fine.
        let _ = self.events.send(BookingEvent {
            kind,
            booking: booking.clone(),
        });
    }

    pub async fn is_available(
        &self,
        workspace_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<bool, BookingError> {
        availability::is_available(self.store(), workspace_id, start, end).await
    }

    /// Reserves a workspace for `[start_time, end_time)` and returns the
    /// confirmed booking.
    ///
    /// The availability read is a fast path; the store's exclusion constraint
    /// decides the outcome when two requests race for the same slot, and the
    /// loser gets [`BookingError::Conflict`].
    pub async fn create_booking(
        &self,
        request: NewBooking,
        now: NaiveDateTime,
    ) -> Result<Booking, BookingError> {
        let (start, end) = availability::normalize_interval(request.start_time, request.end_time)?;
        let now = now.trunc_subsecs(0);
        if start < now {
            return Err(BookingError::InvalidInterval(format!(
                "start {start} is in the past"
            )));
        }

        let workspace = self
            .store
            .get_workspace(&request.workspace_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("workspace {}", request.workspace_id)))?;

        let existing = self.store.active_bookings_for_workspace(&workspace.id).await?;
        if !availability::find_conflicts(&existing, &start, &end).is_empty() {
            tracing::info!(workspace_id = %workspace.id, %start, %end, "slot unavailable");
            return Err(BookingError::Conflict);
        }

        let amount = pricing::quote(&workspace, &start, &end).ok_or_else(|| {
            BookingError::InvalidInterval(format!("price for {start} - {end} is out of range"))
        })?;
        let authorization = self
            .payments
            .authorize(&PaymentRequest {
                requester_id: request.requester_id.clone(),
                workspace_id: workspace.id.clone(),
                amount,
                description: format!("{} {start} - {end}", workspace.name),
            })
            .await
            .map_err(|e| match e {
                PaymentError::Declined(reason) => BookingError::PaymentDeclined(reason),
                PaymentError::Provider(reason) => BookingError::PaymentUnavailable(reason),
            })?;

        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            workspace_id: workspace.id.clone(),
            requester_id: request.requester_id,
            start_time: start,
            end_time: end,
            status: BookingStatus::Confirmed,
            total_price: amount,
            payment_reference: Some(authorization.reference.clone()),
            check_in_time: None,
            created_at: now,
            updated_at: now,
        };

        // A failed insert never leaves a row behind, so the authorization is
        // always released.
        if let Err(e) = self.store.insert_booking(&booking).await {
            match &e {
                StoreError::Overlap => {
                    tracing::info!(workspace_id = %workspace.id, %start, %end, "lost booking race");
                }
                StoreError::Unavailable(msg) => {
                    tracing::warn!(booking_id = %booking.id, error = %msg, "booking insert failed");
                }
            }
            if let Err(void_err) = self.payments.void(&authorization).await {
                tracing::error!(
                    reference = %authorization.reference,
                    error = %void_err,
                    "failed to void payment after failed insert"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            booking_id = %booking.id,
            workspace_id = %booking.workspace_id,
            requester_id = %booking.requester_id,
            "booking confirmed"
        );

        self.publish(BookingEventKind::Created, &booking);

        let confirmation =
            BookingConfirmation::new(&booking, &workspace, self.check_in_url(&booking.id));
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.booking_confirmed(&confirmation).await {
                tracing::warn!(
                    booking_id = %confirmation.booking.id,
                    error = %e,
                    "failed to deliver booking confirmation"
                );
            }
        });

        Ok(booking)
    }
}
