use async_trait::async_trait;

use super::{BookingConfirmation, Notifier};

/// Used when no delivery webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn booking_confirmed(&self, confirmation: &BookingConfirmation) -> anyhow::Result<()> {
        tracing::info!(
            booking_id = %confirmation.booking.id,
            requester_id = %confirmation.booking.requester_id,
            workspace = %confirmation.workspace_name,
            check_in_url = %confirmation.check_in_url,
            "booking confirmation (no delivery configured)"
        );
        Ok(())
    }
}
