use anyhow::Context;
use async_trait::async_trait;

use super::{BookingConfirmation, Notifier};

/// POSTs each confirmation as JSON to a delivery service that owns the
/// email/QR rendering.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn booking_confirmed(&self, confirmation: &BookingConfirmation) -> anyhow::Result<()> {
        let payload = serde_json::json!({
            "kind": "booking_confirmed",
            "booking": confirmation.booking,
            "workspace_name": confirmation.workspace_name,
            "workspace_location": confirmation.workspace_location,
            "check_in_url": confirmation.check_in_url,
        });

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("failed to send confirmation webhook")?
            .error_for_status()
            .context("confirmation webhook returned error")?;

        Ok(())
    }
}
