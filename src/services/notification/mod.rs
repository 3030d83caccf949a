pub mod log;
pub mod webhook;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::{Booking, Workspace};

/// What a requester is told after a successful booking.
#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub booking: Booking,
    pub workspace_name: String,
    pub workspace_location: String,
    pub check_in_url: String,
}

impl BookingConfirmation {
    pub fn new(booking: &Booking, workspace: &Workspace, check_in_url: String) -> Self {
        Self {
            booking: booking.clone(),
            workspace_name: workspace.name.clone(),
            workspace_location: workspace.location.clone(),
            check_in_url,
        }
    }
}

/// Delivers booking confirmations (email, QR code, ...). Called off the request
/// path; a failure here never affects the booking.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_confirmed(&self, confirmation: &BookingConfirmation) -> anyhow::Result<()>;
}
