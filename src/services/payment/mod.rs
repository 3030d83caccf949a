pub mod stub;

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub requester_id: String,
    pub workspace_id: String,
    /// Minor currency units.
    pub amount: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentAuthorization {
    pub reference: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PaymentError {
    #[error("{0}")]
    Declined(String),

    #[error("payment provider error: {0}")]
    Provider(String),
}

/// Authorizes a charge before a booking row is written. `void` releases an
/// authorization whose booking could not be committed.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(&self, request: &PaymentRequest)
        -> Result<PaymentAuthorization, PaymentError>;

    async fn void(&self, authorization: &PaymentAuthorization) -> Result<(), PaymentError>;
}
