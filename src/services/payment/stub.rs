use async_trait::async_trait;

use super::{PaymentAuthorization, PaymentError, PaymentGateway, PaymentRequest};

/// Approves every charge. Stands in until a real provider is wired up.
pub struct StubGateway;

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn authorize(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentAuthorization, PaymentError> {
        let reference = format!("stub_{}", uuid::Uuid::new_v4().simple());
        tracing::info!(
            requester_id = %request.requester_id,
            amount = request.amount,
            reference = %reference,
            "stub payment authorized"
        );
        Ok(PaymentAuthorization { reference })
    }

    async fn void(&self, authorization: &PaymentAuthorization) -> Result<(), PaymentError> {
        tracing::info!(reference = %authorization.reference, "stub payment voided");
        Ok(())
    }
}
