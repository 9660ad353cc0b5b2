use tracing::info;

use super::BillingService;
use crate::error::{BillingResult, for_customer};

impl BillingService {
    /// Attach `source_token` as the customer's default source.
    ///
    /// Any previous default source is superseded by the same processor call.
    pub async fn replace_payment_source_for_customer(
        &self,
        customer_id: &str,
        source_token: &str,
    ) -> BillingResult<()> {
        let customer = self
            .processor
            .set_default_source(customer_id, source_token)
            .await
            .map_err(|e| for_customer(customer_id, e))?;
        info!(
            customer_id = %customer_id,
            source = customer.default_source.as_deref().unwrap_or("-"),
            "Replaced default payment source"
        );
        Ok(())
    }

    /// Clear the customer's default source; later charges fail until a new one is attached
    pub async fn remove_payment_source_from_customer(
        &self,
        customer_id: &str,
    ) -> BillingResult<()> {
        self.processor
            .clear_default_source(customer_id)
            .await
            .map_err(|e| for_customer(customer_id, e))?;
        info!(customer_id = %customer_id, "Removed default payment source");
        Ok(())
    }

    pub async fn does_customer_have_active_payment_source(
        &self,
        customer_id: &str,
    ) -> BillingResult<bool> {
        let customer = self
            .processor
            .retrieve_customer(customer_id)
            .await
            .map_err(|e| for_customer(customer_id, e))?;
        Ok(customer.has_default_source())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use billpilot_types::ProcessorErrorKind;

    use crate::{BillingError, BillingService, SandboxProcessor};

    async fn service_with_customer() -> (BillingService, String) {
        let service = BillingService::new(Arc::new(SandboxProcessor::default()));
        let id = service
            .create_customer("anEmail@email.com", "a description", None)
            .await
            .unwrap();
        (service, id)
    }

    #[tokio::test]
    async fn test_source_presence_follows_attach_and_remove() {
        let (service, id) = service_with_customer().await;
        assert!(!service.does_customer_have_active_payment_source(&id).await.unwrap());

        service
            .replace_payment_source_for_customer(&id, "tok_amex")
            .await
            .unwrap();
        assert!(service.does_customer_have_active_payment_source(&id).await.unwrap());

        service.remove_payment_source_from_customer(&id).await.unwrap();
        assert!(!service.does_customer_have_active_payment_source(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_supersedes_previous_source() {
        let (service, id) = service_with_customer().await;
        service
            .replace_payment_source_for_customer(&id, "tok_amex")
            .await
            .unwrap();
        let first = service
            .retrieve_customer_by_id(&id)
            .await
            .unwrap()
            .unwrap()
            .default_source;

        service
            .replace_payment_source_for_customer(&id, "tok_visa")
            .await
            .unwrap();
        let second = service
            .retrieve_customer_by_id(&id)
            .await
            .unwrap()
            .unwrap()
            .default_source;

        assert!(first.is_some() && second.is_some());
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_removing_absent_source_is_harmless() {
        let (service, id) = service_with_customer().await;
        service.remove_payment_source_from_customer(&id).await.unwrap();
        assert!(!service.does_customer_have_active_payment_source(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_token_is_processor_fault() {
        let (service, id) = service_with_customer().await;
        let err = service
            .replace_payment_source_for_customer(&id, "not-a-token")
            .await
            .unwrap_err();
        assert_eq!(
            err.processor_error().map(|e| e.kind),
            Some(ProcessorErrorKind::NotFound)
        );
    }

    #[tokio::test]
    async fn test_unknown_customer_is_customer_not_found() {
        let (service, _) = service_with_customer().await;
        let result = service.does_customer_have_active_payment_source("cus_missing").await;
        assert!(matches!(result, Err(BillingError::CustomerNotFound(_))));

        let result = service
            .replace_payment_source_for_customer("cus_missing", "tok_amex")
            .await;
        assert!(matches!(result, Err(BillingError::CustomerNotFound(_))));
    }
}
