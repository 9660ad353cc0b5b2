use billpilot_types::{Customer, CustomerLite, CustomerUpdate, NewCustomer};
use tracing::{debug, info};

use super::BillingService;
use crate::error::{BillingResult, for_customer};

impl BillingService {
    /// Create a customer, refusing emails already held by another customer.
    ///
    /// The optional `category` is stored as processor-side metadata under
    /// the configured category key. Returns the processor-assigned id.
    pub async fn create_customer(
        &self,
        email: &str,
        description: &str,
        category: Option<&str>,
    ) -> BillingResult<String> {
        self.ensure_email_available(email, None).await?;

        let mut params = NewCustomer::new(email).with_description(description);
        if let Some(category) = category {
            params = params.with_metadata(self.config.category_key.as_str(), category);
        }

        let customer = self.processor.create_customer(params).await?;
        info!(
            customer_id = %customer.id,
            email = %email,
            category = category.unwrap_or("-"),
            "Created customer"
        );
        Ok(customer.id)
    }

    /// Look up a customer by id; `None` when the processor does not know it
    pub async fn retrieve_customer_by_id(
        &self,
        customer_id: &str,
    ) -> BillingResult<Option<Customer>> {
        match self.processor.retrieve_customer(customer_id).await {
            Ok(customer) => Ok(Some(customer)),
            Err(err) if err.is_not_found() => {
                debug!(customer_id = %customer_id, "Customer not found");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Look up a customer by id and project it onto the lite view
    pub async fn retrieve_customer_lite_by_id(
        &self,
        customer_id: &str,
    ) -> BillingResult<Option<CustomerLite>> {
        Ok(self
            .retrieve_customer_by_id(customer_id)
            .await?
            .map(CustomerLite::from))
    }

    /// Look up a customer by exact email; `None` when nobody holds it
    pub async fn retrieve_customer_by_email(&self, email: &str) -> BillingResult<Option<Customer>> {
        self.find_customer_by_email(email).await
    }

    /// Change a customer's email, with the same uniqueness rule as creation
    pub async fn change_customer_email(
        &self,
        customer_id: &str,
        new_email: &str,
    ) -> BillingResult<()> {
        if self.ensure_email_available(new_email, Some(customer_id)).await? {
            debug!(customer_id = %customer_id, "Customer already holds this email");
            return Ok(());
        }

        self.processor
            .update_customer(customer_id, CustomerUpdate::email(new_email))
            .await
            .map_err(|e| for_customer(customer_id, e))?;
        info!(customer_id = %customer_id, email = %new_email, "Changed customer email");
        Ok(())
    }

    /// Overwrite the category tag; other fields and metadata stay as they are
    pub async fn update_customer_category(
        &self,
        customer_id: &str,
        category: &str,
    ) -> BillingResult<()> {
        let update = CustomerUpdate::metadata_entry(self.config.category_key.as_str(), category);
        self.processor
            .update_customer(customer_id, update)
            .await
            .map_err(|e| for_customer(customer_id, e))?;
        info!(customer_id = %customer_id, category = %category, "Updated customer category");
        Ok(())
    }

    /// Every customer known to the processor, in listing order
    pub async fn list_all_customers(&self) -> BillingResult<Vec<CustomerLite>> {
        let customers = self.processor.list_customers().await?;
        Ok(customers.into_iter().map(CustomerLite::from).collect())
    }

    /// Customers whose category tag is exactly `category`
    pub async fn list_all_customers_by_category(
        &self,
        category: &str,
    ) -> BillingResult<Vec<CustomerLite>> {
        let key = self.config.category_key.as_str();
        let customers = self.processor.list_customers().await?;
        let matching: Vec<CustomerLite> = customers
            .into_iter()
            .filter(|c| c.metadata_value(key) == Some(category))
            .map(CustomerLite::from)
            .collect();
        debug!(category = %category, count = matching.len(), "Listed customers by category");
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use billpilot_types::{ProcessorError, ProcessorErrorKind};

    use crate::{
        BillingConfig, BillingError, BillingService, SandboxOperation, SandboxProcessor,
    };

    fn service() -> (Arc<SandboxProcessor>, BillingService) {
        let sandbox = Arc::new(SandboxProcessor::default());
        let service = BillingService::new(sandbox.clone());
        (sandbox, service)
    }

    #[tokio::test]
    async fn test_create_customer_tags_category() {
        let (_, service) = service();
        let id = service
            .create_customer("anEmail3@email.com", "a description3", Some("CAT1"))
            .await
            .unwrap();

        let customer = service.retrieve_customer_by_id(&id).await.unwrap().unwrap();
        assert_eq!(customer.metadata_value("category"), Some("CAT1"));
        assert_eq!(customer.description.as_deref(), Some("a description3"));
    }

    #[tokio::test]
    async fn test_duplicate_email_creates_nothing() {
        let (sandbox, service) = service();
        service
            .create_customer("anEmail@email.com", "a description", None)
            .await
            .unwrap();

        let result = service
            .create_customer("anEmail@email.com", "a new description", None)
            .await;
        assert!(matches!(
            result,
            Err(BillingError::DuplicateEmail(email)) if email == "anEmail@email.com"
        ));
        assert_eq!(sandbox.customer_count(), 1);
    }

    #[tokio::test]
    async fn test_emails_differing_in_case_are_distinct() {
        let (_, service) = service();
        service
            .create_customer("anEmail@email.com", "a description", None)
            .await
            .unwrap();
        service
            .create_customer("anemail@email.com", "another", None)
            .await
            .unwrap();
        assert_eq!(service.list_all_customers().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retrieve_missing_customer_is_absent() {
        let (_, service) = service();
        let id = service
            .create_customer("anEmail@email.com", "a description", None)
            .await
            .unwrap();

        let missing = service
            .retrieve_customer_by_id(&format!("{}bogus", id))
            .await
            .unwrap();
        assert!(missing.is_none());

        let missing = service.retrieve_customer_by_email("bogus@email.com").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_retrieve_propagates_non_missing_failures() {
        let (sandbox, service) = service();
        sandbox.fail_next(
            SandboxOperation::RetrieveCustomer,
            ProcessorError::transport("connection reset"),
        );

        let result = service.retrieve_customer_by_id("cus_any").await;
        let err = result.unwrap_err();
        assert_eq!(
            err.processor_error().map(|e| e.kind),
            Some(ProcessorErrorKind::Transport)
        );
    }

    #[tokio::test]
    async fn test_retrieve_lite_projection() {
        let (_, service) = service();
        let id = service
            .create_customer("lite@email.com", "lite", None)
            .await
            .unwrap();

        let lite = service.retrieve_customer_lite_by_id(&id).await.unwrap().unwrap();
        assert_eq!(lite.id, id);
        assert_eq!(lite.email.as_deref(), Some("lite@email.com"));
        assert!(!lite.delinquent);
        assert!(service.retrieve_customer_lite_by_id("cus_nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_change_email_to_fresh_address() {
        let (_, service) = service();
        let id = service
            .create_customer("anEmail1@email.com", "a description1", None)
            .await
            .unwrap();

        service
            .change_customer_email(&id, "someOther@email.com")
            .await
            .unwrap();

        let customer = service
            .retrieve_customer_by_email("someOther@email.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.id, id);
        assert!(
            service
                .retrieve_customer_by_email("anEmail1@email.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_change_email_to_taken_address_leaves_both_unchanged() {
        let (_, service) = service();
        let first = service
            .create_customer("anEmail1@email.com", "a description1", None)
            .await
            .unwrap();
        let second = service
            .create_customer("anEmail2@email.com", "a description2", None)
            .await
            .unwrap();

        let result = service.change_customer_email(&first, "anEmail2@email.com").await;
        assert!(matches!(result, Err(BillingError::DuplicateEmail(_))));

        let first = service.retrieve_customer_by_id(&first).await.unwrap().unwrap();
        let second = service.retrieve_customer_by_id(&second).await.unwrap().unwrap();
        assert_eq!(first.email.as_deref(), Some("anEmail1@email.com"));
        assert_eq!(second.email.as_deref(), Some("anEmail2@email.com"));
    }

    #[tokio::test]
    async fn test_change_email_to_own_address_is_noop() {
        let (_, service) = service();
        let id = service
            .create_customer("anEmail1@email.com", "a description1", None)
            .await
            .unwrap();
        service
            .change_customer_email(&id, "anEmail1@email.com")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_mutating_unknown_customer_is_customer_not_found() {
        let (_, service) = service();
        let result = service.change_customer_email("cus_missing", "new@email.com").await;
        assert!(matches!(result, Err(BillingError::CustomerNotFound(id)) if id == "cus_missing"));

        let result = service.update_customer_category("cus_missing", "CAT1").await;
        assert!(matches!(result, Err(BillingError::CustomerNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_category_keeps_other_fields() {
        let (_, service) = service();
        let id = service
            .create_customer("anEmail5@email.com", "a description5", Some("CAT1"))
            .await
            .unwrap();

        service.update_customer_category(&id, "CAT2").await.unwrap();

        let customer = service.retrieve_customer_by_id(&id).await.unwrap().unwrap();
        assert_eq!(customer.metadata_value("category"), Some("CAT2"));
        assert_eq!(customer.email.as_deref(), Some("anEmail5@email.com"));
        assert_eq!(customer.description.as_deref(), Some("a description5"));
    }

    #[tokio::test]
    async fn test_custom_category_key() {
        let sandbox = Arc::new(SandboxProcessor::default());
        let service = BillingService::new(sandbox)
            .with_config(BillingConfig::default().with_category_key("segment"));

        let id = service
            .create_customer("a@email.com", "a", Some("smb"))
            .await
            .unwrap();
        let customer = service.retrieve_customer_by_id(&id).await.unwrap().unwrap();
        assert_eq!(customer.metadata_value("segment"), Some("smb"));
        assert_eq!(customer.metadata_value("category"), None);
        assert_eq!(service.list_all_customers_by_category("smb").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_by_category_is_exact_match() {
        let (_, service) = service();
        service.create_customer("a@email.com", "a", Some("CAT1")).await.unwrap();
        service.create_customer("b@email.com", "b", Some("cat1")).await.unwrap();
        service.create_customer("c@email.com", "c", Some("CAT10")).await.unwrap();
        service.create_customer("d@email.com", "d", None).await.unwrap();

        let cat1 = service.list_all_customers_by_category("CAT1").await.unwrap();
        assert_eq!(cat1.len(), 1);
        assert_eq!(cat1[0].email.as_deref(), Some("a@email.com"));
        assert!(service.list_all_customers_by_category("").await.unwrap().is_empty());
    }
}
