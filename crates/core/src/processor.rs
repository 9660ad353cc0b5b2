use async_trait::async_trait;
use billpilot_types::{
    Charge, Coupon, Customer, CustomerUpdate, Invoice, NewCustomer, ProcessorError, Subscription,
};

/// Capability interface over the payment processor.
///
/// Every call is a single remote operation and may fail with a
/// [`ProcessorError`]. A missing resource is reported with
/// [`ProcessorErrorKind::NotFound`](billpilot_types::ProcessorErrorKind::NotFound);
/// the orchestrator decides whether that is an absent value or a fault.
#[async_trait]
pub trait ProcessorClient: Send + Sync {
    // Customers
    async fn create_customer(&self, params: NewCustomer) -> Result<Customer, ProcessorError>;
    async fn retrieve_customer(&self, customer_id: &str) -> Result<Customer, ProcessorError>;
    async fn update_customer(
        &self,
        customer_id: &str,
        update: CustomerUpdate,
    ) -> Result<Customer, ProcessorError>;
    async fn delete_customer(&self, customer_id: &str) -> Result<(), ProcessorError>;
    /// Every customer, in the processor's listing order
    async fn list_customers(&self) -> Result<Vec<Customer>, ProcessorError>;

    // Payment sources
    /// Attach `token` as the default source, replacing any previous one in one call
    async fn set_default_source(
        &self,
        customer_id: &str,
        token: &str,
    ) -> Result<Customer, ProcessorError>;
    async fn clear_default_source(&self, customer_id: &str) -> Result<Customer, ProcessorError>;

    // Subscriptions
    /// Create a subscription; the processor charges the default source synchronously
    async fn create_subscription(
        &self,
        customer_id: &str,
        plan: &str,
    ) -> Result<Subscription, ProcessorError>;
    /// Live (non-canceled) subscriptions of a customer
    async fn list_subscriptions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Subscription>, ProcessorError>;
    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, ProcessorError>;

    // Invoices and charges
    async fn latest_invoice_for_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Invoice, ProcessorError>;
    async fn list_invoices(&self) -> Result<Vec<Invoice>, ProcessorError>;
    async fn retrieve_charge(&self, charge_id: &str) -> Result<Charge, ProcessorError>;

    // Coupons
    async fn apply_coupon(
        &self,
        customer_id: &str,
        coupon_code: &str,
    ) -> Result<Customer, ProcessorError>;
    async fn list_coupons(&self) -> Result<Vec<Coupon>, ProcessorError>;
}
