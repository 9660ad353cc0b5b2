//! Production billing workflows.
//!
//! [`BillingService`] is stateless between calls: the processor is the only
//! source of truth. Multi-step workflows (check-then-create, check-then-charge)
//! are not transactional; a concurrent mutation between the check and the
//! mutation is not detected.

use std::sync::Arc;

use billpilot_types::Customer;
use tracing::{debug, warn};

use crate::{
    config::BillingConfig,
    error::{BillingError, BillingResult},
    processor::ProcessorClient,
};

mod customers;
mod sources;
mod subscriptions;

/// Orchestrates customers, payment sources, subscriptions and coupons
#[derive(Clone)]
pub struct BillingService {
    processor: Arc<dyn ProcessorClient>,
    config: BillingConfig,
}

impl BillingService {
    pub fn new(processor: Arc<dyn ProcessorClient>) -> Self {
        Self {
            processor,
            config: BillingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BillingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Find the customer holding exactly `email`.
    ///
    /// The processor has no email index, so this scans the full listing.
    async fn find_customer_by_email(&self, email: &str) -> BillingResult<Option<Customer>> {
        let customers = self.processor.list_customers().await?;
        debug!(scanned = customers.len(), "Scanned customers for email");
        Ok(customers.into_iter().find(|c| c.has_email(email)))
    }

    /// Fail with [`BillingError::DuplicateEmail`] if a customer other than
    /// `owner` already holds `email`.
    ///
    /// Returns whether `owner` itself already holds the email.
    async fn ensure_email_available(
        &self,
        email: &str,
        owner: Option<&str>,
    ) -> BillingResult<bool> {
        match self.find_customer_by_email(email).await? {
            Some(holder) if Some(holder.id.as_str()) == owner => Ok(true),
            Some(holder) => {
                warn!(
                    email = %email,
                    holder = %holder.id,
                    "Rejected duplicate customer email"
                );
                Err(BillingError::DuplicateEmail(email.to_string()))
            }
            None => Ok(false),
        }
    }
}
