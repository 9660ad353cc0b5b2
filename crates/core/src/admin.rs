//! Environment reset primitives.
//!
//! These wipe processor state wholesale and exist for test and staging
//! environments. They live on [`BillingAdmin`], not on
//! [`BillingService`](crate::BillingService), so production callers never
//! hold a handle that can reach them.

use std::sync::Arc;

use billpilot_types::ProcessorError;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::{BillingError, BillingResult, for_customer},
    processor::ProcessorClient,
};

/// Administrative access to the processor
#[derive(Clone)]
pub struct BillingAdmin {
    processor: Arc<dyn ProcessorClient>,
}

/// A single item a bulk cleanup could not process
#[derive(Debug, Clone, Serialize)]
pub struct CleanupFailure {
    pub id: String,
    pub error: ProcessorError,
}

/// Outcome of a best-effort bulk cleanup
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    /// Ids processed successfully
    pub succeeded: Vec<String>,
    /// Ids that failed, with the processor's reason
    pub failed: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// Whether every item was processed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, id: String, outcome: Result<(), ProcessorError>) {
        match outcome {
            Ok(()) => self.succeeded.push(id),
            Err(error) => self.failed.push(CleanupFailure { id, error }),
        }
    }

    fn merge(&mut self, other: CleanupReport) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }
}

impl BillingAdmin {
    pub fn new(processor: Arc<dyn ProcessorClient>) -> Self {
        Self { processor }
    }

    /// Cancel every live subscription of a customer.
    ///
    /// A failed cancellation does not stop the remaining ones; failures are
    /// logged and returned in the report. Only failing to enumerate the
    /// subscriptions aborts the call.
    pub async fn cancel_all_existing_subscriptions_for_customer(
        &self,
        customer_id: &str,
    ) -> BillingResult<CleanupReport> {
        let subscriptions = self
            .processor
            .list_subscriptions(customer_id)
            .await
            .map_err(|e| for_customer(customer_id, e))?;

        let mut report = CleanupReport::default();
        for subscription in subscriptions {
            let outcome = self
                .processor
                .cancel_subscription(&subscription.id)
                .await
                .map(|_| ());
            if let Err(err) = &outcome {
                warn!(
                    customer_id = %customer_id,
                    subscription_id = %subscription.id,
                    error = %err,
                    "Failed to cancel subscription"
                );
            }
            report.record(subscription.id, outcome);
        }

        info!(
            customer_id = %customer_id,
            canceled = report.succeeded.len(),
            failed = report.failed.len(),
            "Canceled customer subscriptions"
        );
        Ok(report)
    }

    /// Delete one customer; the processor cancels its subscriptions with it
    pub async fn delete_customer(&self, customer_id: &str) -> BillingResult<()> {
        self.processor
            .delete_customer(customer_id)
            .await
            .map_err(|e| for_customer(customer_id, e))?;
        info!(customer_id = %customer_id, "Deleted customer");
        Ok(())
    }

    /// Delete every customer reachable through the processor's listing
    pub async fn delete_all_customers(&self) -> BillingResult<CleanupReport> {
        let customers = self.processor.list_customers().await?;

        let mut report = CleanupReport::default();
        for customer in customers {
            let outcome = self.processor.delete_customer(&customer.id).await;
            if let Err(err) = &outcome {
                warn!(customer_id = %customer.id, error = %err, "Failed to delete customer");
            }
            report.record(customer.id, outcome);
        }

        info!(
            deleted = report.succeeded.len(),
            failed = report.failed.len(),
            "Deleted customers"
        );
        Ok(report)
    }

    /// Cancel every customer's subscriptions, then delete every customer
    pub async fn reset_environment(&self) -> BillingResult<CleanupReport> {
        let customers = self.processor.list_customers().await?;

        let mut report = CleanupReport::default();
        for customer in &customers {
            match self
                .cancel_all_existing_subscriptions_for_customer(&customer.id)
                .await
            {
                Ok(canceled) => report.merge(canceled),
                Err(BillingError::Processor(error)) => {
                    warn!(
                        customer_id = %customer.id,
                        error = %error,
                        "Could not enumerate subscriptions"
                    );
                    report.failed.push(CleanupFailure {
                        id: customer.id.clone(),
                        error,
                    });
                }
                // Gone since the listing; nothing left to cancel
                Err(err) => debug!(customer_id = %customer.id, error = %err, "Skipped customer"),
            }
        }
        report.merge(self.delete_all_customers().await?);
        Ok(report)
    }
}
