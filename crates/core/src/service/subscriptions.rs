use billpilot_types::{Charge, Coupon, Invoice};
use tracing::{info, warn};

use super::BillingService;
use crate::error::{BillingError, BillingResult, for_customer};

impl BillingService {
    /// Subscribe the customer holding `email` to `plan_name`, charging them now.
    ///
    /// The default payment source is checked before the subscription is
    /// requested, so a customer without one fails with
    /// [`BillingError::NoPaymentSource`] and nothing is created. The check is
    /// only a guard: if the source disappears before the processor charges
    /// it, the decline arrives as [`BillingError::Processor`], and callers
    /// should treat that as possibly leaving a partially billed state.
    pub async fn create_subscription_for_customer_and_charge(
        &self,
        email: &str,
        plan_name: &str,
    ) -> BillingResult<String> {
        let customer = self
            .find_customer_by_email(email)
            .await?
            .ok_or_else(|| BillingError::CustomerNotFound(email.to_string()))?;

        if !customer.has_default_source() {
            warn!(
                customer_id = %customer.id,
                plan = %plan_name,
                "Refused subscription for customer without payment source"
            );
            return Err(BillingError::NoPaymentSource(customer.id));
        }

        let subscription = self
            .processor
            .create_subscription(&customer.id, plan_name)
            .await?;
        info!(
            customer_id = %customer.id,
            subscription_id = %subscription.id,
            plan = %plan_name,
            status = %subscription.status,
            "Created subscription"
        );
        Ok(subscription.id)
    }

    /// The invoice most recently generated for the subscription
    pub async fn get_latest_invoice_for_subscription(
        &self,
        subscription_id: &str,
    ) -> BillingResult<Invoice> {
        Ok(self
            .processor
            .latest_invoice_for_subscription(subscription_id)
            .await?)
    }

    pub async fn get_charge(&self, charge_id: &str) -> BillingResult<Charge> {
        Ok(self.processor.retrieve_charge(charge_id).await?)
    }

    /// Attach a coupon to the customer.
    ///
    /// Nothing is invoiced or charged here; the discount applies to the
    /// customer's next billing event.
    pub async fn apply_coupon_to_customer(
        &self,
        customer_id: &str,
        coupon_code: &str,
    ) -> BillingResult<()> {
        self.processor
            .apply_coupon(customer_id, coupon_code)
            .await
            .map_err(|e| for_customer(customer_id, e))?;
        info!(customer_id = %customer_id, coupon = %coupon_code, "Applied coupon");
        Ok(())
    }

    pub async fn list_all_coupons(&self) -> BillingResult<Vec<Coupon>> {
        Ok(self.processor.list_coupons().await?)
    }

    pub async fn list_all_invoices(&self) -> BillingResult<Vec<Invoice>> {
        Ok(self.processor.list_invoices().await?)
    }
}
