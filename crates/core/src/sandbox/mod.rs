//! In-memory stand-in for the payment processor.
//!
//! [`SandboxProcessor`] keeps customers, sources, subscriptions, invoices and
//! charges in process memory and answers with the same error shapes the
//! hosted processor uses, so the orchestrator can be exercised end to end
//! without network access. Failures can be injected per operation with
//! [`SandboxProcessor::fail_next`].
//!
//! Behaviour worth knowing:
//! - source tokens must start with `tok_`; `tok_chargeDeclined` attaches but
//!   every charge against it is declined
//! - subscriptions charge synchronously; a declined charge leaves no
//!   subscription and no invoice behind
//! - `once` coupons are consumed by the next invoice, other durations stay
//!   applied
//! - customers are listed newest first

use std::collections::HashMap;

use async_trait::async_trait;
use billpilot_types::{
    Charge, ChargeStatus, Coupon, CouponDuration, Customer, CustomerUpdate, Invoice, NewCustomer,
    ProcessorError, Subscription, SubscriptionStatus,
};
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::processor::ProcessorClient;

mod config;
pub mod utils;

pub use config::{SandboxConfig, SandboxCoupon, SandboxPlan};
use utils::{discounted_amount, generate_stripe_id};

/// Token whose charges are always declined
pub const DECLINING_TOKEN: &str = "tok_chargeDeclined";

/// Processor operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SandboxOperation {
    CreateCustomer,
    RetrieveCustomer,
    UpdateCustomer,
    DeleteCustomer,
    ListCustomers,
    SetDefaultSource,
    ClearDefaultSource,
    CreateSubscription,
    ListSubscriptions,
    CancelSubscription,
    LatestInvoice,
    ListInvoices,
    RetrieveCharge,
    ApplyCoupon,
    ListCoupons,
}

#[derive(Default)]
struct SandboxState {
    customers: IndexMap<String, Customer>,
    /// Source id to the token it was created from
    sources: HashMap<String, String>,
    subscriptions: IndexMap<String, Subscription>,
    invoices: Vec<Invoice>,
    charges: IndexMap<String, Charge>,
    failures: HashMap<SandboxOperation, ProcessorError>,
}

impl SandboxState {
    fn customer_mut(
        &mut self,
        customer_id: &str,
        param: &str,
    ) -> Result<&mut Customer, ProcessorError> {
        self.customers
            .get_mut(customer_id)
            .ok_or_else(|| ProcessorError::not_found("customer", customer_id).with_param(param))
    }

    fn take_failure(&mut self, operation: SandboxOperation) -> Result<(), ProcessorError> {
        match self.failures.remove(&operation) {
            Some(err) => {
                debug!(?operation, error = %err, "Sandbox injected failure");
                Err(err)
            }
            None => Ok(()),
        }
    }
}

/// In-memory processor seeded from a [`SandboxConfig`]
pub struct SandboxProcessor {
    config: SandboxConfig,
    state: Mutex<SandboxState>,
}

impl Default for SandboxProcessor {
    fn default() -> Self {
        Self::new(SandboxConfig::default())
    }
}

impl SandboxProcessor {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SandboxState::default()),
        }
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: SandboxOperation, error: ProcessorError) {
        self.state.lock().failures.insert(operation, error);
    }

    pub fn customer_count(&self) -> usize {
        self.state.lock().customers.len()
    }

    /// Number of subscriptions that are not canceled
    pub fn subscription_count(&self) -> usize {
        self.state
            .lock()
            .subscriptions
            .values()
            .filter(|s| s.status.is_live())
            .count()
    }

    pub fn invoice_count(&self) -> usize {
        self.state.lock().invoices.len()
    }

    pub fn charge_count(&self) -> usize {
        self.state.lock().charges.len()
    }

    fn coupon_for(&self, code: Option<&str>) -> Option<&SandboxCoupon> {
        code.and_then(|code| self.config.coupons.get(code))
    }
}

#[async_trait]
impl ProcessorClient for SandboxProcessor {
    async fn create_customer(&self, params: NewCustomer) -> Result<Customer, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::CreateCustomer)?;

        let customer = Customer {
            id: generate_stripe_id("cus"),
            email: Some(params.email),
            description: params.description,
            metadata: params.metadata,
            delinquent: false,
            default_source: None,
            coupon: None,
            created_at: Utc::now(),
        };
        debug!(customer_id = %customer.id, "Sandbox created customer");
        state.customers.insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }

    async fn retrieve_customer(&self, customer_id: &str) -> Result<Customer, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::RetrieveCustomer)?;
        state.customer_mut(customer_id, "id").map(|c| c.clone())
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        update: CustomerUpdate,
    ) -> Result<Customer, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::UpdateCustomer)?;
        let customer = state.customer_mut(customer_id, "id")?;

        if let Some(email) = update.email {
            customer.email = Some(email);
        }
        for (key, value) in update.metadata.unwrap_or_default() {
            // An empty value unsets the key
            if value.is_empty() {
                customer.metadata.shift_remove(&key);
            } else {
                customer.metadata.insert(key, value);
            }
        }
        Ok(customer.clone())
    }

    async fn delete_customer(&self, customer_id: &str) -> Result<(), ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::DeleteCustomer)?;
        let customer = state
            .customers
            .shift_remove(customer_id)
            .ok_or_else(|| ProcessorError::not_found("customer", customer_id).with_param("id"))?;

        if let Some(source) = &customer.default_source {
            state.sources.remove(source);
        }
        for subscription in state.subscriptions.values_mut() {
            if subscription.customer == customer_id {
                subscription.status = SubscriptionStatus::Canceled;
            }
        }
        debug!(customer_id = %customer_id, "Sandbox deleted customer");
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::ListCustomers)?;
        Ok(state.customers.values().rev().cloned().collect())
    }

    async fn set_default_source(
        &self,
        customer_id: &str,
        token: &str,
    ) -> Result<Customer, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::SetDefaultSource)?;
        let previous = state.customer_mut(customer_id, "id")?.default_source.clone();

        if !token.starts_with("tok_") {
            return Err(ProcessorError::not_found("token", token).with_param("source"));
        }

        let source_id = generate_stripe_id("card");
        if let Some(previous) = previous {
            state.sources.remove(&previous);
        }
        state.sources.insert(source_id.clone(), token.to_string());

        let customer = state.customer_mut(customer_id, "id")?;
        customer.default_source = Some(source_id);
        Ok(customer.clone())
    }

    async fn clear_default_source(&self, customer_id: &str) -> Result<Customer, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::ClearDefaultSource)?;
        let previous = state.customer_mut(customer_id, "id")?.default_source.take();
        if let Some(previous) = previous {
            state.sources.remove(&previous);
        }
        state.customer_mut(customer_id, "id").map(|c| c.clone())
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        plan: &str,
    ) -> Result<Subscription, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::CreateSubscription)?;
        let customer = state.customer_mut(customer_id, "customer")?.clone();

        let price = self
            .config
            .plans
            .get(plan)
            .ok_or_else(|| ProcessorError::not_found("plan", plan).with_param("plan"))?;

        let source_id = customer.default_source.clone().ok_or_else(|| {
            ProcessorError::invalid_request(
                "This customer has no attached payment source or default payment method.",
            )
            .with_param("customer")
        })?;
        let token = state.sources.get(&source_id).cloned().unwrap_or_default();

        let coupon = self.coupon_for(customer.coupon.as_deref());
        let amount = match coupon {
            Some(coupon) => discounted_amount(price.amount, coupon.amount_off, coupon.percent_off),
            None => price.amount,
        };
        let now = Utc::now();

        let charge = if amount > 0 {
            let declined = token == DECLINING_TOKEN;
            let charge = Charge {
                id: generate_stripe_id("ch"),
                amount,
                currency: price.currency.clone(),
                status: if declined {
                    ChargeStatus::Failed
                } else {
                    ChargeStatus::Succeeded
                },
                customer: Some(customer.id.clone()),
                failure_message: declined.then(|| "Your card was declined.".to_string()),
                created_at: now,
            };
            state.charges.insert(charge.id.clone(), charge.clone());
            if declined {
                debug!(
                    customer_id = %customer.id,
                    charge_id = %charge.id,
                    "Sandbox declined charge"
                );
                return Err(ProcessorError::card_declined("Your card was declined."));
            }
            Some(charge.id)
        } else {
            None
        };

        let subscription_id = generate_stripe_id("sub");
        let invoice = Invoice {
            id: generate_stripe_id("in"),
            customer: Some(customer.id.clone()),
            subscription: Some(subscription_id.clone()),
            amount_due: amount,
            amount_paid: amount,
            currency: Some(price.currency.clone()),
            charge,
            paid: true,
            created_at: now,
        };
        let subscription = Subscription {
            id: subscription_id,
            customer: customer.id.clone(),
            plan: Some(plan.to_string()),
            status: SubscriptionStatus::Active,
            latest_invoice: Some(invoice.id.clone()),
            created_at: now,
        };

        if coupon.is_some_and(|c| c.duration == CouponDuration::Once) {
            state.customer_mut(customer_id, "customer")?.coupon = None;
        }
        state.invoices.push(invoice);
        state
            .subscriptions
            .insert(subscription.id.clone(), subscription.clone());
        debug!(
            customer_id = %customer.id,
            subscription_id = %subscription.id,
            amount,
            "Sandbox created subscription"
        );
        Ok(subscription)
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Subscription>, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::ListSubscriptions)?;
        state.customer_mut(customer_id, "customer")?;
        Ok(state
            .subscriptions
            .values()
            .filter(|s| s.customer == customer_id && s.status.is_live())
            .cloned()
            .collect())
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::CancelSubscription)?;
        let subscription = state.subscriptions.get_mut(subscription_id).ok_or_else(|| {
            ProcessorError::not_found("subscription", subscription_id).with_param("id")
        })?;
        if !subscription.status.is_live() {
            return Err(ProcessorError::invalid_request(format!(
                "A canceled subscription can only update its cancellation_details and metadata: '{}'",
                subscription_id
            )));
        }
        subscription.status = SubscriptionStatus::Canceled;
        Ok(subscription.clone())
    }

    async fn latest_invoice_for_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Invoice, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::LatestInvoice)?;
        if !state.subscriptions.contains_key(subscription_id) {
            return Err(ProcessorError::not_found("subscription", subscription_id)
                .with_param("subscription"));
        }
        state
            .invoices
            .iter()
            .rev()
            .find(|i| i.subscription.as_deref() == Some(subscription_id))
            .cloned()
            .ok_or_else(|| {
                ProcessorError::not_found("invoice", subscription_id).with_param("subscription")
            })
    }

    async fn list_invoices(&self) -> Result<Vec<Invoice>, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::ListInvoices)?;
        Ok(state.invoices.iter().rev().cloned().collect())
    }

    async fn retrieve_charge(&self, charge_id: &str) -> Result<Charge, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::RetrieveCharge)?;
        state
            .charges
            .get(charge_id)
            .cloned()
            .ok_or_else(|| ProcessorError::not_found("charge", charge_id).with_param("id"))
    }

    async fn apply_coupon(
        &self,
        customer_id: &str,
        coupon_code: &str,
    ) -> Result<Customer, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::ApplyCoupon)?;
        state.customer_mut(customer_id, "id")?;
        if !self.config.coupons.contains_key(coupon_code) {
            return Err(ProcessorError::not_found("coupon", coupon_code).with_param("coupon"));
        }
        let customer = state.customer_mut(customer_id, "id")?;
        customer.coupon = Some(coupon_code.to_string());
        Ok(customer.clone())
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>, ProcessorError> {
        let mut state = self.state.lock();
        state.take_failure(SandboxOperation::ListCoupons)?;
        Ok(self
            .config
            .coupons
            .iter()
            .map(|(code, coupon)| coupon.to_coupon(code))
            .collect())
    }
}
