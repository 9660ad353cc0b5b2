use async_trait::async_trait;
use billpilot_core::ProcessorClient;
use billpilot_types::{
    Charge, Coupon, Customer, CustomerUpdate, Invoice, NewCustomer, PLAN_METADATA_KEY,
    ProcessorError, Subscription,
};
use serde::{Serialize, de::DeserializeOwned, de::IgnoredAny};
use stripe::{
    Charge as StripeCharge, ChargeId, Client, CreateCustomer, Customer as StripeCustomer,
    CustomerId, UpdateCustomer,
};
use tracing::{debug, warn};

use crate::{
    config::StripeConfig,
    convert::{convert_charge, convert_customer},
    error::{from_error_body, from_reqwest_error, from_stripe_error, malformed_id},
    wire::{CouponObject, CustomerObject, InvoiceObject, ListItem, ListPage, SubscriptionObject},
};

/// API version pinned on raw requests so payload shapes stay stable
const RAW_API_VERSION: &str = "2023-10-16";
const PAGE_LIMIT: &str = "100";
const PLAN_METADATA_PARAM: &str = "metadata[plan]";

/// Information about a Stripe account
#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    pub business_name: Option<String>,
    pub display_name: Option<String>,
    pub account_id: String,
    pub is_test: bool,
}

/// [`ProcessorClient`] backed by the hosted Stripe API
pub struct StripeProcessor {
    client: Client,
    http: reqwest::Client,
    config: StripeConfig,
}

fn customer_id(id: &str) -> Result<CustomerId, ProcessorError> {
    id.parse().map_err(|_| malformed_id("customer", id))
}

impl StripeProcessor {
    pub fn new(config: StripeConfig) -> Self {
        let client = match config.api_base.as_deref() {
            Some(base) => Client::from_url(base, config.api_key.clone()),
            None => Client::new(config.api_key.clone()),
        };
        Self {
            client,
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base(), path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ProcessorError> {
        let response = request
            .bearer_auth(&self.config.api_key)
            .header("Stripe-Version", RAW_API_VERSION)
            .send()
            .await
            .map_err(from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = from_error_body(status.as_u16(), &body);
            debug!(status = status.as_u16(), error = %err, "Stripe request failed");
            return Err(err);
        }
        response.json::<T>().await.map_err(from_reqwest_error)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProcessorError> {
        self.send(self.http.get(self.url(path)).query(query)).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, ProcessorError> {
        self.send(self.http.post(self.url(path)).form(form)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProcessorError> {
        self.send(self.http.delete(self.url(path))).await
    }

    /// Walk every page of a list endpoint
    async fn list_all<T: DeserializeOwned + ListItem>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ProcessorError> {
        let mut all = Vec::new();
        let mut starting_after: Option<String> = None;

        loop {
            let mut params = query.to_vec();
            params.push(("limit", PAGE_LIMIT.to_string()));
            if let Some(last_id) = &starting_after {
                params.push(("starting_after", last_id.clone()));
            }

            let page: ListPage<T> = self.get(path, &params).await?;
            if let Some(last) = page.data.last() {
                starting_after = Some(last.list_id().to_string());
            }
            all.extend(page.data);

            if !page.has_more || starting_after.is_none() {
                break;
            }
        }
        Ok(all)
    }

    /// Retrieve account information for the configured key
    pub async fn account_info(&self) -> Result<AccountInfo, ProcessorError> {
        let account_json: serde_json::Value = self.get("account", &[]).await?;

        let business_name = account_json
            .get("business_profile")
            .and_then(|bp| bp.get("name"))
            .and_then(|n| n.as_str())
            .map(|s| s.to_string());

        let display_name = account_json
            .get("settings")
            .and_then(|s| s.get("dashboard"))
            .and_then(|d| d.get("display_name"))
            .and_then(|n| n.as_str())
            .map(|s| s.to_string());

        let account_id = account_json
            .get("id")
            .and_then(|id| id.as_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(AccountInfo {
            business_name,
            display_name,
            account_id,
            is_test: self.config.is_test_mode(),
        })
    }
}

#[async_trait]
impl ProcessorClient for StripeProcessor {
    async fn create_customer(&self, params: NewCustomer) -> Result<Customer, ProcessorError> {
        let mut create = CreateCustomer::new();
        create.email = Some(params.email.as_str());
        create.description = params.description.as_deref();
        if !params.metadata.is_empty() {
            create.metadata = Some(params.metadata.into_iter().collect());
        }

        let customer = StripeCustomer::create(&self.client, create)
            .await
            .map_err(from_stripe_error)?;
        debug!(customer_id = %customer.id, "Stripe created customer");
        Ok(convert_customer(customer))
    }

    async fn retrieve_customer(&self, customer_id_str: &str) -> Result<Customer, ProcessorError> {
        customer_id(customer_id_str)?;
        // Read raw: the typed `Discount` does not carry its coupon
        let customer: CustomerObject = self
            .get(&format!("customers/{}", customer_id_str), &[])
            .await?;
        if customer.deleted {
            return Err(ProcessorError::not_found("customer", customer_id_str).with_param("id"));
        }
        Ok(customer.into())
    }

    async fn update_customer(
        &self,
        customer_id_str: &str,
        update: CustomerUpdate,
    ) -> Result<Customer, ProcessorError> {
        let id = customer_id(customer_id_str)?;
        let mut params = UpdateCustomer::new();
        params.email = update.email.as_deref();
        params.metadata = update.metadata.map(|metadata| metadata.into_iter().collect());

        StripeCustomer::update(&self.client, &id, params)
            .await
            .map_err(from_stripe_error)?;
        self.retrieve_customer(customer_id_str).await
    }

    async fn delete_customer(&self, customer_id_str: &str) -> Result<(), ProcessorError> {
        let id = customer_id(customer_id_str)?;
        StripeCustomer::delete(&self.client, &id)
            .await
            .map_err(from_stripe_error)?;
        debug!(customer_id = %customer_id_str, "Stripe deleted customer");
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, ProcessorError> {
        let customers: Vec<CustomerObject> = self.list_all("customers", &[]).await?;
        debug!(count = customers.len(), "Stripe listed customers");
        Ok(customers.into_iter().map(Customer::from).collect())
    }

    async fn set_default_source(
        &self,
        customer_id_str: &str,
        token: &str,
    ) -> Result<Customer, ProcessorError> {
        customer_id(customer_id_str)?;
        // Setting `source` on the customer replaces the previous default source
        let _: IgnoredAny = self
            .post(
                &format!("customers/{}", customer_id_str),
                &[("source", token.to_string())],
            )
            .await?;
        self.retrieve_customer(customer_id_str).await
    }

    async fn clear_default_source(
        &self,
        customer_id_str: &str,
    ) -> Result<Customer, ProcessorError> {
        customer_id(customer_id_str)?;
        let path = format!("customers/{}", customer_id_str);
        let current: CustomerObject = self.get(&path, &[]).await?;

        if let Some(source) = current.default_source {
            let _: IgnoredAny = self
                .delete(&format!("{}/sources/{}", path, source.id()))
                .await?;
            debug!(
                customer_id = %customer_id_str,
                source = %source.id(),
                "Stripe detached source"
            );
        }
        self.retrieve_customer(customer_id_str).await
    }

    async fn create_subscription(
        &self,
        customer_id_str: &str,
        plan: &str,
    ) -> Result<Subscription, ProcessorError> {
        let form = [
            ("customer", customer_id_str.to_string()),
            ("items[0][price]", plan.to_string()),
            (PLAN_METADATA_PARAM, plan.to_string()),
            // Fail the call instead of leaving an incomplete subscription on decline
            ("payment_behavior", "error_if_incomplete".to_string()),
        ];
        let subscription: SubscriptionObject = match self.post("subscriptions", &form).await {
            Ok(subscription) => subscription,
            Err(err) => {
                warn!(
                    customer_id = %customer_id_str,
                    plan = %plan,
                    error = %err,
                    "Stripe refused subscription"
                );
                return Err(err);
            }
        };
        Ok(subscription.into_subscription())
    }

    async fn list_subscriptions(
        &self,
        customer_id_str: &str,
    ) -> Result<Vec<Subscription>, ProcessorError> {
        customer_id(customer_id_str)?;
        let subscriptions: Vec<SubscriptionObject> = self
            .list_all("subscriptions", &[("customer", customer_id_str.to_string())])
            .await?;
        Ok(subscriptions
            .into_iter()
            .map(SubscriptionObject::into_subscription)
            .filter(|s| s.status.is_live())
            .collect())
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, ProcessorError> {
        let subscription: SubscriptionObject = self
            .delete(&format!("subscriptions/{}", subscription_id))
            .await?;
        Ok(subscription.into_subscription())
    }

    async fn latest_invoice_for_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Invoice, ProcessorError> {
        let subscription: SubscriptionObject = self
            .get(&format!("subscriptions/{}", subscription_id), &[])
            .await?;
        let invoice_id = subscription.latest_invoice.ok_or_else(|| {
            ProcessorError::not_found("invoice", subscription_id).with_param("latest_invoice")
        })?;
        let invoice: InvoiceObject = self
            .get(&format!("invoices/{}", invoice_id.id()), &[])
            .await?;
        Ok(invoice.into())
    }

    async fn list_invoices(&self) -> Result<Vec<Invoice>, ProcessorError> {
        let invoices: Vec<InvoiceObject> = self.list_all("invoices", &[]).await?;
        Ok(invoices.into_iter().map(Invoice::from).collect())
    }

    async fn retrieve_charge(&self, charge_id: &str) -> Result<Charge, ProcessorError> {
        let id: ChargeId = charge_id
            .parse()
            .map_err(|_| malformed_id("charge", charge_id))?;
        let charge = StripeCharge::retrieve(&self.client, &id, &[])
            .await
            .map_err(from_stripe_error)?;
        Ok(convert_charge(charge))
    }

    async fn apply_coupon(
        &self,
        customer_id_str: &str,
        coupon_code: &str,
    ) -> Result<Customer, ProcessorError> {
        customer_id(customer_id_str)?;
        let _: IgnoredAny = self
            .post(
                &format!("customers/{}", customer_id_str),
                &[("coupon", coupon_code.to_string())],
            )
            .await?;
        self.retrieve_customer(customer_id_str).await
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>, ProcessorError> {
        let coupons: Vec<CouponObject> = self.list_all("coupons", &[]).await?;
        Ok(coupons.into_iter().map(Coupon::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use billpilot_types::ProcessorErrorKind;

    use super::*;

    #[test]
    fn test_malformed_customer_id_is_missing_customer() {
        let err = customer_id("not-a-customer").unwrap_err();
        assert_eq!(err.kind, ProcessorErrorKind::NotFound);
        assert_eq!(err.param.as_deref(), Some("id"));
        assert!(customer_id("cus_123").is_ok());
    }

    #[test]
    fn test_plan_metadata_param_matches_key() {
        assert_eq!(PLAN_METADATA_PARAM, format!("metadata[{}]", PLAN_METADATA_KEY));
    }

    #[test]
    fn test_url_uses_configured_base() {
        let config = StripeConfig::new("sk_test_123").with_api_base("http://localhost:12111");
        let processor = StripeProcessor::new(config);
        assert_eq!(processor.url("customers"), "http://localhost:12111/v1/customers");
        assert!(processor.config().is_test_mode());
    }

    #[tokio::test]
    async fn test_malformed_ids_fail_before_any_request() {
        let config = StripeConfig::new("sk_test_123").with_api_base("http://127.0.0.1:9");
        let processor = StripeProcessor::new(config);
        let err = processor.retrieve_customer("bogus").await.unwrap_err();
        assert!(err.is_not_found());
        let err = processor.retrieve_charge("bogus").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
