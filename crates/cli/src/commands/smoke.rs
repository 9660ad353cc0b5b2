use billpilot_types::Invoice;
use clap::Parser;
use serde::Serialize;
use uuid::Uuid;

use crate::Context;

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct SmokeCommand {
    /// Plan to subscribe to
    #[arg(long, default_value = "monthly-plan")]
    pub plan: String,

    /// Coupon applied before the second subscription
    #[arg(long, default_value = "TEST_COUPON_ID")]
    pub coupon: String,

    /// Source token to charge
    #[arg(long, default_value = "tok_visa")]
    pub token: String,

    /// Keep the created customer instead of deleting it
    #[arg(long)]
    pub keep: bool,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    customer_id: String,
    full_price: Invoice,
    discounted: Invoice,
}

impl SmokeCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        let service = &ctx.service;
        let email = format!("smoke-{}@billpilot.invalid", Uuid::new_v4().simple());

        let customer_id = service
            .create_customer(&email, "billpilot smoke test", None)
            .await?;
        tracing::info!(customer_id = %customer_id, "Smoke customer created");

        let outcome = self.run(ctx, &email, &customer_id).await;

        if !self.keep {
            let cleanup = ctx
                .admin
                .cancel_all_existing_subscriptions_for_customer(&customer_id)
                .await;
            if let Err(e) = cleanup {
                tracing::warn!(error = %e, "Smoke cleanup could not cancel subscriptions");
            }
            if let Err(e) = ctx.admin.delete_customer(&customer_id).await {
                tracing::warn!(error = %e, "Smoke cleanup could not delete customer");
            }
        }

        let report = outcome?;
        ctx.format.print(&report)
    }

    async fn run(
        &self,
        ctx: &Context,
        email: &str,
        customer_id: &str,
    ) -> anyhow::Result<SmokeReport> {
        let service = &ctx.service;
        service
            .replace_payment_source_for_customer(customer_id, &self.token)
            .await?;

        let first = service
            .create_subscription_for_customer_and_charge(email, &self.plan)
            .await?;
        service.apply_coupon_to_customer(customer_id, &self.coupon).await?;
        let second = service
            .create_subscription_for_customer_and_charge(email, &self.plan)
            .await?;

        Ok(SmokeReport {
            customer_id: customer_id.to_string(),
            full_price: service.get_latest_invoice_for_subscription(&first).await?,
            discounted: service.get_latest_invoice_for_subscription(&second).await?,
        })
    }
}
