use anyhow::bail;
use clap::Subcommand;
use serde_json::json;

use crate::Context;

#[derive(Subcommand, PartialEq, Clone, Debug)]
pub enum SubscriptionsCommand {
    /// Subscribe the customer holding EMAIL to PLAN and charge them now
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        plan: String,
    },
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
pub enum InvoicesCommand {
    /// The most recent invoice of a subscription
    Latest { subscription_id: String },
    /// Every invoice
    List,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
pub enum ChargesCommand {
    /// Show a charge
    Get { charge_id: String },
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
pub enum CouponsCommand {
    /// Every coupon defined at the processor
    List,
    /// Apply a coupon to a customer's next billing event
    Apply { customer_id: String, code: String },
}

impl SubscriptionsCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        match self {
            SubscriptionsCommand::Create { email, plan } => {
                let id = ctx
                    .service
                    .create_subscription_for_customer_and_charge(&email, &plan)
                    .await?;
                ctx.format.print(&json!({ "id": id }))
            }
        }
    }
}

impl InvoicesCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        match self {
            InvoicesCommand::Latest { subscription_id } => {
                let invoice = ctx
                    .service
                    .get_latest_invoice_for_subscription(&subscription_id)
                    .await?;
                ctx.format.print(&invoice)
            }
            InvoicesCommand::List => ctx.format.print(&ctx.service.list_all_invoices().await?),
        }
    }
}

impl ChargesCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        match self {
            ChargesCommand::Get { charge_id } => {
                ctx.format.print(&ctx.service.get_charge(&charge_id).await?)
            }
        }
    }
}

impl CouponsCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        match self {
            CouponsCommand::List => ctx.format.print(&ctx.service.list_all_coupons().await?),
            CouponsCommand::Apply { customer_id, code } => {
                ctx.service.apply_coupon_to_customer(&customer_id, &code).await?;
                ctx.format.print(&json!({ "id": customer_id, "coupon": code }))
            }
        }
    }
}

pub async fn show_account(ctx: &Context) -> anyhow::Result<()> {
    let Some(stripe) = &ctx.stripe else {
        bail!("The sandbox processor has no account; drop --sandbox");
    };
    ctx.format.print(&stripe.account_info().await?)
}
