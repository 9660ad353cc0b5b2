use anyhow::bail;
use clap::Subcommand;

use crate::Context;

#[derive(Subcommand, PartialEq, Clone, Debug)]
pub enum AdminCommand {
    /// Cancel every subscription, then delete every customer
    Reset {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
    /// Cancel every live subscription of one customer
    CancelSubscriptions { customer_id: String },
    /// Delete every customer
    DeleteCustomers {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

impl AdminCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        let report = match self {
            AdminCommand::Reset { yes } => {
                confirm(ctx, yes)?;
                ctx.admin.reset_environment().await?
            }
            AdminCommand::CancelSubscriptions { customer_id } => {
                ctx.admin
                    .cancel_all_existing_subscriptions_for_customer(&customer_id)
                    .await?
            }
            AdminCommand::DeleteCustomers { yes } => {
                confirm(ctx, yes)?;
                ctx.admin.delete_all_customers().await?
            }
        };

        ctx.format.print(&report)?;
        if !report.is_complete() {
            bail!("{} item(s) could not be cleaned up", report.failed.len());
        }
        Ok(())
    }
}

fn confirm(ctx: &Context, yes: bool) -> anyhow::Result<()> {
    if !yes {
        bail!("This wipes every customer on the account; pass --yes to confirm");
    }
    if let Some(stripe) = &ctx.stripe {
        if !stripe.config().is_test_mode() {
            bail!("Refusing to wipe a live-mode account");
        }
    }
    Ok(())
}
