use clap::Subcommand;
use serde_json::json;

use crate::Context;

#[derive(Subcommand, PartialEq, Clone, Debug)]
pub enum SourcesCommand {
    /// Attach a tokenized source as the customer's default
    Replace { customer_id: String, token: String },
    /// Detach the customer's default source
    Remove { customer_id: String },
    /// Whether the customer has a default source
    Status { customer_id: String },
}

impl SourcesCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        let service = &ctx.service;
        let customer_id = match self {
            SourcesCommand::Replace { customer_id, token } => {
                service
                    .replace_payment_source_for_customer(&customer_id, &token)
                    .await?;
                customer_id
            }
            SourcesCommand::Remove { customer_id } => {
                service.remove_payment_source_from_customer(&customer_id).await?;
                customer_id
            }
            SourcesCommand::Status { customer_id } => customer_id,
        };

        let active = service
            .does_customer_have_active_payment_source(&customer_id)
            .await?;
        ctx.format
            .print(&json!({ "id": customer_id, "has_payment_source": active }))
    }
}
