use anyhow::bail;
use clap::{Args, Subcommand};
use serde_json::json;

use crate::Context;

#[derive(Subcommand, PartialEq, Clone, Debug)]
pub enum CustomersCommand {
    /// Create a customer; fails if the email is already taken
    Create {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Category tag stored in the customer's metadata
        #[arg(long)]
        category: Option<String>,
    },
    /// Show a customer by id or by email
    Get(GetCustomer),
    /// List customers, optionally only one category
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Change a customer's email
    SetEmail { customer_id: String, email: String },
    /// Overwrite a customer's category tag
    SetCategory { customer_id: String, category: String },
}

#[derive(Args, PartialEq, Clone, Debug)]
pub struct GetCustomer {
    /// Customer id (cus_...)
    #[arg(required_unless_present = "email", conflicts_with = "email")]
    pub customer_id: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// Show only id, email, description and delinquency
    #[arg(long)]
    pub lite: bool,
}

impl CustomersCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        let service = &ctx.service;
        match self {
            CustomersCommand::Create {
                email,
                description,
                category,
            } => {
                let id = service
                    .create_customer(&email, &description, category.as_deref())
                    .await?;
                ctx.format.print(&json!({ "id": id }))
            }
            CustomersCommand::Get(get) => {
                let customer = match (&get.customer_id, &get.email) {
                    (Some(id), _) => service.retrieve_customer_by_id(id).await?,
                    (None, Some(email)) => service.retrieve_customer_by_email(email).await?,
                    (None, None) => bail!("Provide a customer id or --email"),
                };
                match customer {
                    Some(customer) if get.lite => ctx.format.print(&customer.lite()),
                    Some(customer) => ctx.format.print(&customer),
                    None => bail!("Customer not found"),
                }
            }
            CustomersCommand::List { category } => {
                let customers = match category {
                    Some(category) => service.list_all_customers_by_category(&category).await?,
                    None => service.list_all_customers().await?,
                };
                ctx.format.print(&customers)
            }
            CustomersCommand::SetEmail { customer_id, email } => {
                service.change_customer_email(&customer_id, &email).await?;
                ctx.format.print(&json!({ "id": customer_id, "email": email }))
            }
            CustomersCommand::SetCategory {
                customer_id,
                category,
            } => {
                service.update_customer_category(&customer_id, &category).await?;
                ctx.format
                    .print(&json!({ "id": customer_id, "category": category }))
            }
        }
    }
}
