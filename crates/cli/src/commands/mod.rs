mod admin;
mod billing;
mod customers;
mod smoke;
mod sources;

pub use admin::AdminCommand;
pub use billing::{
    ChargesCommand, CouponsCommand, InvoicesCommand, SubscriptionsCommand, show_account,
};
pub use customers::CustomersCommand;
pub use smoke::SmokeCommand;
pub use sources::SourcesCommand;
