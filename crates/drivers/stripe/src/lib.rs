//! Stripe-backed [`ProcessorClient`](billpilot_core::ProcessorClient).
//!
//! Customer writes and charges go through the typed `async-stripe` client.
//! Customer reads, source attachment, subscriptions, invoices and coupons use
//! raw form requests against the REST API, decoded into the narrow shapes in
//! [`wire`].
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use billpilot_core::BillingService;
//! use billpilot_driver_stripe::{StripeConfig, StripeProcessor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let processor = StripeProcessor::new(StripeConfig::from_env()?);
//!     let service = BillingService::new(Arc::new(processor));
//!     for customer in service.list_all_customers().await? {
//!         println!("{} {:?}", customer.id, customer.email);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod convert;
mod error;
pub mod wire;

pub use client::{AccountInfo, StripeProcessor};
pub use config::{API_BASE_ENV, API_KEY_ENV, DEFAULT_API_BASE, StripeConfig, StripeConfigError};
pub use error::{from_error_body, from_stripe_error};
