//! Billpilot core
//!
//! The billing orchestrator: business rules layered on top of a payment
//! processor that does not enforce them itself.
//!
//! # Overview
//!
//! - [`BillingService`] - production workflows: customer lifecycle, payment
//!   sources, subscriptions, coupons and category listing
//! - [`BillingAdmin`] - environment reset primitives, kept off the production
//!   contract
//! - [`ProcessorClient`] - the narrow capability interface the orchestrator
//!   consumes; implemented by the Stripe driver and by [`SandboxProcessor`]
//! - [`BillingError`] - the uniform fault model callers match on
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use billpilot_core::{BillingService, SandboxProcessor};
//!
//! let service = BillingService::new(Arc::new(SandboxProcessor::default()));
//! let customer_id = service
//!     .create_customer("anEmail@email.com", "a description", None)
//!     .await?;
//! service.replace_payment_source_for_customer(&customer_id, "tok_amex").await?;
//! let subscription_id = service
//!     .create_subscription_for_customer_and_charge("anEmail@email.com", "monthly-plan")
//!     .await?;
//! let invoice = service.get_latest_invoice_for_subscription(&subscription_id).await?;
//! assert!(invoice.amount_paid > 0);
//! ```
//!
//! No retries happen anywhere in this crate: every processor fault reaches
//! the caller on first occurrence.

pub mod admin;
pub mod config;
pub mod error;
pub mod processor;
pub mod sandbox;
pub mod service;

pub use admin::{BillingAdmin, CleanupFailure, CleanupReport};
pub use billpilot_types as types;
pub use config::BillingConfig;
pub use error::{BillingError, BillingResult};
pub use processor::ProcessorClient;
pub use sandbox::{SandboxConfig, SandboxOperation, SandboxProcessor};
pub use service::BillingService;

#[cfg(test)]
mod tests;
