//! Processor-agnostic billing data model shared by the Billpilot crates.
//!
//! Every resource here is owned by the payment processor. The orchestrator
//! never keeps its own copy: values are rebuilt from processor responses on
//! each call.

pub mod billing;
pub mod customer;
pub mod error;

pub use billing::{
    Charge, ChargeStatus, Coupon, CouponDuration, Invoice, Subscription, SubscriptionStatus,
};
pub use customer::{Customer, CustomerLite, CustomerUpdate, Metadata, NewCustomer};
pub use error::{ProcessorError, ProcessorErrorKind};

/// Default metadata key holding a customer's category tag
pub const CATEGORY_METADATA_KEY: &str = "category";

/// Metadata key recording the plan a subscription was created against
pub const PLAN_METADATA_KEY: &str = "plan";

/// Name of the CLI manifest file
pub const MANIFEST_FILE_NAME: &str = "billpilot.yaml";
