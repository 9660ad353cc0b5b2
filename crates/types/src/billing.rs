//! Subscriptions, invoices, charges and coupons.
//!
//! These are read models: the processor creates and computes them, the
//! orchestrator only passes them through.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer's subscription to a named plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer: String,
    /// Plan the subscription was created against, when the processor reports it
    pub plan: Option<String>,
    pub status: SubscriptionStatus,
    /// Invoice generated by the most recent billing event
    pub latest_invoice: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    Incomplete,
    IncompleteExpired,
    PastDue,
    Paused,
    Trialing,
    Unpaid,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Unpaid => "unpaid",
        }
    }

    /// Whether the subscription still bills the customer
    pub fn is_live(&self) -> bool {
        !matches!(
            self,
            SubscriptionStatus::Canceled | SubscriptionStatus::IncompleteExpired
        )
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "incomplete" => Ok(SubscriptionStatus::Incomplete),
            "incomplete_expired" => Ok(SubscriptionStatus::IncompleteExpired),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "paused" => Ok(SubscriptionStatus::Paused),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "unpaid" => Ok(SubscriptionStatus::Unpaid),
            other => Err(format!("Unknown subscription status: {}", other)),
        }
    }
}

/// An invoice generated by the processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    /// Amount due, in the currency's minor unit
    pub amount_due: i64,
    /// Amount paid, in the currency's minor unit
    pub amount_paid: i64,
    pub currency: Option<String>,
    /// Charge that paid this invoice, if any
    pub charge: Option<String>,
    pub paid: bool,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// A single payment attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: ChargeStatus,
    pub customer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    Succeeded,
    Pending,
    Failed,
}

impl ChargeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeStatus::Succeeded => "succeeded",
            ChargeStatus::Pending => "pending",
            ChargeStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChargeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "succeeded" => Ok(ChargeStatus::Succeeded),
            "pending" => Ok(ChargeStatus::Pending),
            "failed" => Ok(ChargeStatus::Failed),
            other => Err(format!("Unknown charge status: {}", other)),
        }
    }
}

/// A discount definition, applied to customers by code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Processor-assigned code
    pub id: String,
    pub name: Option<String>,
    /// Fixed discount in the currency's minor unit
    pub amount_off: Option<i64>,
    /// Percentage discount (0-100)
    pub percent_off: Option<f64>,
    pub currency: Option<String>,
    pub duration: CouponDuration,
    /// Whether the coupon can still be applied
    pub valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponDuration {
    #[default]
    Once,
    Repeating,
    Forever,
}

impl CouponDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponDuration::Once => "once",
            CouponDuration::Repeating => "repeating",
            CouponDuration::Forever => "forever",
        }
    }
}

impl FromStr for CouponDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "once" => Ok(CouponDuration::Once),
            "repeating" => Ok(CouponDuration::Repeating),
            "forever" => Ok(CouponDuration::Forever),
            other => Err(format!("Unknown coupon duration: {}", other)),
        }
    }
}
