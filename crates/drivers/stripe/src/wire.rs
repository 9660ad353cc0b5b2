//! JSON shapes of the objects fetched through raw requests.
//!
//! Only the fields the orchestrator reads are declared; everything else in
//! the payload is ignored.

use std::collections::HashMap;

use billpilot_types::{
    Coupon, CouponDuration, Customer, Invoice, PLAN_METADATA_KEY, Subscription,
    SubscriptionStatus,
};
use chrono::Utc;
use serde::Deserialize;

use crate::convert::{metadata_to_sorted_indexmap, timestamp};

/// A page of a list endpoint
#[derive(Debug, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

/// An id that may come back expanded into a full object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdOrObject {
    Id(String),
    Object { id: String },
}

impl IdOrObject {
    pub fn id(&self) -> &str {
        match self {
            IdOrObject::Id(id) => id,
            IdOrObject::Object { id } => id,
        }
    }

    fn into_id(self) -> String {
        match self {
            IdOrObject::Id(id) => id,
            IdOrObject::Object { id } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub customer: IdOrObject,
    pub status: String,
    pub latest_invoice: Option<IdOrObject>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub items: Option<ListPage<SubscriptionItemObject>>,
    pub created: i64,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionItemObject {
    pub price: Option<IdOrObject>,
}

impl SubscriptionObject {
    pub fn into_subscription(self) -> Subscription {
        // Prefer the plan name we tagged at creation, then the first item's price
        let plan = self.metadata.get(PLAN_METADATA_KEY).cloned().or_else(|| {
            self.items
                .as_ref()
                .and_then(|items| items.data.first())
                .and_then(|item| item.price.as_ref())
                .map(|price| price.id().to_string())
        });
        Subscription {
            id: self.id,
            customer: self.customer.into_id(),
            plan,
            status: self.status.parse().unwrap_or(SubscriptionStatus::Incomplete),
            latest_invoice: self.latest_invoice.map(IdOrObject::into_id),
            created_at: timestamp(self.created),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    pub customer: Option<IdOrObject>,
    pub subscription: Option<IdOrObject>,
    #[serde(default)]
    pub amount_due: i64,
    #[serde(default)]
    pub amount_paid: i64,
    pub currency: Option<String>,
    pub charge: Option<IdOrObject>,
    #[serde(default)]
    pub paid: bool,
    pub created: i64,
}

impl From<InvoiceObject> for Invoice {
    fn from(invoice: InvoiceObject) -> Self {
        Invoice {
            id: invoice.id,
            customer: invoice.customer.map(IdOrObject::into_id),
            subscription: invoice.subscription.map(IdOrObject::into_id),
            amount_due: invoice.amount_due,
            amount_paid: invoice.amount_paid,
            currency: invoice.currency,
            charge: invoice.charge.map(IdOrObject::into_id),
            paid: invoice.paid,
            created_at: timestamp(invoice.created),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CouponObject {
    pub id: String,
    pub name: Option<String>,
    pub amount_off: Option<i64>,
    pub percent_off: Option<f64>,
    pub currency: Option<String>,
    pub duration: String,
    #[serde(default)]
    pub valid: bool,
}

impl From<CouponObject> for Coupon {
    fn from(coupon: CouponObject) -> Self {
        Coupon {
            id: coupon.id,
            name: coupon.name,
            amount_off: coupon.amount_off,
            percent_off: coupon.percent_off,
            currency: coupon.currency,
            duration: coupon.duration.parse().unwrap_or(CouponDuration::Once),
            valid: coupon.valid,
        }
    }
}

/// A customer, including the coupon of its active discount
#[derive(Debug, Deserialize)]
pub struct CustomerObject {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
    pub email: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub delinquent: Option<bool>,
    pub default_source: Option<IdOrObject>,
    pub discount: Option<DiscountObject>,
    pub created: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DiscountObject {
    pub coupon: IdOrObject,
}

impl From<CustomerObject> for Customer {
    fn from(customer: CustomerObject) -> Self {
        Customer {
            id: customer.id,
            email: customer.email,
            description: customer.description,
            metadata: metadata_to_sorted_indexmap(customer.metadata),
            delinquent: customer.delinquent.unwrap_or(false),
            default_source: customer
                .default_source
                .map(IdOrObject::into_id)
                .filter(|id| !id.is_empty()),
            coupon: customer.discount.map(|discount| discount.coupon.into_id()),
            created_at: customer.created.map(timestamp).unwrap_or_else(Utc::now),
        }
    }
}

/// Objects that can be paged through with `starting_after`
pub trait ListItem {
    fn list_id(&self) -> &str;
}

impl ListItem for CustomerObject {
    fn list_id(&self) -> &str {
        &self.id
    }
}

impl ListItem for SubscriptionObject {
    fn list_id(&self) -> &str {
        &self.id
    }
}

impl ListItem for InvoiceObject {
    fn list_id(&self) -> &str {
        &self.id
    }
}

impl ListItem for CouponObject {
    fn list_id(&self) -> &str {
        &self.id
    }
}
