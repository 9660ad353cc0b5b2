use std::collections::HashMap;

use billpilot_types::{Charge, ChargeStatus, Customer, Metadata};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

pub(crate) fn timestamp(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}

/// Convert Stripe metadata (HashMap) to IndexMap with sorted keys for consistent ordering
pub(crate) fn metadata_to_sorted_indexmap(metadata: HashMap<String, String>) -> Metadata {
    let mut entries: Vec<(String, String)> = metadata.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().collect::<IndexMap<_, _>>()
}

pub(crate) fn convert_customer(customer: stripe::Customer) -> Customer {
    Customer {
        id: customer.id.to_string(),
        email: customer.email,
        description: customer.description,
        metadata: metadata_to_sorted_indexmap(customer.metadata.unwrap_or_default()),
        delinquent: customer.delinquent.unwrap_or(false),
        default_source: customer
            .default_source
            .map(|source| source.id().to_string())
            .filter(|id| !id.is_empty()),
        // The typed `Discount` has no coupon; raw reads fill it in
        coupon: None,
        created_at: customer.created.map(timestamp).unwrap_or_else(Utc::now),
    }
}

pub(crate) fn convert_charge(charge: stripe::Charge) -> Charge {
    let status = charge
        .status
        .as_str()
        .parse()
        .unwrap_or(ChargeStatus::Pending);
    Charge {
        id: charge.id.to_string(),
        amount: charge.amount,
        currency: charge.currency.to_string(),
        status,
        customer: charge.customer.map(|customer| customer.id().to_string()),
        failure_message: charge.failure_message,
        created_at: timestamp(charge.created),
    }
}
