/// Generate a Stripe-shaped ID with the given prefix
///
/// # Arguments
/// * `prefix` - The resource prefix (e.g., "cus", "card", "sub", "in", "ch")
///
/// # Returns
/// An ID in the format `{prefix}_{24_char_uuid}`
pub fn generate_stripe_id(prefix: &str) -> String {
    let uuid_str = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &uuid_str[..24])
}

/// Apply a coupon's discount to an amount in minor units, never going below zero
pub fn discounted_amount(amount: i64, amount_off: Option<i64>, percent_off: Option<f64>) -> i64 {
    let discount = match (amount_off, percent_off) {
        (Some(off), _) => off,
        (None, Some(percent)) => (amount as f64 * percent / 100.0).round() as i64,
        (None, None) => 0,
    };
    let amount = amount.max(0);
    amount - discount.clamp(0, amount)
}
