use billpilot_types::{Coupon, CouponDuration};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Plans and coupons the sandbox processor knows about.
///
/// ```yaml
/// sandbox:
///   plans:
///     monthly-plan:
///       amount: 100
///       currency: usd
///   coupons:
///     TEST_COUPON_ID:
///       amount_off: 10
///       duration: once
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Plan name to price
    #[serde(default = "default_plans")]
    pub plans: IndexMap<String, SandboxPlan>,

    /// Coupon code to discount
    #[serde(default = "default_coupons")]
    pub coupons: IndexMap<String, SandboxCoupon>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            plans: default_plans(),
            coupons: default_coupons(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxPlan {
    /// Price per billing event, in the currency's minor unit
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SandboxCoupon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_off: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_off: Option<f64>,
    #[serde(default)]
    pub duration: CouponDuration,
}

impl SandboxCoupon {
    pub fn amount_off(amount: i64) -> Self {
        Self {
            amount_off: Some(amount),
            ..Default::default()
        }
    }

    pub fn percent_off(percent: f64) -> Self {
        Self {
            percent_off: Some(percent),
            ..Default::default()
        }
    }

    pub fn forever(mut self) -> Self {
        self.duration = CouponDuration::Forever;
        self
    }

    pub(crate) fn to_coupon(&self, code: &str) -> Coupon {
        Coupon {
            id: code.to_string(),
            name: self.name.clone(),
            amount_off: self.amount_off,
            percent_off: self.percent_off,
            currency: self.amount_off.map(|_| default_currency()),
            duration: self.duration,
            valid: true,
        }
    }
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_plans() -> IndexMap<String, SandboxPlan> {
    IndexMap::from([(
        "monthly-plan".to_string(),
        SandboxPlan {
            amount: 100,
            currency: default_currency(),
        },
    )])
}

fn default_coupons() -> IndexMap<String, SandboxCoupon> {
    IndexMap::from([("TEST_COUPON_ID".to_string(), SandboxCoupon::amount_off(10))])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_seeds_monthly_plan_and_test_coupon() {
        let config = SandboxConfig::default();
        assert_eq!(config.plans["monthly-plan"].amount, 100);
        assert_eq!(config.coupons["TEST_COUPON_ID"].amount_off, Some(10));
        assert_eq!(config.coupons["TEST_COUPON_ID"].duration, CouponDuration::Once);
    }

    #[test]
    fn test_parse_sandbox_section() {
        let yaml = r#"
plans:
  yearly-plan:
    amount: 1000
    currency: eur
coupons:
  HALF:
    percent_off: 50
    duration: forever
"#;
        let config: SandboxConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.plans.len(), 1);
        assert_eq!(config.plans["yearly-plan"].currency, "eur");
        let half = &config.coupons["HALF"];
        assert_eq!(half.percent_off, Some(50.0));
        assert_eq!(half.duration, CouponDuration::Forever);
    }
}
