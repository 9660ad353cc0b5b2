//! Mock Stripe REST endpoint for driver tests.

use billpilot_driver_stripe::{StripeConfig, StripeProcessor};
use serde_json::{Value, json};
use wiremock::MockServer;

pub const TEST_API_KEY: &str = "sk_test_mock";

pub struct StripeMockServer {
    pub server: MockServer,
}

impl StripeMockServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// A processor whose requests all land on this server
    pub fn processor(&self) -> StripeProcessor {
        let config = StripeConfig::new(TEST_API_KEY).with_api_base(self.server.uri());
        StripeProcessor::new(config)
    }
}

pub fn customer_json(id: &str, default_source: Option<&str>) -> Value {
    json!({
        "id": id,
        "object": "customer",
        "email": "anEmail@email.com",
        "description": "a description",
        "metadata": {},
        "delinquent": false,
        "default_source": default_source,
        "discount": null,
        "created": 1700000000
    })
}

pub fn subscription_json(id: &str, customer: &str, plan: &str, invoice: &str) -> Value {
    json!({
        "id": id,
        "object": "subscription",
        "customer": customer,
        "status": "active",
        "latest_invoice": invoice,
        "metadata": {"plan": plan},
        "items": {"object": "list", "data": [{"price": {"id": plan}}], "has_more": false},
        "created": 1700000000
    })
}

pub fn coupon_json(id: &str) -> Value {
    json!({
        "id": id,
        "object": "coupon",
        "name": null,
        "amount_off": 10,
        "percent_off": null,
        "currency": "usd",
        "duration": "once",
        "valid": true
    })
}

pub fn error_json(code: &str, message: &str, param: Option<&str>) -> Value {
    json!({
        "error": {
            "type": "invalid_request_error",
            "code": code,
            "message": message,
            "param": param
        }
    })
}
