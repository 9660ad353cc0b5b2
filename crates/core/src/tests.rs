//! End-to-end billing scenarios against the sandbox processor.

use std::sync::Arc;

use billpilot_types::ChargeStatus;

use crate::{BillingAdmin, BillingError, BillingService, SandboxProcessor};

struct Harness {
    sandbox: Arc<SandboxProcessor>,
    service: BillingService,
    admin: BillingAdmin,
}

impl Harness {
    fn new() -> Self {
        let sandbox = Arc::new(SandboxProcessor::default());
        Self {
            service: BillingService::new(sandbox.clone()),
            admin: BillingAdmin::new(sandbox.clone()),
            sandbox,
        }
    }
}

#[tokio::test]
async fn test_customer_lifecycle() {
    let h = Harness::new();
    let id = h
        .service
        .create_customer("anEmail@email.com", "a description", None)
        .await
        .unwrap();

    let by_id = h.service.retrieve_customer_by_id(&id).await.unwrap().unwrap();
    assert_eq!(by_id.email.as_deref(), Some("anEmail@email.com"));
    assert_eq!(by_id.description.as_deref(), Some("a description"));

    let by_email = h
        .service
        .retrieve_customer_by_email("anEmail@email.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, id);

    let lite = h.service.retrieve_customer_lite_by_id(&id).await.unwrap().unwrap();
    assert_eq!(lite.id, id);
    assert!(!lite.delinquent);

    let duplicate = h
        .service
        .create_customer("anEmail@email.com", "another description", None)
        .await;
    assert!(matches!(duplicate, Err(BillingError::DuplicateEmail(_))));
    assert_eq!(h.sandbox.customer_count(), 1);

    h.service
        .change_customer_email(&id, "anotherEmail@email.com")
        .await
        .unwrap();
    assert!(h
        .service
        .retrieve_customer_by_email("anEmail@email.com")
        .await
        .unwrap()
        .is_none());

    let other = h
        .service
        .create_customer("anEmail@email.com", "reuses the freed email", None)
        .await
        .unwrap();
    let clash = h.service.change_customer_email(&other, "anotherEmail@email.com").await;
    assert!(matches!(clash, Err(BillingError::DuplicateEmail(_))));

    let first = h.service.retrieve_customer_by_id(&id).await.unwrap().unwrap();
    let second = h.service.retrieve_customer_by_id(&other).await.unwrap().unwrap();
    assert_eq!(first.email.as_deref(), Some("anotherEmail@email.com"));
    assert_eq!(second.email.as_deref(), Some("anEmail@email.com"));
}

#[tokio::test]
async fn test_replacing_source_mid_lifecycle_keeps_charging() {
    let h = Harness::new();
    let id = h
        .service
        .create_customer("switcher@email.com", "changes cards", None)
        .await
        .unwrap();
    h.service
        .replace_payment_source_for_customer(&id, "tok_amex")
        .await
        .unwrap();
    let before = h
        .service
        .create_subscription_for_customer_and_charge("switcher@email.com", "monthly-plan")
        .await
        .unwrap();

    h.service
        .replace_payment_source_for_customer(&id, "tok_visa")
        .await
        .unwrap();
    let after = h
        .service
        .create_subscription_for_customer_and_charge("switcher@email.com", "monthly-plan")
        .await
        .unwrap();

    let first = h.service.get_latest_invoice_for_subscription(&before).await.unwrap();
    let second = h.service.get_latest_invoice_for_subscription(&after).await.unwrap();
    assert_ne!(first.charge, second.charge);

    let charge = h
        .service
        .get_charge(second.charge.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(charge.status, ChargeStatus::Succeeded);
    assert!(second.amount_paid > 0);
}

#[tokio::test]
async fn test_category_listing_follows_updates() {
    let h = Harness::new();
    let mut cat1 = Vec::new();
    for n in 0..3 {
        let id = h
            .service
            .create_customer(&format!("cat1-{n}@email.com"), "first category", Some("CAT1"))
            .await
            .unwrap();
        cat1.push(id);
    }
    h.service
        .create_customer("none@email.com", "untagged", None)
        .await
        .unwrap();

    assert_eq!(h.service.list_all_customers_by_category("CAT1").await.unwrap().len(), 3);
    assert!(h.service.list_all_customers_by_category("CAT2").await.unwrap().is_empty());

    h.service.update_customer_category(&cat1[0], "CAT2").await.unwrap();

    let still_cat1 = h.service.list_all_customers_by_category("CAT1").await.unwrap();
    let now_cat2 = h.service.list_all_customers_by_category("CAT2").await.unwrap();
    assert_eq!(still_cat1.len(), 2);
    assert_eq!(now_cat2.len(), 1);
    assert_eq!(now_cat2[0].id, cat1[0]);
    assert_eq!(h.service.list_all_customers().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_subscribe_discount_and_reset() {
    let h = Harness::new();
    let id = h
        .service
        .create_customer("payer@email.com", "pays monthly", None)
        .await
        .unwrap();

    let refused = h
        .service
        .create_subscription_for_customer_and_charge("payer@email.com", "monthly-plan")
        .await;
    assert!(matches!(refused, Err(BillingError::NoPaymentSource(_))));

    h.service
        .replace_payment_source_for_customer(&id, "tok_amex")
        .await
        .unwrap();
    let full_price = h
        .service
        .create_subscription_for_customer_and_charge("payer@email.com", "monthly-plan")
        .await
        .unwrap();

    h.service
        .apply_coupon_to_customer(&id, "TEST_COUPON_ID")
        .await
        .unwrap();
    let discounted = h
        .service
        .create_subscription_for_customer_and_charge("payer@email.com", "monthly-plan")
        .await
        .unwrap();

    let invoice = h
        .service
        .get_latest_invoice_for_subscription(&full_price)
        .await
        .unwrap();
    assert_eq!(invoice.amount_paid, 100);
    let invoice = h
        .service
        .get_latest_invoice_for_subscription(&discounted)
        .await
        .unwrap();
    assert_eq!(invoice.amount_paid, 90);
    let charge = h
        .service
        .get_charge(invoice.charge.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(charge.amount, 90);
    assert_eq!(h.service.list_all_invoices().await.unwrap().len(), 2);

    h.service.remove_payment_source_from_customer(&id).await.unwrap();
    let refused = h
        .service
        .create_subscription_for_customer_and_charge("payer@email.com", "monthly-plan")
        .await;
    assert!(matches!(refused, Err(BillingError::NoPaymentSource(_))));

    let report = h.admin.reset_environment().await.unwrap();
    assert!(report.is_complete());
    assert_eq!(h.sandbox.subscription_count(), 0);
    assert_eq!(h.sandbox.customer_count(), 0);
    assert!(h.service.retrieve_customer_by_id(&id).await.unwrap().is_none());
}
