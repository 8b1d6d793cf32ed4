//! Pricing resolver tests: validation, window resolution, and
//! snapshot immutability.

mod common;

use std::str::FromStr;
use std::time::Duration as StdDuration;

use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use common::setup;
use entitle_core::denial::DenyReason;
use entitle_core::error::EntitleError;
use entitle_core::models::pricing::{BillingCycle, CreatePricingEntry};
use entitle_core::repository::GrantRepository;
use entitle_db::repository::{SurrealGrantRepository, SurrealPricingRepository};
use entitle_engine::error::AccessError;
use entitle_engine::{GrantRequest, PricingService};

fn entry(application_id: uuid::Uuid, price: &str) -> CreatePricingEntry {
    CreatePricingEntry {
        application_id,
        user_type: "operations".into(),
        price: BigDecimal::from_str(price).unwrap(),
        currency: "BRL".into(),
        billing_cycle: BillingCycle::Monthly,
        valid_from: Utc::now(),
        valid_to: None,
    }
}

#[tokio::test]
async fn negative_prices_are_rejected_before_any_write() {
    let env = setup().await;
    let pricing = PricingService::new(SurrealPricingRepository::new(env.db.clone()));

    let err = pricing
        .schedule_price(entry(env.app.id, "-1.00"))
        .await
        .unwrap_err();
    match err {
        AccessError::Denied(DenyReason::InvalidPrice { price }) => {
            assert_eq!(price, "-1.00");
        }
        other => panic!("expected InvalidPrice, got {other:?}"),
    }

    // Nothing was written.
    assert!(pricing.history(env.app.id, "operations").await.unwrap().is_empty());
}

#[tokio::test]
async fn inverted_windows_are_rejected() {
    let env = setup().await;
    let pricing = PricingService::new(SurrealPricingRepository::new(env.db.clone()));

    let mut input = entry(env.app.id, "35.00");
    input.valid_to = Some(input.valid_from - Duration::days(1));

    let err = pricing.schedule_price(input).await.unwrap_err();
    assert!(matches!(
        err,
        AccessError::Internal(EntitleError::Validation { .. })
    ));
}

#[tokio::test]
async fn overlapping_schedules_are_rejected() {
    let env = setup().await;
    let pricing = PricingService::new(SurrealPricingRepository::new(env.db.clone()));

    pricing.schedule_price(entry(env.app.id, "35.00")).await.unwrap();

    let err = pricing
        .schedule_price(entry(env.app.id, "40.00"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AccessError::Internal(EntitleError::Validation { .. })
    ));
}

#[tokio::test]
async fn current_price_resolves_none_for_unconfigured_pairs() {
    let env = setup().await;
    let pricing = PricingService::new(SurrealPricingRepository::new(env.db.clone()));

    assert!(
        pricing
            .current_price(env.app.id, "operations")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn issued_snapshots_survive_price_changes() {
    let env = setup().await;
    env.license(None).await;
    let pricing = PricingService::new(SurrealPricingRepository::new(env.db.clone()));
    let service = env.service();

    // Price in force now, with a scheduled increase shortly after.
    let cutover = Utc::now() + Duration::seconds(1);
    env.price_window("operations", "35.00", Utc::now() - Duration::days(30), Some(cutover))
        .await;
    env.price_window("operations", "49.90", cutover, None).await;

    let outcome = service
        .grant(GrantRequest {
            user_id: env.user.id,
            tenant_id: env.tenant.id,
            application_slug: "tq".into(),
            app_role: None,
            expires_at: None,
            granted_by: env.user.id,
        })
        .await
        .unwrap();
    assert_eq!(
        outcome.grant.pricing.price,
        BigDecimal::from_str("35.00").unwrap()
    );

    // Let the scheduled increase take effect.
    tokio::time::sleep(StdDuration::from_millis(1200)).await;

    let current = pricing
        .current_price(env.app.id, "operations")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.price, BigDecimal::from_str("49.90").unwrap());

    // The already-issued grant still carries the frozen snapshot.
    let grants = SurrealGrantRepository::new(env.db.clone());
    let grant = grants
        .find_active(env.user.id, env.tenant.id, env.app.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(grant.pricing.price, BigDecimal::from_str("35.00").unwrap());
    assert_eq!(grant.pricing.currency, "BRL");
}
