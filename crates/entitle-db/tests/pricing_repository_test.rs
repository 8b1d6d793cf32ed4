//! Integration tests for the pricing repository: window lookup,
//! overlap rejection, and history.

mod common;

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use common::{seed, setup};
use entitle_core::models::pricing::{BillingCycle, CreatePricingEntry};
use entitle_core::repository::{PricingRepository, PricingWrite};
use entitle_db::repository::SurrealPricingRepository;
use uuid::Uuid;

fn entry(
    application_id: Uuid,
    price: &str,
    from: chrono::DateTime<Utc>,
    to: Option<chrono::DateTime<Utc>>,
) -> CreatePricingEntry {
    CreatePricingEntry {
        application_id,
        user_type: "operations".into(),
        price: BigDecimal::from_str(price).unwrap(),
        currency: "BRL".into(),
        billing_cycle: BillingCycle::Monthly,
        valid_from: from,
        valid_to: to,
    }
}

#[tokio::test]
async fn current_price_is_the_covering_window() {
    let db = setup().await;
    let (_tenant, app, _user) = seed(&db).await;
    let repo = SurrealPricingRepository::new(db);

    let now = Utc::now();
    let cutover = now - Duration::days(30);

    // Old window, then the one in force.
    let old = repo
        .create(entry(
            app.id,
            "29.90",
            now - Duration::days(365),
            Some(cutover),
        ))
        .await
        .unwrap();
    assert!(matches!(old, PricingWrite::Created(_)));

    let new = repo.create(entry(app.id, "35.00", cutover, None)).await.unwrap();
    assert!(matches!(new, PricingWrite::Created(_)));

    let current = repo
        .current(app.id, "operations", now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.price, BigDecimal::from_str("35.00").unwrap());

    // A historical instant resolves to the old window.
    let then = repo
        .current(app.id, "operations", now - Duration::days(60))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(then.price, BigDecimal::from_str("29.90").unwrap());
}

#[tokio::test]
async fn unconfigured_pair_has_no_current_price() {
    let db = setup().await;
    let (_tenant, app, _user) = seed(&db).await;
    let repo = SurrealPricingRepository::new(db);

    assert!(
        repo.current(app.id, "operations", Utc::now())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn overlapping_windows_for_the_same_pair_are_rejected() {
    let db = setup().await;
    let (_tenant, app, _user) = seed(&db).await;
    let repo = SurrealPricingRepository::new(db);

    let now = Utc::now();
    repo.create(entry(app.id, "35.00", now, None)).await.unwrap();

    // Any window starting after an open-ended one overlaps it.
    let clash = repo
        .create(entry(app.id, "40.00", now + Duration::days(30), None))
        .await
        .unwrap();
    assert!(matches!(clash, PricingWrite::Overlap));
}

#[tokio::test]
async fn adjacent_windows_do_not_overlap() {
    let db = setup().await;
    let (_tenant, app, _user) = seed(&db).await;
    let repo = SurrealPricingRepository::new(db);

    let now = Utc::now();
    let cutover = now + Duration::days(30);

    repo.create(entry(app.id, "35.00", now, Some(cutover)))
        .await
        .unwrap();
    // Starts exactly where the previous window ends.
    let next = repo.create(entry(app.id, "40.00", cutover, None)).await.unwrap();
    assert!(matches!(next, PricingWrite::Created(_)));
}

#[tokio::test]
async fn different_user_types_do_not_clash() {
    let db = setup().await;
    let (_tenant, app, _user) = seed(&db).await;
    let repo = SurrealPricingRepository::new(db);

    let now = Utc::now();
    repo.create(entry(app.id, "35.00", now, None)).await.unwrap();

    let mut other = entry(app.id, "55.00", now, None);
    other.user_type = "manager".into();
    let write = repo.create(other).await.unwrap();
    assert!(matches!(write, PricingWrite::Created(_)));
}

#[tokio::test]
async fn history_is_newest_first() {
    let db = setup().await;
    let (_tenant, app, _user) = seed(&db).await;
    let repo = SurrealPricingRepository::new(db);

    let now = Utc::now();
    let cutover = now - Duration::days(30);
    repo.create(entry(
        app.id,
        "29.90",
        now - Duration::days(365),
        Some(cutover),
    ))
    .await
    .unwrap();
    repo.create(entry(app.id, "35.00", cutover, None)).await.unwrap();

    let history = repo.history(app.id, "operations").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].price, BigDecimal::from_str("35.00").unwrap());
    assert_eq!(history[1].price, BigDecimal::from_str("29.90").unwrap());
}
