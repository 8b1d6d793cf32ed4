//! Grant/revoke orchestration tests: the seat-accounting and pricing
//! scenarios.

mod common;

use std::str::FromStr;

use bigdecimal::BigDecimal;
use common::{Service, setup};
use entitle_core::denial::DenyReason;
use entitle_core::models::pricing::BillingCycle;
use entitle_core::models::user::TenantRole;
use entitle_engine::error::AccessError;
use entitle_engine::{GrantOutcome, GrantRequest};
use uuid::Uuid;

fn denied(err: AccessError) -> DenyReason {
    match err {
        AccessError::Denied(reason) => reason,
        AccessError::Internal(e) => panic!("expected denial, got infrastructure fault: {e}"),
    }
}

async fn grant(service: &Service, user_id: Uuid, tenant_id: Uuid) -> Result<GrantOutcome, AccessError> {
    service
        .grant(GrantRequest {
            user_id,
            tenant_id,
            application_slug: "tq".into(),
            app_role: None,
            expires_at: None,
            granted_by: user_id,
        })
        .await
}

#[tokio::test]
async fn granting_freezes_price_and_takes_the_first_seat() {
    let env = setup().await;
    env.license(None).await;
    env.price("operations", "35.00").await;
    let service = env.service();

    let outcome = grant(&service, env.user.id, env.tenant.id).await.unwrap();

    assert_eq!(outcome.license.seats_used, 1);
    assert!(outcome.grant.active);
    assert_eq!(outcome.grant.app_role, "operations");
    assert_eq!(
        outcome.grant.pricing.price,
        BigDecimal::from_str("35.00").unwrap()
    );
    assert_eq!(outcome.grant.pricing.currency, "BRL");
    assert_eq!(outcome.grant.pricing.billing_cycle, BillingCycle::Monthly);
    assert_eq!(outcome.grant.pricing.user_type, "operations");
}

#[tokio::test]
async fn granting_without_a_license_is_denied() {
    let env = setup().await;
    env.price("operations", "35.00").await;
    let service = env.service();

    let err = grant(&service, env.user.id, env.tenant.id).await.unwrap_err();
    assert_eq!(
        denied(err),
        DenyReason::NoTenantLicense {
            application: "tq".into()
        }
    );
}

#[tokio::test]
async fn third_grant_on_a_two_seat_license_is_rejected() {
    let env = setup().await;
    env.license(Some(2)).await;
    env.price("operations", "35.00").await;
    let service = env.service();

    let bob = env.create_user("bob", TenantRole::Operations).await;
    let carol = env.create_user("carol", TenantRole::Operations).await;

    grant(&service, env.user.id, env.tenant.id).await.unwrap();
    grant(&service, bob.id, env.tenant.id).await.unwrap();

    let err = grant(&service, carol.id, env.tenant.id).await.unwrap_err();
    let reason = denied(err);
    assert_eq!(reason, DenyReason::SeatLimitExceeded { limit: 2 });
    // The message gives the admin the number they need.
    assert!(reason.to_string().contains('2'));

    // Seat count unchanged by the failed attempt.
    assert_eq!(env.fresh_license().await.seats_used, 2);
}

#[tokio::test]
async fn missing_pricing_blocks_the_grant_entirely() {
    let env = setup().await;
    env.license(Some(5)).await;
    // Pricing configured for managers only — not for alice's type.
    env.price("manager", "55.00").await;
    let service = env.service();

    let err = grant(&service, env.user.id, env.tenant.id).await.unwrap_err();
    let reason = denied(err);
    assert_eq!(
        reason,
        DenyReason::PricingNotConfigured {
            application: "tq".into(),
            user_type: "operations".into()
        }
    );
    // Self-correction detail: names the application and user type.
    assert!(reason.to_string().contains("tq"));
    assert!(reason.to_string().contains("operations"));

    // No grant row and no seat increment happened.
    assert_eq!(env.fresh_license().await.seats_used, 0);
    let entries = env.audit_entries().await;
    assert!(entries.is_empty()); // admin surface does not audit decisions
}

#[tokio::test]
async fn duplicate_grant_is_a_conflict_not_a_second_seat() {
    let env = setup().await;
    env.license(Some(5)).await;
    env.price("operations", "35.00").await;
    let service = env.service();

    grant(&service, env.user.id, env.tenant.id).await.unwrap();
    let err = grant(&service, env.user.id, env.tenant.id).await.unwrap_err();
    assert_eq!(denied(err), DenyReason::DuplicateGrant);

    assert_eq!(env.fresh_license().await.seats_used, 1);
}

#[tokio::test]
async fn revoke_returns_the_seat_and_is_idempotent() {
    let env = setup().await;
    env.license(Some(2)).await;
    env.price("operations", "35.00").await;
    let service = env.service();

    grant(&service, env.user.id, env.tenant.id).await.unwrap();
    assert_eq!(env.fresh_license().await.seats_used, 1);

    let revoked = service
        .revoke(env.user.id, env.tenant.id, "tq", env.user.id)
        .await
        .unwrap();
    assert!(!revoked.active);
    assert_eq!(env.fresh_license().await.seats_used, 0);

    // Revoking again is a no-op: still zero, never negative.
    let again = service
        .revoke(env.user.id, env.tenant.id, "tq", env.user.id)
        .await
        .unwrap();
    assert!(!again.active);
    assert_eq!(env.fresh_license().await.seats_used, 0);
}

#[tokio::test]
async fn revoking_an_unknown_grant_is_grant_not_found() {
    let env = setup().await;
    env.license(None).await;
    let service = env.service();

    let err = service
        .revoke(env.user.id, env.tenant.id, "tq", env.user.id)
        .await
        .unwrap_err();
    assert_eq!(denied(err), DenyReason::GrantNotFound);
}

#[tokio::test]
async fn regrant_after_revoke_captures_the_price_then_in_force() {
    let env = setup().await;
    env.license(None).await;
    env.price("operations", "35.00").await;
    let service = env.service();

    let first = grant(&service, env.user.id, env.tenant.id).await.unwrap();
    assert_eq!(
        first.grant.pricing.price,
        BigDecimal::from_str("35.00").unwrap()
    );

    service
        .revoke(env.user.id, env.tenant.id, "tq", env.user.id)
        .await
        .unwrap();

    let second = grant(&service, env.user.id, env.tenant.id).await.unwrap();
    // Same window still in force; a fresh snapshot of it is taken.
    assert_eq!(
        second.grant.pricing.price,
        BigDecimal::from_str("35.00").unwrap()
    );
    assert_ne!(first.grant.id, second.grant.id);

    assert_eq!(env.fresh_license().await.seats_used, 1);
}

#[tokio::test]
async fn seat_conservation_over_interleaved_grant_and_revoke() {
    let env = setup().await;
    env.license(Some(3)).await;
    env.price("operations", "35.00").await;
    let service = env.service();

    let bob = env.create_user("bob", TenantRole::Operations).await;
    let carol = env.create_user("carol", TenantRole::Operations).await;

    grant(&service, env.user.id, env.tenant.id).await.unwrap(); // 1
    grant(&service, bob.id, env.tenant.id).await.unwrap(); // 2
    service
        .revoke(env.user.id, env.tenant.id, "tq", env.user.id)
        .await
        .unwrap(); // 1
    grant(&service, carol.id, env.tenant.id).await.unwrap(); // 2
    grant(&service, env.user.id, env.tenant.id).await.unwrap(); // 3

    // successful grants (4) - successful revokes (1) = 3
    assert_eq!(env.fresh_license().await.seats_used, 3);
}

#[tokio::test]
async fn caller_supplied_app_role_overrides_the_default() {
    let env = setup().await;
    env.license(None).await;
    env.price("operations", "35.00").await;
    let service = env.service();

    let outcome = service
        .grant(GrantRequest {
            user_id: env.user.id,
            tenant_id: env.tenant.id,
            application_slug: "tq".into(),
            app_role: Some("reviewer".into()),
            expires_at: None,
            granted_by: env.user.id,
        })
        .await
        .unwrap();

    assert_eq!(outcome.grant.app_role, "reviewer");
}

#[tokio::test]
async fn granting_for_an_unknown_application_is_denied() {
    let env = setup().await;
    let service = env.service();

    let err = service
        .grant(GrantRequest {
            user_id: env.user.id,
            tenant_id: env.tenant.id,
            application_slug: "no-such-app".into(),
            app_role: None,
            expires_at: None,
            granted_by: env.user.id,
        })
        .await
        .unwrap_err();
    assert_eq!(
        denied(err),
        DenyReason::ApplicationNotFound {
            slug: "no-such-app".into()
        }
    );
}
