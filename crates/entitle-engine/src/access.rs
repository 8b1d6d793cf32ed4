//! Access grant orchestration — the administrative grant/revoke
//! surface.
//!
//! Granting validates everything before the one mutating write: an
//! upstream timeout can abandon the call at any point without leaving
//! half-applied state. The write itself is a single repository
//! transaction that re-asserts the duplicate and seat conditions, so
//! concurrent requests for the last seat cannot both succeed.

use chrono::{DateTime, Utc};
use entitle_core::denial::DenyReason;
use entitle_core::error::EntitleError;
use entitle_core::models::grant::{CreateGrant, Grant, PricingSnapshot};
use entitle_core::models::license::License;
use entitle_core::repository::{
    ApplicationRepository, GrantRepository, GrantWrite, LicenseRepository, PricingRepository,
    RevokeWrite, UserRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::error::AccessError;
use crate::pricing::PricingService;

/// Input for the grant operation.
#[derive(Debug, Clone)]
pub struct GrantRequest {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub application_slug: String,
    /// Role within the application; defaults from the grantee's
    /// tenant role when absent.
    pub app_role: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub granted_by: Uuid,
}

/// Result of a successful grant: the new grant (with its frozen
/// pricing snapshot) and the license with its updated seat count.
#[derive(Debug, Clone)]
pub struct GrantOutcome {
    pub grant: Grant,
    pub license: License,
}

pub struct AccessService<A, U, L, G, P>
where
    A: ApplicationRepository,
    U: UserRepository,
    L: LicenseRepository,
    G: GrantRepository,
    P: PricingRepository,
{
    apps: A,
    users: U,
    licenses: L,
    grants: G,
    pricing: PricingService<P>,
}

impl<A, U, L, G, P> AccessService<A, U, L, G, P>
where
    A: ApplicationRepository,
    U: UserRepository,
    L: LicenseRepository,
    G: GrantRepository,
    P: PricingRepository,
{
    pub fn new(apps: A, users: U, licenses: L, grants: G, pricing: PricingService<P>) -> Self {
        Self {
            apps,
            users,
            licenses,
            grants,
            pricing,
        }
    }

    /// Grant a user access to an application within their tenant.
    ///
    /// Ordered checks: usable license, no active duplicate, seat
    /// availability, pricing snapshot — then the single transactional
    /// write. Access is never granted without a frozen price.
    pub async fn grant(&self, req: GrantRequest) -> Result<GrantOutcome, AccessError> {
        let app = self
            .apps
            .get_by_slug(&req.application_slug)
            .await?
            .ok_or(DenyReason::ApplicationNotFound {
                slug: req.application_slug.clone(),
            })?;

        let user = self
            .users
            .get_by_id(req.tenant_id, req.user_id)
            .await?
            .ok_or_else(|| EntitleError::NotFound {
                entity: "user".into(),
                id: req.user_id.to_string(),
            })?;

        let license = self
            .licenses
            .find_usable(req.tenant_id, app.id)
            .await?
            .ok_or(DenyReason::NoTenantLicense {
                application: app.slug.clone(),
            })?;

        if self
            .grants
            .find_active(req.user_id, req.tenant_id, app.id)
            .await?
            .is_some()
        {
            return Err(DenyReason::DuplicateGrant.into());
        }

        if let Some(limit) = license.seat_limit {
            let availability = self.licenses.seat_availability(license.id).await?;
            if availability.is_some_and(|a| a.available() <= 0) {
                return Err(DenyReason::SeatLimitExceeded { limit }.into());
            }
        }

        let entry = self
            .pricing
            .current_price(app.id, &user.user_type)
            .await?
            .ok_or_else(|| DenyReason::PricingNotConfigured {
                application: app.slug.clone(),
                user_type: user.user_type.clone(),
            })?;

        let app_role = req
            .app_role
            .unwrap_or_else(|| user.role.as_str().to_string());

        let write = self
            .grants
            .create_active(CreateGrant {
                user_id: req.user_id,
                tenant_id: req.tenant_id,
                application_id: app.id,
                license_id: license.id,
                app_role,
                granted_by: req.granted_by,
                expires_at: req.expires_at,
                pricing: PricingSnapshot {
                    price: entry.price,
                    currency: entry.currency,
                    billing_cycle: entry.billing_cycle,
                    user_type: user.user_type,
                },
            })
            .await?;

        let grant = match write {
            GrantWrite::Created(grant) => grant,
            GrantWrite::Duplicate => return Err(DenyReason::DuplicateGrant.into()),
            GrantWrite::SeatUnavailable => {
                // Lost a race since the pre-checks: either the last
                // seat went, or the license stopped being usable.
                return Err(self.seat_failure(req.tenant_id, &app.slug, app.id).await?);
            }
        };

        let license = self
            .licenses
            .get(req.tenant_id, app.id)
            .await?
            .ok_or_else(|| EntitleError::NotFound {
                entity: "license".into(),
                id: grant.license_id.to_string(),
            })?;

        info!(
            user_id = %grant.user_id,
            tenant_id = %grant.tenant_id,
            application = %app.slug,
            seats_used = license.seats_used,
            "access granted"
        );

        Ok(GrantOutcome { grant, license })
    }

    /// Revoke a user's access to an application.
    ///
    /// Idempotent: revoking an already-inactive grant returns it
    /// unchanged without touching the seat counter. `GrantNotFound`
    /// only when no grant row exists at all for the triple.
    pub async fn revoke(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        application_slug: &str,
        revoked_by: Uuid,
    ) -> Result<Grant, AccessError> {
        let app = self
            .apps
            .get_by_slug(application_slug)
            .await?
            .ok_or(DenyReason::ApplicationNotFound {
                slug: application_slug.to_string(),
            })?;

        match self
            .grants
            .revoke(user_id, tenant_id, app.id, revoked_by)
            .await?
        {
            RevokeWrite::Revoked(grant) => {
                info!(
                    user_id = %user_id,
                    tenant_id = %tenant_id,
                    application = %app.slug,
                    "access revoked"
                );
                Ok(grant)
            }
            RevokeWrite::AlreadyInactive(grant) => Ok(grant),
            RevokeWrite::NotFound => Err(DenyReason::GrantNotFound.into()),
        }
    }

    /// Classify a transactional seat-claim failure with fresh state.
    async fn seat_failure(
        &self,
        tenant_id: Uuid,
        slug: &str,
        application_id: Uuid,
    ) -> Result<AccessError, EntitleError> {
        match self.licenses.find_usable(tenant_id, application_id).await? {
            Some(license) => Ok(DenyReason::SeatLimitExceeded {
                limit: license.seat_limit.unwrap_or(0),
            }
            .into()),
            None => Ok(DenyReason::NoTenantLicense {
                application: slug.to_string(),
            }
            .into()),
        }
    }
}
