//! SurrealDB implementation of [`GrantRepository`].
//!
//! Grant creation and revocation are multi-statement transactions that
//! keep the duplicate-grant and seat conditions next to the mutation:
//! two concurrent grants for the last seat cannot both succeed, and
//! concurrent revokes cannot release a seat twice. Condition failures
//! are surfaced as THROW markers and mapped back to typed outcomes.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use entitle_core::error::EntitleResult;
use entitle_core::models::grant::{CreateGrant, Grant, PricingSnapshot};
use entitle_core::models::pricing::BillingCycle;
use entitle_core::repository::{GrantRepository, GrantWrite, RevokeWrite};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

const THROW_DUPLICATE: &str = "duplicate_grant";
const THROW_NO_SEAT: &str = "seat_unavailable";

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct GrantRowWithId {
    record_id: String,
    user_id: String,
    tenant_id: String,
    application_id: String,
    license_id: String,
    active: bool,
    app_role: String,
    granted_by: String,
    granted_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
    revoked_by: Option<String>,
    price: String,
    currency: String,
    billing_cycle: String,
    user_type: String,
}

fn parse_uuid(field: &str, s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

impl GrantRowWithId {
    fn try_into_grant(self) -> Result<Grant, DbError> {
        let price = BigDecimal::from_str(&self.price)
            .map_err(|e| DbError::Decode(format!("invalid price: {e}")))?;
        let billing_cycle = BillingCycle::parse(&self.billing_cycle)
            .ok_or_else(|| DbError::Decode(format!("unknown billing cycle: {}", self.billing_cycle)))?;
        let revoked_by = self
            .revoked_by
            .as_deref()
            .map(|s| parse_uuid("revoked_by", s))
            .transpose()?;

        Ok(Grant {
            id: parse_uuid("grant", &self.record_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            application_id: parse_uuid("application", &self.application_id)?,
            license_id: parse_uuid("license", &self.license_id)?,
            active: self.active,
            app_role: self.app_role,
            granted_by: parse_uuid("granted_by", &self.granted_by)?,
            granted_at: self.granted_at,
            expires_at: self.expires_at,
            revoked_at: self.revoked_at,
            revoked_by,
            pricing: PricingSnapshot {
                price,
                currency: self.currency,
                billing_cycle,
                user_type: self.user_type,
            },
        })
    }
}

/// SurrealDB implementation of the Grant repository.
#[derive(Clone)]
pub struct SurrealGrantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGrantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn get_by_id(&self, id: Uuid) -> EntitleResult<Option<Grant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('access_grant', $id)",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(GrantRowWithId::try_into_grant)
            .transpose()
            .map_err(Into::into)
    }

    /// Deactivate one grant and release its seat in a single
    /// transaction. The seat is released only when this call is the
    /// one that flips `active`, so a lost race releases nothing.
    async fn deactivate_and_release(
        &self,
        grant_id: Uuid,
        license_id: Uuid,
        revoked_by: Option<Uuid>,
    ) -> EntitleResult<()> {
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $g = (UPDATE type::record('access_grant', $grant_id) SET \
                     active = false, \
                     revoked_at = time::now(), \
                     revoked_by = $revoked_by \
                     WHERE active = true); \
                 IF array::len($g) > 0 { \
                     UPDATE type::record('license', $license_id) SET \
                         seats_used -= 1, updated_at = time::now() \
                         WHERE seats_used > 0; \
                 }; \
                 COMMIT TRANSACTION;",
            )
            .bind(("grant_id", grant_id.to_string()))
            .bind(("license_id", license_id.to_string()))
            .bind(("revoked_by", revoked_by.map(|id| id.to_string())))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }
}

impl<C: Connection> GrantRepository for SurrealGrantRepository<C> {
    async fn find_active(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        application_id: Uuid,
    ) -> EntitleResult<Option<Grant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM access_grant \
                 WHERE tenant_id = $tenant_id \
                 AND user_id = $user_id \
                 AND application_id = $application_id \
                 AND active = true \
                 AND (expires_at = NONE OR expires_at > time::now())",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .bind(("application_id", application_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(GrantRowWithId::try_into_grant)
            .transpose()
            .map_err(Into::into)
    }

    async fn get(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        application_id: Uuid,
    ) -> EntitleResult<Option<Grant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM access_grant \
                 WHERE tenant_id = $tenant_id \
                 AND user_id = $user_id \
                 AND application_id = $application_id \
                 ORDER BY granted_at DESC \
                 LIMIT 1",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .bind(("application_id", application_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(GrantRowWithId::try_into_grant)
            .transpose()
            .map_err(Into::into)
    }

    async fn create_active(&self, input: CreateGrant) -> EntitleResult<GrantWrite> {
        let id = Uuid::new_v4();

        // One transaction: re-assert no active duplicate, claim a seat
        // (conditional increment), create the grant row. A THROW
        // cancels the whole transaction.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $dup = (SELECT * FROM access_grant \
                     WHERE tenant_id = $tenant_id \
                     AND user_id = $user_id \
                     AND application_id = $application_id \
                     AND active = true); \
                 IF array::len($dup) > 0 { THROW 'duplicate_grant' }; \
                 LET $lic = (UPDATE type::record('license', $license_id) SET \
                     seats_used += 1, updated_at = time::now() \
                     WHERE status = 'Active' \
                     AND (seat_limit = NONE OR seats_used < seat_limit)); \
                 IF array::len($lic) = 0 { THROW 'seat_unavailable' }; \
                 CREATE type::record('access_grant', $id) SET \
                     user_id = $user_id, \
                     tenant_id = $tenant_id, \
                     application_id = $application_id, \
                     license_id = $license_id, \
                     active = true, \
                     app_role = $app_role, \
                     granted_by = $granted_by, \
                     granted_at = time::now(), \
                     expires_at = $expires_at, \
                     revoked_at = NONE, \
                     revoked_by = NONE, \
                     price = $price, \
                     currency = $currency, \
                     billing_cycle = $billing_cycle, \
                     user_type = $user_type; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("application_id", input.application_id.to_string()))
            .bind(("license_id", input.license_id.to_string()))
            .bind(("app_role", input.app_role))
            .bind(("granted_by", input.granted_by.to_string()))
            .bind(("expires_at", input.expires_at))
            .bind(("price", input.pricing.price.to_string()))
            .bind(("currency", input.pricing.currency))
            .bind(("billing_cycle", input.pricing.billing_cycle.as_str().to_string()))
            .bind(("user_type", input.pricing.user_type))
            .await
            .map_err(DbError::from)?;

        if let Err(e) = result.check() {
            let msg = e.to_string();
            if msg.contains(THROW_DUPLICATE) {
                return Ok(GrantWrite::Duplicate);
            }
            if msg.contains(THROW_NO_SEAT) {
                return Ok(GrantWrite::SeatUnavailable);
            }
            return Err(DbError::Query(msg).into());
        }

        let grant = self.get_by_id(id).await?.ok_or_else(|| DbError::NotFound {
            entity: "access_grant".into(),
            id: id.to_string(),
        })?;

        Ok(GrantWrite::Created(grant))
    }

    async fn revoke(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        application_id: Uuid,
        revoked_by: Uuid,
    ) -> EntitleResult<RevokeWrite> {
        let Some(grant) = self.get(user_id, tenant_id, application_id).await? else {
            return Ok(RevokeWrite::NotFound);
        };

        if !grant.active {
            // Idempotent: already revoked, no seat to release.
            return Ok(RevokeWrite::AlreadyInactive(grant));
        }

        self.deactivate_and_release(grant.id, grant.license_id, Some(revoked_by))
            .await?;

        let revoked = self
            .get_by_id(grant.id)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "access_grant".into(),
                id: grant.id.to_string(),
            })?;

        Ok(RevokeWrite::Revoked(revoked))
    }

    async fn deactivate_expired(&self) -> EntitleResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM access_grant \
                 WHERE active = true \
                 AND expires_at != NONE \
                 AND expires_at < time::now()",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut deactivated = 0u64;
        for row in rows {
            let grant = row.try_into_grant()?;
            self.deactivate_and_release(grant.id, grant.license_id, None)
                .await?;
            deactivated += 1;
        }

        Ok(deactivated)
    }
}
