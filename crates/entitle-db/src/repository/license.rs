//! SurrealDB implementation of [`LicenseRepository`].
//!
//! Seat counter mutations are single conditional UPDATE statements so
//! the check-and-increment happens inside the datastore, never as a
//! read-modify-write from the caller's perspective.

use chrono::{DateTime, Utc};
use entitle_core::error::{EntitleError, EntitleResult};
use entitle_core::models::license::{CreateLicense, License, LicenseStatus, SeatAvailability};
use entitle_core::repository::LicenseRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::warn;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct LicenseRow {
    tenant_id: String,
    application_id: String,
    status: String,
    activated_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    seat_limit: Option<u32>,
    seats_used: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct LicenseRowWithId {
    record_id: String,
    tenant_id: String,
    application_id: String,
    status: String,
    activated_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    seat_limit: Option<u32>,
    seats_used: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub(crate) fn parse_status(s: &str) -> Result<LicenseStatus, DbError> {
    match s {
        "Active" => Ok(LicenseStatus::Active),
        "Expired" => Ok(LicenseStatus::Expired),
        "Suspended" => Ok(LicenseStatus::Suspended),
        other => Err(DbError::Decode(format!("unknown license status: {other}"))),
    }
}

impl LicenseRow {
    fn into_license(self, id: Uuid) -> Result<License, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        let application_id = Uuid::parse_str(&self.application_id)
            .map_err(|e| DbError::Decode(format!("invalid application UUID: {e}")))?;
        Ok(License {
            id,
            tenant_id,
            application_id,
            status: parse_status(&self.status)?,
            activated_at: self.activated_at,
            expires_at: self.expires_at,
            seat_limit: self.seat_limit,
            seats_used: self.seats_used,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl LicenseRowWithId {
    fn try_into_license(self) -> Result<License, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        LicenseRow {
            tenant_id: self.tenant_id,
            application_id: self.application_id,
            status: self.status,
            activated_at: self.activated_at,
            expires_at: self.expires_at,
            seat_limit: self.seat_limit,
            seats_used: self.seats_used,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_license(id)
    }
}

/// SurrealDB implementation of the License repository.
#[derive(Clone)]
pub struct SurrealLicenseRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealLicenseRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn set_status(&self, license_id: Uuid, status: &'static str) -> EntitleResult<License> {
        let id_str = license_id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('license', $id) SET \
                 status = $status, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<LicenseRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "license".into(),
            id: id_str,
        })?;

        Ok(row.into_license(license_id)?)
    }
}

impl<C: Connection> LicenseRepository for SurrealLicenseRepository<C> {
    async fn create(&self, input: CreateLicense) -> EntitleResult<License> {
        if self
            .get(input.tenant_id, input.application_id)
            .await?
            .is_some()
        {
            return Err(EntitleError::AlreadyExists {
                entity: "license".into(),
            });
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('license', $id) SET \
                 tenant_id = $tenant_id, \
                 application_id = $application_id, \
                 status = 'Active', \
                 activated_at = time::now(), \
                 expires_at = $expires_at, \
                 seat_limit = $seat_limit, \
                 seats_used = 0",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("application_id", input.application_id.to_string()))
            .bind(("expires_at", input.expires_at))
            .bind(("seat_limit", input.seat_limit))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<LicenseRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "license".into(),
            id: id_str,
        })?;

        Ok(row.into_license(id)?)
    }

    async fn get(&self, tenant_id: Uuid, application_id: Uuid) -> EntitleResult<Option<License>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM license \
                 WHERE tenant_id = $tenant_id \
                 AND application_id = $application_id",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("application_id", application_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LicenseRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(LicenseRowWithId::try_into_license)
            .transpose()
            .map_err(Into::into)
    }

    async fn find_usable(
        &self,
        tenant_id: Uuid,
        application_id: Uuid,
    ) -> EntitleResult<Option<License>> {
        // Missing expiry means "never expires".
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM license \
                 WHERE tenant_id = $tenant_id \
                 AND application_id = $application_id \
                 AND status = 'Active' \
                 AND (expires_at = NONE OR expires_at > time::now())",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("application_id", application_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LicenseRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(LicenseRowWithId::try_into_license)
            .transpose()
            .map_err(Into::into)
    }

    async fn seat_availability(&self, license_id: Uuid) -> EntitleResult<Option<SeatAvailability>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('license', $id)")
            .bind(("id", license_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LicenseRow> = result.take(0).map_err(DbError::from)?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        Ok(row.seat_limit.map(|seat_limit| SeatAvailability {
            seat_limit,
            seats_used: row.seats_used,
        }))
    }

    async fn claim_seat(&self, license_id: Uuid) -> EntitleResult<bool> {
        // Check-and-increment in a single conditional statement.
        let mut result = self
            .db
            .query(
                "UPDATE type::record('license', $id) SET \
                 seats_used += 1, updated_at = time::now() \
                 WHERE status = 'Active' \
                 AND (seat_limit = NONE OR seats_used < seat_limit)",
            )
            .bind(("id", license_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LicenseRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn release_seat(&self, license_id: Uuid) -> EntitleResult<()> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('license', $id) SET \
                 seats_used -= 1, updated_at = time::now() \
                 WHERE seats_used > 0",
            )
            .bind(("id", license_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LicenseRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            // Decrementing below zero is a logic error upstream, not a
            // user-facing failure: clamp and log.
            warn!(license_id = %license_id, "seat release clamped at zero");
        }

        Ok(())
    }

    async fn suspend(&self, license_id: Uuid) -> EntitleResult<License> {
        self.set_status(license_id, "Suspended").await
    }

    async fn reactivate(&self, license_id: Uuid) -> EntitleResult<License> {
        self.set_status(license_id, "Active").await
    }

    async fn expire_overdue(&self) -> EntitleResult<u64> {
        let mut result = self
            .db
            .query(
                "UPDATE license SET \
                 status = 'Expired', updated_at = time::now() \
                 WHERE status = 'Active' \
                 AND expires_at != NONE \
                 AND expires_at < time::now()",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LicenseRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
