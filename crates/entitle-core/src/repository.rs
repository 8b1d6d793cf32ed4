//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Lookups return `Option` for
//! "not found"; `Err` is reserved for infrastructure faults, which
//! callers treat as fatal. Tenant-scoped repositories require a
//! `tenant_id` parameter to enforce data isolation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::EntitleResult;
use crate::models::{
    application::{Application, CreateApplication},
    audit::{AccessLogEntry, CreateAccessLogEntry, Decision},
    grant::{CreateGrant, Grant},
    license::{CreateLicense, License, SeatAvailability},
    pricing::{CreatePricingEntry, PricingEntry},
    tenant::{CreateTenant, Tenant},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Tenants & Users
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = EntitleResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = EntitleResult<Option<Tenant>>> + Send;
    fn get_by_slug(&self, slug: &str)
    -> impl Future<Output = EntitleResult<Option<Tenant>>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = EntitleResult<PaginatedResult<Tenant>>> + Send;
}

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = EntitleResult<User>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = EntitleResult<Option<User>>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = EntitleResult<User>> + Send;
    /// Soft-delete: sets status to Inactive.
    fn deactivate(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = EntitleResult<()>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = EntitleResult<PaginatedResult<User>>> + Send;
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

pub trait ApplicationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateApplication,
    ) -> impl Future<Output = EntitleResult<Application>> + Send;
    fn get_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = EntitleResult<Option<Application>>> + Send;
    fn get_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = EntitleResult<Option<Application>>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = EntitleResult<PaginatedResult<Application>>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant application licenses
// ---------------------------------------------------------------------------

pub trait LicenseRepository: Send + Sync {
    /// Activate an application for a tenant. At most one license row
    /// exists per (tenant, application).
    fn create(&self, input: CreateLicense) -> impl Future<Output = EntitleResult<License>> + Send;

    /// The license row regardless of status.
    fn get(
        &self,
        tenant_id: Uuid,
        application_id: Uuid,
    ) -> impl Future<Output = EntitleResult<Option<License>>> + Send;

    /// The usable license (active, unexpired) or `None`.
    fn find_usable(
        &self,
        tenant_id: Uuid,
        application_id: Uuid,
    ) -> impl Future<Output = EntitleResult<Option<License>>> + Send;

    /// Fresh seat headroom; `None` when the license is uncapped or
    /// missing (callers check the license first).
    fn seat_availability(
        &self,
        license_id: Uuid,
    ) -> impl Future<Output = EntitleResult<Option<SeatAvailability>>> + Send;

    /// Conditional atomic increment: succeeds (returns `true`) only
    /// while the license is active and a seat remains. Never
    /// read-modify-write.
    fn claim_seat(&self, license_id: Uuid) -> impl Future<Output = EntitleResult<bool>> + Send;

    /// Conditional atomic decrement, floor-clamped at zero. A clamped
    /// underflow is logged, never surfaced.
    fn release_seat(&self, license_id: Uuid) -> impl Future<Output = EntitleResult<()>> + Send;

    fn suspend(&self, license_id: Uuid) -> impl Future<Output = EntitleResult<License>> + Send;
    fn reactivate(&self, license_id: Uuid) -> impl Future<Output = EntitleResult<License>> + Send;

    /// Sweep: transition active licenses past their expiry to Expired.
    /// Returns the number transitioned.
    fn expire_overdue(&self) -> impl Future<Output = EntitleResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Access grants
// ---------------------------------------------------------------------------

/// Outcome of the transactional grant write. Conditions re-asserted
/// inside the transaction come back as outcomes, not errors.
#[derive(Debug)]
pub enum GrantWrite {
    Created(Grant),
    /// An active grant already existed for the triple.
    Duplicate,
    /// The conditional seat claim failed (license full, or no longer
    /// active).
    SeatUnavailable,
}

/// Outcome of the transactional revoke write.
#[derive(Debug)]
pub enum RevokeWrite {
    /// Deactivated, and the seat released.
    Revoked(Grant),
    /// The grant was already inactive; no seat was released.
    AlreadyInactive(Grant),
    /// No grant row exists at all for the triple.
    NotFound,
}

pub trait GrantRepository: Send + Sync {
    /// The authoritative access check: the active, unexpired grant or
    /// `None`.
    fn find_active(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        application_id: Uuid,
    ) -> impl Future<Output = EntitleResult<Option<Grant>>> + Send;

    /// The most recent grant row for the triple regardless of status.
    fn get(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        application_id: Uuid,
    ) -> impl Future<Output = EntitleResult<Option<Grant>>> + Send;

    /// One transaction: re-assert no active duplicate, claim a seat on
    /// the parent license (conditional increment), create the grant
    /// row. Partial grants are not observable under concurrency.
    fn create_active(
        &self,
        input: CreateGrant,
    ) -> impl Future<Output = EntitleResult<GrantWrite>> + Send;

    /// One transaction: deactivate the active grant and release its
    /// seat. Idempotent — a second revoke never double-releases.
    fn revoke(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        application_id: Uuid,
        revoked_by: Uuid,
    ) -> impl Future<Output = EntitleResult<RevokeWrite>> + Send;

    /// Sweep: deactivate active grants past their expiry, releasing
    /// one seat per grant. Returns the number deactivated.
    fn deactivate_expired(&self) -> impl Future<Output = EntitleResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Outcome of scheduling a pricing entry.
#[derive(Debug)]
pub enum PricingWrite {
    Created(PricingEntry),
    /// The window overlaps an existing entry for the same
    /// (application, user type) pair.
    Overlap,
}

pub trait PricingRepository: Send + Sync {
    /// The entry whose validity window contains `at`, or `None`.
    fn current(
        &self,
        application_id: Uuid,
        user_type: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = EntitleResult<Option<PricingEntry>>> + Send;

    /// Insert an entry; the overlap check runs inside the same
    /// transaction as the insert.
    fn create(
        &self,
        input: CreatePricingEntry,
    ) -> impl Future<Output = EntitleResult<PricingWrite>> + Send;

    /// Full price history for the pair, newest window first.
    fn history(
        &self,
        application_id: Uuid,
        user_type: &str,
    ) -> impl Future<Output = EntitleResult<Vec<PricingEntry>>> + Send;
}

// ---------------------------------------------------------------------------
// Access log (append-only)
// ---------------------------------------------------------------------------

/// Query filters for access log entries.
#[derive(Debug, Clone, Default)]
pub struct AccessLogFilter {
    pub actor_id: Option<Uuid>,
    pub application_id: Option<Uuid>,
    pub decision: Option<Decision>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub trait AccessLogRepository: Send + Sync {
    /// Append a new entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAccessLogEntry,
    ) -> impl Future<Output = EntitleResult<AccessLogEntry>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        filter: AccessLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = EntitleResult<PaginatedResult<AccessLogEntry>>> + Send;
}
