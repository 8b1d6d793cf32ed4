//! Verified principal — the authenticated actor for one request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::TenantRole;

/// Platform role granting a distinct superuser scope.
pub const PLATFORM_ADMIN: &str = "internal_admin";

/// The verified identity and claims derived from an inbound credential,
/// combined with the user's current record. Stateless — lives only for
/// the request's duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    /// Tenant-level role, from the *current* user record (not the
    /// token claim, which may be stale).
    pub role: TenantRole,
    pub platform_role: Option<String>,
    /// Pricing category, from the current user record.
    pub user_type: String,
    /// Precomputed allowed-application slugs embedded in the token —
    /// a time-bounded, possibly-stale fast path. The grant store is
    /// ground truth.
    pub allowed_apps: Vec<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Principal {
    pub fn is_platform_admin(&self) -> bool {
        self.platform_role.as_deref() == Some(PLATFORM_ADMIN)
    }
}
