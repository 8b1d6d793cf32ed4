//! User application access grant domain model.
//!
//! A grant is one user's activated access to one application within
//! their tenant. At most one *active* grant exists per (user, tenant,
//! application) triple. Grants are deactivated on revoke, never
//! hard-deleted, preserving the audit trail and historical pricing.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pricing::BillingCycle;

/// The price frozen onto a grant at creation time.
///
/// Immune to later pricing changes; historical billing is never
/// ambiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub price: BigDecimal,
    /// ISO 4217 currency code.
    pub currency: String,
    pub billing_cycle: BillingCycle,
    /// The grantee's pricing category at grant time.
    pub user_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub application_id: Uuid,
    /// The license whose seat this grant consumes while active.
    pub license_id: Uuid,
    pub active: bool,
    /// Role within the application. Free-form; defaults from the
    /// grantee's tenant role.
    pub app_role: String,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_by: Option<Uuid>,
    pub pricing: PricingSnapshot,
}

impl Grant {
    /// Active and not past its expiry, if any.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.is_none_or(|exp| exp > now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGrant {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub application_id: Uuid,
    pub license_id: Uuid,
    pub app_role: String,
    pub granted_by: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub pricing: PricingSnapshot,
}
