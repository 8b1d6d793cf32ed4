//! Tenant application license domain model.
//!
//! A license is a tenant's entitlement to one application: status,
//! validity window, and seat accounting. Licenses are never
//! hard-deleted — they only transition status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LicenseStatus {
    Active,
    Expired,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub application_id: Uuid,
    pub status: LicenseStatus,
    pub activated_at: DateTime<Utc>,
    /// `None` means the license never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` means unlimited seats.
    pub seat_limit: Option<u32>,
    /// Seats currently consumed by active grants. Maintained by
    /// conditional datastore updates, never by read-modify-write.
    pub seats_used: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl License {
    /// A license is usable iff it is active and its expiry, if any,
    /// lies in the future.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == LicenseStatus::Active && self.expires_at.is_none_or(|exp| exp > now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLicense {
    pub tenant_id: Uuid,
    pub application_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub seat_limit: Option<u32>,
}

/// Seat headroom for a capped license.
///
/// Only produced for licenses with a finite seat limit; an uncapped
/// license has no availability concept.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeatAvailability {
    pub seat_limit: u32,
    pub seats_used: u32,
}

impl SeatAvailability {
    /// Remaining seats. Zero or negative both mean "no availability";
    /// negative occurs only if stored data is corrupted.
    pub fn available(&self) -> i64 {
        i64::from(self.seat_limit) - i64::from(self.seats_used)
    }
}
