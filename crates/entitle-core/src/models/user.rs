//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant-level role. Role-in-application on a grant is free-form and
/// defaults from this.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TenantRole {
    Operations,
    Manager,
    Admin,
}

impl TenantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operations => "operations",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "operations" => Some(Self::Operations),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: TenantRole,
    /// Platform-level role (e.g. `internal_admin`) — a distinct
    /// superuser scope, unrelated to any tenant role.
    pub platform_role: Option<String>,
    /// Pricing category slug. Defaults from the tenant role.
    pub user_type: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub tenant_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: TenantRole,
    pub platform_role: Option<String>,
    /// Defaults to the tenant role's slug when absent.
    pub user_type: Option<String>,
}

/// Fields that can be updated on an existing user.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub role: Option<TenantRole>,
    pub user_type: Option<String>,
    pub status: Option<UserStatus>,
}
