//! Access decision log domain model (append-only).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Decision {
    Granted,
    Denied,
}

/// One immutable audit record per authorization attempt, granted or
/// denied. No update or delete operations exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub id: Uuid,
    /// `None` when the request carried no verifiable principal.
    pub actor_id: Option<Uuid>,
    /// `None` when the request carried no tenant context.
    pub tenant_id: Option<Uuid>,
    /// `None` when the target application slug did not resolve.
    pub application_id: Option<Uuid>,
    pub decision: Decision,
    /// Stable denial reason code; `None` when granted.
    pub reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccessLogEntry {
    pub actor_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub application_id: Option<Uuid>,
    pub decision: Decision,
    pub reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
