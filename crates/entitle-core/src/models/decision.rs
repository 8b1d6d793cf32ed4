//! Decision context — the result of a successful authorization pass,
//! attached to the request for downstream handlers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::license::License;

/// Which tier confirmed the user's access.
///
/// `Token` is the time-bounded fast path (allowed-apps list embedded in
/// the credential); `Database` is the authoritative grant-store lookup.
/// Staleness is always attributable, never silently assumed correct.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccessSource {
    Token,
    Database,
}

impl AccessSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Database => "database",
        }
    }
}

/// Request metadata captured for the audit trail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Attached to the request after a full pipeline pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionContext {
    pub application_id: Uuid,
    pub application_name: String,
    /// Effective role-in-application used for the role layer.
    pub role: String,
    /// License state as seen at decision time. `None` only for
    /// platform-admin bypass, which is not gated on licensing.
    pub license: Option<License>,
    pub source: AccessSource,
}
