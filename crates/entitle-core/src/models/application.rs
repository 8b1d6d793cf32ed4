//! Application domain model.
//!
//! An application is a licensable product module (e.g., the
//! transcription/quoting app). Tenants license applications; users
//! receive per-application access grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    /// URL-safe unique identifier (e.g., `tq`).
    pub slug: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplication {
    pub slug: String,
    pub name: String,
    pub description: String,
}
