//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. The access log is append-only
//! at the schema level (update/delete permissions NONE).

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (global scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD slug ON TABLE tenant TYPE string;
DEFINE FIELD status ON TABLE tenant TYPE string \
    ASSERT $value IN ['Active', 'Suspended'];
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_slug ON TABLE tenant COLUMNS slug UNIQUE;

-- =======================================================================
-- Users (tenant scope)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE user TYPE string;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['operations', 'manager', 'admin'];
DEFINE FIELD platform_role ON TABLE user TYPE option<string>;
DEFINE FIELD user_type ON TABLE user TYPE string;
DEFINE FIELD status ON TABLE user TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_tenant_username ON TABLE user \
    COLUMNS tenant_id, username UNIQUE;
DEFINE INDEX idx_user_tenant_email ON TABLE user \
    COLUMNS tenant_id, email UNIQUE;

-- =======================================================================
-- Applications (global scope)
-- =======================================================================
DEFINE TABLE application SCHEMAFULL;
DEFINE FIELD slug ON TABLE application TYPE string;
DEFINE FIELD name ON TABLE application TYPE string;
DEFINE FIELD description ON TABLE application TYPE string;
DEFINE FIELD created_at ON TABLE application TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE application TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_application_slug ON TABLE application \
    COLUMNS slug UNIQUE;

-- =======================================================================
-- Tenant application licenses
-- =======================================================================
DEFINE TABLE license SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE license TYPE string;
DEFINE FIELD application_id ON TABLE license TYPE string;
DEFINE FIELD status ON TABLE license TYPE string \
    ASSERT $value IN ['Active', 'Expired', 'Suspended'];
DEFINE FIELD activated_at ON TABLE license TYPE datetime;
DEFINE FIELD expires_at ON TABLE license TYPE option<datetime>;
DEFINE FIELD seat_limit ON TABLE license TYPE option<int>;
DEFINE FIELD seats_used ON TABLE license TYPE int DEFAULT 0 \
    ASSERT $value >= 0;
DEFINE FIELD created_at ON TABLE license TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE license TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_license_tenant_app ON TABLE license \
    COLUMNS tenant_id, application_id UNIQUE;

-- =======================================================================
-- Access grants (tenant scope, soft-deactivated)
-- =======================================================================
DEFINE TABLE access_grant SCHEMAFULL;
DEFINE FIELD user_id ON TABLE access_grant TYPE string;
DEFINE FIELD tenant_id ON TABLE access_grant TYPE string;
DEFINE FIELD application_id ON TABLE access_grant TYPE string;
DEFINE FIELD license_id ON TABLE access_grant TYPE string;
DEFINE FIELD active ON TABLE access_grant TYPE bool;
DEFINE FIELD app_role ON TABLE access_grant TYPE string;
DEFINE FIELD granted_by ON TABLE access_grant TYPE string;
DEFINE FIELD granted_at ON TABLE access_grant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD expires_at ON TABLE access_grant TYPE option<datetime>;
DEFINE FIELD revoked_at ON TABLE access_grant TYPE option<datetime>;
DEFINE FIELD revoked_by ON TABLE access_grant TYPE option<string>;
DEFINE FIELD price ON TABLE access_grant TYPE string;
DEFINE FIELD currency ON TABLE access_grant TYPE string;
DEFINE FIELD billing_cycle ON TABLE access_grant TYPE string \
    ASSERT $value IN ['monthly', 'quarterly', 'yearly'];
DEFINE FIELD user_type ON TABLE access_grant TYPE string;
DEFINE INDEX idx_grant_triple ON TABLE access_grant \
    COLUMNS tenant_id, user_id, application_id;
DEFINE INDEX idx_grant_license ON TABLE access_grant \
    COLUMNS license_id;

-- =======================================================================
-- Pricing entries (versioned by validity window)
-- =======================================================================
DEFINE TABLE pricing_entry SCHEMAFULL;
DEFINE FIELD application_id ON TABLE pricing_entry TYPE string;
DEFINE FIELD user_type ON TABLE pricing_entry TYPE string;
DEFINE FIELD price ON TABLE pricing_entry TYPE string;
DEFINE FIELD currency ON TABLE pricing_entry TYPE string;
DEFINE FIELD billing_cycle ON TABLE pricing_entry TYPE string \
    ASSERT $value IN ['monthly', 'quarterly', 'yearly'];
DEFINE FIELD valid_from ON TABLE pricing_entry TYPE datetime;
DEFINE FIELD valid_to ON TABLE pricing_entry TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE pricing_entry TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_pricing_pair ON TABLE pricing_entry \
    COLUMNS application_id, user_type, valid_from;

-- =======================================================================
-- Access log (append-only)
-- =======================================================================
DEFINE TABLE access_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD actor_id ON TABLE access_log TYPE option<string>;
DEFINE FIELD tenant_id ON TABLE access_log TYPE option<string>;
DEFINE FIELD application_id ON TABLE access_log TYPE option<string>;
DEFINE FIELD decision ON TABLE access_log TYPE string \
    ASSERT $value IN ['Granted', 'Denied'];
DEFINE FIELD reason ON TABLE access_log TYPE option<string>;
DEFINE FIELD ip_address ON TABLE access_log TYPE option<string>;
DEFINE FIELD user_agent ON TABLE access_log TYPE option<string>;
DEFINE FIELD timestamp ON TABLE access_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_access_log_tenant_time ON TABLE access_log \
    COLUMNS tenant_id, timestamp;
DEFINE INDEX idx_access_log_tenant_actor ON TABLE access_log \
    COLUMNS tenant_id, actor_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
