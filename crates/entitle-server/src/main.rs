//! Entitle Server — application entry point.
//!
//! Connects to the datastore, applies migrations, and runs the
//! entitlement expiry sweeps on a fixed interval. The authorization
//! engine itself is a library consumed by the API layer per request.

mod config;

use std::time::Duration;

use entitle_core::repository::{GrantRepository, LicenseRepository};
use entitle_db::repository::{SurrealGrantRepository, SurrealLicenseRepository};
use entitle_db::{DbManager, run_migrations};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("entitle=info".parse().unwrap()),
        )
        .json()
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "Entitle server terminated");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();

    let db = DbManager::connect(&config.db).await?;
    run_migrations(db.client()).await?;

    let licenses = SurrealLicenseRepository::new(db.client().clone());
    let grants = SurrealGrantRepository::new(db.client().clone());

    info!(
        sweep_interval_secs = config.sweep_interval_secs,
        "Entitle server started"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(config.sweep_interval_secs));
    loop {
        ticker.tick().await;

        match licenses.expire_overdue().await {
            Ok(expired) if expired > 0 => {
                info!(expired, "license expiry sweep transitioned licenses");
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "license expiry sweep failed"),
        }

        match grants.deactivate_expired().await {
            Ok(deactivated) if deactivated > 0 => {
                info!(deactivated, "grant expiry sweep released seats");
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "grant expiry sweep failed"),
        }
    }
}
