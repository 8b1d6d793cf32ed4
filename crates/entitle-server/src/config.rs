//! Server configuration, overridable from the environment.

use entitle_db::DbConfig;

/// Runtime configuration for the server binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db: DbConfig,
    /// Seconds between entitlement expiry sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db: DbConfig::default(),
            sweep_interval_secs: 300,
        }
    }
}

impl ServerConfig {
    /// Build from `ENTITLE_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("ENTITLE_DB_URL") {
            config.db.url = url;
        }
        if let Ok(namespace) = std::env::var("ENTITLE_DB_NAMESPACE") {
            config.db.namespace = namespace;
        }
        if let Ok(database) = std::env::var("ENTITLE_DB_DATABASE") {
            config.db.database = database;
        }
        if let Ok(username) = std::env::var("ENTITLE_DB_USER") {
            config.db.username = username;
        }
        if let Ok(password) = std::env::var("ENTITLE_DB_PASS") {
            config.db.password = password;
        }
        if let Some(secs) = std::env::var("ENTITLE_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.sweep_interval_secs = secs;
        }

        config
    }
}
