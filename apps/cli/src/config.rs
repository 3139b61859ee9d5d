use std::path::PathBuf;
use std::time::Duration;

use kover_core::constants::DEFAULT_INIT_TIMEOUT;

/// Runtime configuration read from the environment.
///
/// The remote endpoint is optional: unless `KOVER_REMOTE_URL`,
/// `KOVER_REMOTE_API_KEY` and `KOVER_ADMIN_EMAIL` are all set, the engine
/// runs offline-only on cached or bundled prices.
pub struct Config {
    pub data_dir: PathBuf,
    pub remote: Option<RemoteConfig>,
    pub init_timeout: Duration,
}

pub struct RemoteConfig {
    pub url: String,
    pub api_key: String,
    pub admin_email: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let data_dir = std::env::var("KOVER_DATA_DIR")
            .unwrap_or_else(|_| "./data".into())
            .into();
        let remote = match (
            std::env::var("KOVER_REMOTE_URL"),
            std::env::var("KOVER_REMOTE_API_KEY"),
            std::env::var("KOVER_ADMIN_EMAIL"),
        ) {
            (Ok(url), Ok(api_key), Ok(admin_email)) => Some(RemoteConfig {
                url,
                api_key,
                admin_email,
            }),
            _ => None,
        };
        let init_timeout = std::env::var("KOVER_INIT_TIMEOUT_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_INIT_TIMEOUT);
        Self {
            data_dir,
            remote,
            init_timeout,
        }
    }
}
