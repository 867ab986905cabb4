//! Server configuration from environment.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub locations_file: String,
    pub drivers_file: String,
    /// Lifetime of a driver session after login.
    pub session_ttl_secs: u64,
    pub secure_cookies: bool,
    /// Where `/logout` sends the browser.
    pub driver_page: String,
    pub login_rate_limit_rps: u32,
    pub rate_limit_enabled: bool,
    pub trust_proxy: bool,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_address: env::var("BUSLINE_BIND").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("BUSLINE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5000),
            data_dir: env::var("BUSLINE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            locations_file: env::var("BUSLINE_LOCATIONS_FILE")
                .unwrap_or_else(|_| "locations.json".to_string()),
            drivers_file: env::var("BUSLINE_DRIVERS_FILE")
                .unwrap_or_else(|_| "drivers.json".to_string()),
            session_ttl_secs: env::var("BUSLINE_SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(12 * 60 * 60),
            secure_cookies: env_flag("BUSLINE_SECURE_COOKIES", false),
            driver_page: env::var("BUSLINE_DRIVER_PAGE").unwrap_or_else(|_| "/driver".to_string()),
            login_rate_limit_rps: env::var("BUSLINE_LOGIN_RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            rate_limit_enabled: env_flag("BUSLINE_RATE_LIMIT_ENABLED", true),
            trust_proxy: env_flag("BUSLINE_TRUST_PROXY", false),
            log_json: env_flag("BUSLINE_LOG_JSON", false),
        }
    }

    /// Absolute or data-dir-relative path of the positions snapshot.
    pub fn locations_path(&self) -> PathBuf {
        self.data_dir.join(&self.locations_file)
    }

    pub fn drivers_path(&self) -> PathBuf {
        self.data_dir.join(&self.drivers_file)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        let secs = i64::try_from(self.session_ttl_secs).unwrap_or(i64::MAX);
        chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
