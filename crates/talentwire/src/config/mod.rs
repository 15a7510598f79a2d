use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration as StdDuration;

use chrono::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub notifications: NotificationConfig,
    pub verification: VerificationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let batch_size = positive_env("APP_BATCH_SIZE", 3)? as u32;
        let recency_window_minutes = positive_env("APP_RECENCY_WINDOW_MINUTES", 10)? as i64;
        let max_concurrent_sends = positive_env("APP_MAX_CONCURRENT_SENDS", 8)? as usize;
        let send_timeout_secs = positive_env("APP_SEND_TIMEOUT_SECS", 10)?;
        let code_ttl_minutes = positive_env("APP_CODE_TTL_MINUTES", 10)? as i64;
        let max_code_attempts = positive_env("APP_MAX_CODE_ATTEMPTS", 3)? as u8;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            notifications: NotificationConfig {
                batch_size,
                recency_window_minutes,
                max_concurrent_sends,
                send_timeout_secs,
            },
            verification: VerificationConfig {
                code_ttl_minutes,
                max_code_attempts,
            },
        })
    }
}

fn positive_env(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidSetting { key })?,
        Err(_) => default,
    };

    if value == 0 {
        return Err(ConfigError::InvalidSetting { key });
    }
    Ok(value)
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Tunables for the candidate notification cycle.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub batch_size: u32,
    pub recency_window_minutes: i64,
    pub max_concurrent_sends: usize,
    pub send_timeout_secs: u64,
}

impl NotificationConfig {
    pub fn recency_window(&self) -> Duration {
        Duration::minutes(self.recency_window_minutes)
    }

    pub fn send_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.send_timeout_secs)
    }
}

/// Lifetime and attempt budget for mailbox verification codes.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    pub code_ttl_minutes: i64,
    pub max_code_attempts: u8,
}

impl VerificationConfig {
    pub fn code_ttl(&self) -> Duration {
        Duration::minutes(self.code_ttl_minutes)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSetting { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSetting { key } => {
                write!(f, "{key} must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidSetting { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_BATCH_SIZE",
            "APP_RECENCY_WINDOW_MINUTES",
            "APP_MAX_CONCURRENT_SENDS",
            "APP_SEND_TIMEOUT_SECS",
            "APP_CODE_TTL_MINUTES",
            "APP_MAX_CODE_ATTEMPTS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.notifications.batch_size, 3);
        assert_eq!(config.notifications.recency_window(), Duration::minutes(10));
        assert_eq!(config.notifications.max_concurrent_sends, 8);
        assert_eq!(config.verification.code_ttl(), Duration::minutes(10));
        assert_eq!(config.verification.max_code_attempts, 3);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_BATCH_SIZE", "0");
        match AppConfig::load() {
            Err(ConfigError::InvalidSetting {
                key: "APP_BATCH_SIZE",
            }) => {}
            other => panic!("expected invalid setting, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_numeric_window() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_RECENCY_WINDOW_MINUTES", "soon");
        assert!(AppConfig::load().is_err());
    }
}
