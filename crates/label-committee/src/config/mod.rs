use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::committee::VotingConfig;

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

/// Top-level configuration for the committee service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub voting: VotingConfig,
    pub outbox: OutboxConfig,
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

        let voting = load_voting()?;
        let outbox = load_outbox()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            voting,
            outbox,
        })
    }

    /// Warn about settings that are accepted but have no effect.
    ///
    /// Call after telemetry is initialised so the warning reaches a subscriber.
    pub fn warn_ignored_settings(&self) {
        if self.voting.unused_threshold_overridden() {
            tracing::warn!(
                majority_threshold = self.voting.majority_threshold,
                "VOTING_MAJORITY_THRESHOLD is recorded but tallies use plain count comparison"
            );
        }
    }
}

fn load_voting() -> Result<VotingConfig, ConfigError> {
    let defaults = VotingConfig::default();

    let config = VotingConfig {
        quorum_required: parse_var("VOTING_QUORUM_REQUIRED", defaults.quorum_required)?,
        majority_threshold: parse_var("VOTING_MAJORITY_THRESHOLD", defaults.majority_threshold)?,
        min_score_for_approval: parse_var(
            "VOTING_MIN_SCORE_FOR_APPROVAL",
            defaults.min_score_for_approval,
        )?,
    };
    config
        .validate()
        .map_err(|err| ConfigError::InvalidValue {
            key: err.env_key(),
            reason: err.to_string(),
        })?;

    Ok(config)
}

fn load_outbox() -> Result<OutboxConfig, ConfigError> {
    let defaults = OutboxConfig::default();
    let max_attempts = parse_var("OUTBOX_MAX_ATTEMPTS", defaults.max_attempts)?;
    if max_attempts == 0 {
        return Err(ConfigError::InvalidValue {
            key: "OUTBOX_MAX_ATTEMPTS",
            reason: "at least one delivery attempt is required".to_string(),
        });
    }
    let batch_size = parse_var("OUTBOX_BATCH_SIZE", defaults.batch_size)?;
    let poll_secs = parse_var(
        "OUTBOX_POLL_INTERVAL_SECS",
        defaults.poll_interval.as_secs(),
    )?;

    Ok(OutboxConfig {
        max_attempts,
        batch_size: batch_size.max(1),
        poll_interval: Duration::from_secs(poll_secs.max(1)),
    })
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
                key,
                reason: format!("could not parse '{raw}'"),
            })
        }
        _ => Ok(default),
    }
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Delivery policy for the notification outbox relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxConfig {
    pub max_attempts: u32,
    pub batch_size: usize,
    pub poll_interval: Duration,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            batch_size: 25,
            poll_interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { key, reason } => write!(f, "{key} is invalid: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidValue { .. } => None,
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
            "VOTING_QUORUM_REQUIRED",
            "VOTING_MAJORITY_THRESHOLD",
            "VOTING_MIN_SCORE_FOR_APPROVAL",
            "OUTBOX_MAX_ATTEMPTS",
            "OUTBOX_BATCH_SIZE",
            "OUTBOX_POLL_INTERVAL_SECS",
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
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.voting, VotingConfig::default());
        assert_eq!(config.outbox, OutboxConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_voting_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("VOTING_QUORUM_REQUIRED", "5");
        env::set_var("VOTING_MIN_SCORE_FOR_APPROVAL", "70");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.voting.quorum_required, 5);
        assert_eq!(config.voting.min_score_for_approval, 70);
        reset_env();
    }

    #[test]
    fn rejects_zero_quorum() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("VOTING_QUORUM_REQUIRED", "0");
        match AppConfig::load() {
            Err(ConfigError::InvalidValue { key, .. }) => {
                assert_eq!(key, "VOTING_QUORUM_REQUIRED")
            }
            other => panic!("expected invalid quorum, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn flags_custom_majority_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("VOTING_MAJORITY_THRESHOLD", "0.7");
        let config = AppConfig::load().expect("config loads");
        assert!(config.voting.unused_threshold_overridden());
        reset_env();
    }

    #[test]
    fn rejects_threshold_outside_unit_range() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("VOTING_MAJORITY_THRESHOLD", "1.5");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidValue {
                key: "VOTING_MAJORITY_THRESHOLD",
                ..
            })
        ));
        reset_env();
    }

    #[test]
    fn rejects_unparseable_outbox_attempts() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("OUTBOX_MAX_ATTEMPTS", "many");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidValue {
                key: "OUTBOX_MAX_ATTEMPTS",
                ..
            })
        ));
        reset_env();
    }
}
