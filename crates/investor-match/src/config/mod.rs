use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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
    pub analysis: AnalysisConfig,
    pub security: SecurityConfig,
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

        let defaults = AnalysisConfig::default();
        let batch_size = read_number("ANALYSIS_BATCH_SIZE", defaults.batch_size as u64)? as usize;
        if batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        let delay_ms = read_number(
            "ANALYSIS_BATCH_DELAY_MS",
            defaults.batch_delay.as_millis() as u64,
        )?;
        let insert_chunk =
            read_number("ANALYSIS_INSERT_CHUNK", defaults.insert_chunk as u64)?.max(1) as usize;
        let job_name = env::var("ANALYSIS_JOB_NAME")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.job_name);

        let cron_secret = env::var("CRON_SECRET")
            .ok()
            .filter(|value| !value.trim().is_empty());
        if environment == AppEnvironment::Production && cron_secret.is_none() {
            return Err(ConfigError::MissingCronSecret);
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            analysis: AnalysisConfig {
                batch_size,
                batch_delay: Duration::from_millis(delay_ms),
                insert_chunk,
                job_name,
            },
            security: SecurityConfig { cron_secret },
        })
    }
}

fn read_number(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidSetting { key, value: raw }),
        Err(_) => Ok(default),
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

/// Paging and pacing for the investor analysis sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Investors fetched and ranked together as one page.
    pub batch_size: usize,
    /// Pause between pages to keep load on the store bounded.
    pub batch_delay: Duration,
    /// Maximum rows per analysis insert call.
    pub insert_chunk: usize,
    /// Key of the progress row shared by successive sweep invocations.
    pub job_name: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay: Duration::from_millis(500),
            insert_chunk: 100,
            job_name: "investor_analysis".to_string(),
        }
    }
}

/// Shared secret guarding the analysis triggers. `None` leaves them open.
#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    pub cron_secret: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSetting { key: &'static str, value: String },
    ZeroBatchSize,
    MissingCronSecret,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSetting { key, value } => {
                write!(f, "{key} must be a non-negative integer (got '{value}')")
            }
            ConfigError::ZeroBatchSize => write!(f, "ANALYSIS_BATCH_SIZE must be at least 1"),
            ConfigError::MissingCronSecret => {
                write!(f, "CRON_SECRET must be set when APP_ENV is production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidSetting { .. }
            | ConfigError::ZeroBatchSize
            | ConfigError::MissingCronSecret => None,
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
            "ANALYSIS_BATCH_SIZE",
            "ANALYSIS_BATCH_DELAY_MS",
            "ANALYSIS_INSERT_CHUNK",
            "ANALYSIS_JOB_NAME",
            "CRON_SECRET",
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
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert!(config.security.cron_secret.is_none());
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
    fn reads_analysis_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ANALYSIS_BATCH_SIZE", "25");
        env::set_var("ANALYSIS_BATCH_DELAY_MS", "0");
        env::set_var("ANALYSIS_JOB_NAME", "nightly");
        env::set_var("CRON_SECRET", "s3cret");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.analysis.batch_size, 25);
        assert_eq!(config.analysis.batch_delay, Duration::ZERO);
        assert_eq!(config.analysis.job_name, "nightly");
        assert_eq!(config.security.cron_secret.as_deref(), Some("s3cret"));
        reset_env();
    }

    #[test]
    fn rejects_zero_and_garbage_batch_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ANALYSIS_BATCH_SIZE", "0");
        assert!(matches!(AppConfig::load(), Err(ConfigError::ZeroBatchSize)));

        env::set_var("ANALYSIS_BATCH_SIZE", "ten");
        match AppConfig::load() {
            Err(ConfigError::InvalidSetting { key, value }) => {
                assert_eq!(key, "ANALYSIS_BATCH_SIZE");
                assert_eq!(value, "ten");
            }
            other => panic!("expected invalid setting, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn production_requires_cron_secret() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::MissingCronSecret)
        ));

        env::set_var("CRON_SECRET", "token");
        let config = AppConfig::load().expect("config loads with secret");
        assert_eq!(config.environment, AppEnvironment::Production);
        reset_env();
    }
}
