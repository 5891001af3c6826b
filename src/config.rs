use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::time::Duration;
use stock_analyzer::services::{CacheConfig, YahooConfig, DEFAULT_BASE_URL, DEFAULT_CACHE_CAPACITY};
use stock_analyzer::utils::date::{default_start_date, parse_date};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    InvalidTimezone(String),
    InvalidDate(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config file: {}", e),
            ConfigError::Yaml(e) => write!(f, "failed to parse YAML config: {}", e),
            ConfigError::InvalidTimezone(tz) => write!(f, "unknown market timezone '{}'", tz),
            ConfigError::InvalidDate(date) => write!(f, "invalid default start date '{}'", date),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::Io(error)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(error: serde_yaml::Error) -> Self {
        ConfigError::Yaml(error)
    }
}

// Inbound request limiting per client IP
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub replenish_secs: u64,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            replenish_secs: 1,
            burst: 20,
        }
    }
}

// YAML-serializable configuration structure. Only service_name, environment and port are required.
#[derive(Serialize, Deserialize, Debug)]
pub struct ConfigYaml {
    pub service_name: String,
    pub environment: String,
    pub port: u16,
    pub provider_base_url: Option<String>,
    pub provider_timeout_secs: Option<u64>,
    pub provider_rate_limit_per_minute: Option<u32>,
    pub cache_capacity: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
    pub market_timezone: Option<String>,
    pub rate_limit: Option<RateLimitConfig>,
    pub default_symbol: Option<String>,
    pub default_start_date: Option<String>,
}

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub port: u16,
    pub provider_base_url: String,
    pub provider_timeout: Duration,
    pub provider_rate_limit_per_minute: u32,
    pub cache_capacity: usize,
    pub cache_ttl: Option<Duration>,
    pub market_timezone: Tz,
    pub rate_limit: RateLimitConfig,
    pub default_symbol: String,
    pub default_start_date: NaiveDate,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "stock-analyzer-server".to_string(),
            environment: "development".to_string(),
            port: 8888,
            provider_base_url: DEFAULT_BASE_URL.to_string(),
            provider_timeout: Duration::from_secs(30),
            provider_rate_limit_per_minute: 60,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: None,
            market_timezone: chrono_tz::America::New_York,
            rate_limit: RateLimitConfig::default(),
            default_symbol: stock_analyzer::models::DEFAULT_SYMBOL.to_string(),
            default_start_date: default_start_date(),
        }
    }
}

fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.parse::<Tz>()
        .map_err(|_| ConfigError::InvalidTimezone(name.to_string()))
}

fn parse_start_date(text: &str) -> Result<NaiveDate, ConfigError> {
    parse_date(text).map_err(|_| ConfigError::InvalidDate(text.to_string()))
}

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Check for CONFIG_FILE environment variable first
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Self::from_env()
        }
    }

    // Load configuration from YAML file
    pub fn from_yaml(file_path: &str) -> Result<Self, ConfigError> {
        let yaml_content = fs::read_to_string(file_path)?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml_content: &str) -> Result<Self, ConfigError> {
        let yaml_config: ConfigYaml = serde_yaml::from_str(yaml_content)?;
        let defaults = Self::default();

        Ok(Self {
            service_name: yaml_config.service_name,
            environment: yaml_config.environment,
            port: yaml_config.port,
            provider_base_url: yaml_config.provider_base_url.unwrap_or(defaults.provider_base_url),
            provider_timeout: yaml_config
                .provider_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.provider_timeout),
            provider_rate_limit_per_minute: yaml_config
                .provider_rate_limit_per_minute
                .unwrap_or(defaults.provider_rate_limit_per_minute),
            cache_capacity: yaml_config.cache_capacity.unwrap_or(defaults.cache_capacity),
            cache_ttl: yaml_config.cache_ttl_secs.map(Duration::from_secs),
            market_timezone: match yaml_config.market_timezone {
                Some(name) => parse_timezone(&name)?,
                None => defaults.market_timezone,
            },
            rate_limit: yaml_config.rate_limit.unwrap_or_default(),
            default_symbol: yaml_config.default_symbol.unwrap_or(defaults.default_symbol),
            default_start_date: match yaml_config.default_start_date {
                Some(text) => parse_start_date(&text)?,
                None => defaults.default_start_date,
            },
        })
    }

    // Load all configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparsable numbers fall back to their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        let market_timezone = match lookup("MARKET_TIMEZONE") {
            Some(name) => parse_timezone(name.trim())?,
            None => defaults.market_timezone,
        };

        let default_start_date = match lookup("DEFAULT_START_DATE") {
            Some(text) => parse_start_date(&text)?,
            None => defaults.default_start_date,
        };

        let rate_limit = RateLimitConfig {
            enabled: lookup("RATE_LIMIT_ENABLED")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.rate_limit.enabled),
            replenish_secs: number("RATE_LIMIT_REPLENISH_SECS").unwrap_or(defaults.rate_limit.replenish_secs),
            burst: lookup("RATE_LIMIT_BURST")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.rate_limit.burst),
        };

        Ok(Self {
            service_name: lookup("SERVICE_NAME").unwrap_or(defaults.service_name),
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            port: lookup("PORT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.port),
            provider_base_url: lookup("PROVIDER_BASE_URL").unwrap_or(defaults.provider_base_url),
            provider_timeout: number("PROVIDER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.provider_timeout),
            provider_rate_limit_per_minute: lookup("PROVIDER_RATE_LIMIT_PER_MINUTE")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.provider_rate_limit_per_minute),
            cache_capacity: lookup("CACHE_CAPACITY")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.cache_capacity),
            cache_ttl: number("CACHE_TTL_SECS").map(Duration::from_secs),
            market_timezone,
            rate_limit,
            default_symbol: lookup("DEFAULT_SYMBOL").unwrap_or(defaults.default_symbol),
            default_start_date,
        })
    }

    pub fn yahoo_config(&self) -> YahooConfig {
        YahooConfig {
            base_url: self.provider_base_url.clone(),
            timeout: self.provider_timeout,
            rate_limit_per_minute: self.provider_rate_limit_per_minute,
            ..YahooConfig::default()
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            capacity: self.cache_capacity,
            ttl: self.cache_ttl,
        }
    }

    /// Today's date on the market's calendar
    pub fn market_today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.market_timezone).date_naive()
    }
}
