use dotenv::dotenv;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_ca_file: Option<String>,
    pub database_pool_size: usize,
    pub host: String,
    pub port: u16,
    pub trusted_proxy_ip: IpAddr,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub log_config: String,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        dotenv().ok();
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset and empty values fall
    /// back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Config {
            database_url,
            database_ca_file: var("DATABASE_CA_FILE"),
            database_pool_size: parse_or(var("DATABASE_POOL_SIZE"), "DATABASE_POOL_SIZE", 8)?,
            host: var("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(var("SERVER_PORT"), "SERVER_PORT", 8080)?,
            trusted_proxy_ip: parse_or(
                var("TRUSTED_PROXY_IP"),
                "TRUSTED_PROXY_IP",
                IpAddr::from([127, 0, 0, 1]),
            )?,
            rate_limit_per_second: positive_or(
                var("RATE_LIMIT_PER_SECOND"),
                "RATE_LIMIT_PER_SECOND",
                10,
            )?,
            rate_limit_burst: positive_or(var("RATE_LIMIT_BURST"), "RATE_LIMIT_BURST", 5)?,
            log_config: var("LOG_CONFIG").unwrap_or_else(|| "./log-config.yml".to_string()),
        })
    }

    /// Milliseconds between two replenished rate-limit tokens. Rates above
    /// 1000/s are clamped to one token per millisecond.
    pub fn replenish_interval_ms(&self) -> u64 {
        1000u64
            .checked_div(self.rate_limit_per_second)
            .unwrap_or(1000)
            .max(1)
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn positive_or<T: FromStr + Default + PartialEq>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    let raw = value.clone();
    match parse_or(value, key, default)? {
        zero if zero == T::default() => Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default(),
        }),
        parsed => Ok(parsed),
    }
}
