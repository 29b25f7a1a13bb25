use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use crate::types::Config;

pub const DEFAULT_HEALTH_REGION: &str = "us-east-1";
pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://169.254.169.254/latest/meta-data/";
pub const DEFAULT_METADATA_TIMEOUT_MS: u64 = 1000;

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Clone, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Per-user home directory, `HOME` first and `USERPROFILE` on Windows.
pub fn home_dir<E: EnvironmentProvider>(env: &E) -> Option<PathBuf> {
    env.get_var("HOME")
        .or_else(|| env.get_var("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let health_region = env.get_var("HEALTH_REGION")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_HEALTH_REGION.to_string());

    let lookback_days: i64 = env.get_var("LOOKBACK_DAYS")
        .unwrap_or_else(|| DEFAULT_LOOKBACK_DAYS.to_string())
        .trim()
        .parse()
        .context("Invalid LOOKBACK_DAYS")?;
    if lookback_days <= 0 {
        return Err(anyhow!("LOOKBACK_DAYS must be a positive number of days"));
    }

    let metadata_endpoint = env.get_var("METADATA_ENDPOINT")
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_METADATA_ENDPOINT.to_string());

    let metadata_timeout_ms: u64 = env.get_var("METADATA_TIMEOUT_MS")
        .unwrap_or_else(|| DEFAULT_METADATA_TIMEOUT_MS.to_string())
        .parse()
        .unwrap_or(DEFAULT_METADATA_TIMEOUT_MS);

    let env_file = env.get_var("ENV_FILE")
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".env"));

    Ok(Config {
        health_region,
        lookback_days,
        metadata_endpoint,
        metadata_timeout: Duration::from_millis(metadata_timeout_ms),
        env_file,
        home_dir: home_dir(env),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_loading_with_env() {
        let env = MockEnvironment::new()
            .with_var("HEALTH_REGION", "us-east-2")
            .with_var("LOOKBACK_DAYS", "30")
            .with_var("METADATA_ENDPOINT", "http://127.0.0.1:9999/")
            .with_var("METADATA_TIMEOUT_MS", "250")
            .with_var("ENV_FILE", "/tmp/creds.env")
            .with_var("HOME", "/home/tester");

        let config = load_config_with_env(&env).unwrap();

        assert_eq!(config.health_region, "us-east-2");
        assert_eq!(config.lookback_days, 30);
        assert_eq!(config.metadata_endpoint, "http://127.0.0.1:9999/");
        assert_eq!(config.metadata_timeout, Duration::from_millis(250));
        assert_eq!(config.env_file, PathBuf::from("/tmp/creds.env"));
        assert_eq!(config.home_dir, Some(PathBuf::from("/home/tester")));
    }

    #[test]
    fn test_config_loading_defaults() {
        let config = load_config_with_env(&MockEnvironment::new()).unwrap();

        assert_eq!(config.health_region, "us-east-1");
        assert_eq!(config.lookback_days, 90);
        assert_eq!(config.metadata_endpoint, DEFAULT_METADATA_ENDPOINT);
        assert_eq!(config.metadata_timeout, Duration::from_secs(1));
        assert_eq!(config.env_file, PathBuf::from(".env"));
        assert_eq!(config.home_dir, None);
    }

    #[test]
    fn test_config_loading_invalid_lookback() {
        let env = MockEnvironment::new().with_var("LOOKBACK_DAYS", "ninety");
        let result = load_config_with_env(&env);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("LOOKBACK_DAYS"));

        let env = MockEnvironment::new().with_var("LOOKBACK_DAYS", "0");
        let result = load_config_with_env(&env);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("LOOKBACK_DAYS"));
    }

    #[test]
    fn test_invalid_timeout_falls_back_to_default() {
        let env = MockEnvironment::new().with_var("METADATA_TIMEOUT_MS", "soon");
        let config = load_config_with_env(&env).unwrap();
        assert_eq!(config.metadata_timeout, Duration::from_millis(DEFAULT_METADATA_TIMEOUT_MS));
    }

    #[test]
    fn test_home_dir_resolution() {
        let env = MockEnvironment::new().with_var("USERPROFILE", "C:\\Users\\tester");
        assert_eq!(home_dir(&env), Some(PathBuf::from("C:\\Users\\tester")));

        let env = MockEnvironment::new()
            .with_var("HOME", "/home/tester")
            .with_var("USERPROFILE", "C:\\Users\\tester");
        assert_eq!(home_dir(&env), Some(PathBuf::from("/home/tester")));

        let env = MockEnvironment::new().with_var("HOME", "");
        assert_eq!(home_dir(&env), None);
    }

    #[test]
    fn test_blank_region_uses_default() {
        let env = MockEnvironment::new().with_var("HEALTH_REGION", "  ");
        let config = load_config_with_env(&env).unwrap();
        assert_eq!(config.health_region, DEFAULT_HEALTH_REGION);
    }
}
