// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use anyhow::{Error, Result};
use fs2::FileExt;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides the configured API base URL.
pub const API_URL_ENV: &str = "DIARIO_API_URL";
/// Environment variable that overrides the configured log level.
pub const LOG_LEVEL_ENV: &str = "DIARIO_LOG";

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_status_timeout() -> u64 {
    3
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_status_timeout")]
    pub status_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            log_level: default_log_level(),
            status_timeout_secs: default_status_timeout(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults.
    /// Syntax and permission problems are still reported.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(cfg) => Ok(cfg),
            Err(e) if Self::is_missing_config_error(&e) => {
                log::debug!("No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Detects whether an error means the config file does not exist, either
    /// through our explicit message or an io NotFound anywhere in the chain.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            atomic_write(&path, toml_str)?;
            Ok(())
        })
    }

    pub fn get_path_string(ctx: &dyn AppContext) -> Result<String> {
        let path = ctx.get_config_file_path()?;
        Ok(path.to_string_lossy().to_string())
    }

    /// Base URL of the journal API.
    /// Precedence: command line, then `DIARIO_API_URL`, then the config file.
    pub fn resolve_api_url(&self, cli_override: Option<&str>) -> String {
        let raw = cli_override
            .map(str::to_string)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                std::env::var(API_URL_ENV)
                    .ok()
                    .filter(|s| !s.trim().is_empty())
            })
            .unwrap_or_else(|| self.api_url.clone());
        raw.trim().trim_end_matches('/').to_string()
    }

    /// Log level from `DIARIO_LOG` or the config, falling back to `Info`.
    pub fn log_level_filter(&self) -> LevelFilter {
        let raw = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| self.log_level.clone());
        raw.trim().parse().unwrap_or(LevelFilter::Info)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs.max(1))
    }
}

fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let lock_path = file_path.with_extension("lock");
    let file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)?;

    file.lock_exclusive()?;
    let result = f();
    file.unlock()?;
    result
}

/// Atomic write: Write to .tmp file then rename
fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
    let path = path.as_ref();
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;
    use serial_test::serial;

    #[test]
    fn test_missing_file_is_detected() {
        let ctx = TestContext::new();
        let err = Config::load(&ctx).unwrap_err();
        assert!(Config::is_missing_config_error(&err));
        assert_eq!(Config::load_or_default(&ctx).unwrap(), Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let ctx = TestContext::new();
        let cfg = Config {
            api_url: "https://journal.example.com/api".to_string(),
            log_level: "debug".to_string(),
            status_timeout_secs: 5,
        };
        cfg.save(&ctx).unwrap();
        assert_eq!(Config::load(&ctx).unwrap(), cfg);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let ctx = TestContext::new();
        let path = ctx.get_config_file_path().unwrap();
        fs::write(&path, "log_level = \"warn\"\n").unwrap();
        let cfg = Config::load(&ctx).unwrap();
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.log_level, "warn");
        assert_eq!(cfg.status_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_syntax_error_is_not_missing() {
        let ctx = TestContext::new();
        let path = ctx.get_config_file_path().unwrap();
        fs::write(&path, "api_url = [unterminated").unwrap();
        let err = Config::load_or_default(&ctx).unwrap_err();
        assert!(!Config::is_missing_config_error(&err));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    #[serial]
    fn test_api_url_precedence() {
        let cfg = Config {
            api_url: "http://from-config/api/".to_string(),
            ..Config::default()
        };

        unsafe {
            std::env::remove_var(API_URL_ENV);
        }
        assert_eq!(cfg.resolve_api_url(None), "http://from-config/api");

        unsafe {
            std::env::set_var(API_URL_ENV, "http://from-env/api");
        }
        assert_eq!(cfg.resolve_api_url(None), "http://from-env/api");
        assert_eq!(
            cfg.resolve_api_url(Some("http://from-cli/api")),
            "http://from-cli/api"
        );
        assert_eq!(cfg.resolve_api_url(Some("  ")), "http://from-env/api");

        unsafe {
            std::env::remove_var(API_URL_ENV);
        }
    }

    #[test]
    #[serial]
    fn test_log_level_parsing() {
        unsafe {
            std::env::remove_var(LOG_LEVEL_ENV);
        }
        let mut cfg = Config::default();
        assert_eq!(cfg.log_level_filter(), LevelFilter::Info);
        cfg.log_level = "DEBUG".to_string();
        assert_eq!(cfg.log_level_filter(), LevelFilter::Debug);
        cfg.log_level = "nonsense".to_string();
        assert_eq!(cfg.log_level_filter(), LevelFilter::Info);

        unsafe {
            std::env::set_var(LOG_LEVEL_ENV, "trace");
        }
        assert_eq!(cfg.log_level_filter(), LevelFilter::Trace);
        unsafe {
            std::env::remove_var(LOG_LEVEL_ENV);
        }
    }
}
