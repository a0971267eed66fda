//! Configuration loading for courierd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.courier/config.toml` (user)
//! 3. `/etc/courier/config.toml` (system)
//!
//! When no file exists the daemon runs with defaults. TLS material is
//! referenced by path; the private key must not be readable by group or
//! other users.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::call::CallPolicy;
use crate::greet::GreetSettings;
use crate::{CourierError, Result};

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:50051).
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Serve TLS when present, plaintext otherwise.
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            limits: LimitsConfig::default(),
            tls: None,
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:50051".to_string()
}

/// Resource limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum concurrent requests per connection (default: 100).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// Deadline in seconds for calls that carry none (default: 30, 0 disables).
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
            request_timeout_secs: default_timeout(),
        }
    }
}

fn default_max_concurrent() -> usize {
    100
}

fn default_timeout() -> u64 {
    30
}

impl LimitsConfig {
    /// Default call deadline, `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn call_policy(&self) -> CallPolicy {
        CallPolicy::new(self.request_timeout())
    }
}

/// Server TLS credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// PEM certificate chain.
    pub cert_path: PathBuf,
    /// PEM private key.
    pub key_path: PathBuf,
}

impl TlsConfig {
    /// Check that both files exist and the key is private.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.cert_path, &self.key_path] {
            if !path.is_file() {
                return Err(CourierError::Configuration(format!(
                    "TLS file not found: {path:?}"
                )));
            }
        }
        check_key_permissions(&self.key_path)
    }
}

/// Check that a private key file has secure permissions (0600 or 0400).
#[cfg(unix)]
fn check_key_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|e| {
        CourierError::Configuration(format!("Failed to stat key file {path:?}: {e}"))
    })?;

    let mode = metadata.permissions().mode();
    // Reject if group or other bits are set
    if mode & 0o077 != 0 {
        return Err(CourierError::Configuration(format!(
            "Key file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
            mode & 0o777
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn check_key_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Pacing of the greeting calls.
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Pause between `GreetStream` responses (default: 100).
    #[serde(default = "default_stream_interval")]
    pub stream_interval_ms: u64,
    /// Simulated work before `Sum` answers (default: 4000).
    #[serde(default = "default_sum_delay")]
    pub sum_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            stream_interval_ms: default_stream_interval(),
            sum_delay_ms: default_sum_delay(),
        }
    }
}

fn default_stream_interval() -> u64 {
    100
}

fn default_sum_delay() -> u64 {
    4000
}

impl From<&PacingConfig> for GreetSettings {
    fn from(pacing: &PacingConfig) -> Self {
        GreetSettings {
            stream_interval: Duration::from_millis(pacing.stream_interval_ms),
            sum_delay: Duration::from_millis(pacing.sum_delay_ms),
            ..GreetSettings::default()
        }
    }
}

/// Backing storage.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded images (default: data/blobs).
    #[serde(default = "default_blob_root")]
    pub blob_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            blob_root: default_blob_root(),
        }
    }
}

fn default_blob_root() -> PathBuf {
    PathBuf::from("data/blobs")
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.courier/config.toml`
    /// 3. `/etc/courier/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        Self::load_from_file(&path)
    }

    /// Like [`Config::load`], but fall back to defaults when no file exists
    /// in the standard locations. An explicit path must still exist.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Result<Self> {
        if explicit_path.is_some() {
            return Self::load(explicit_path);
        }
        match Self::find_config_path() {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Config::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CourierError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            CourierError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(CourierError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        Self::find_config_path().ok_or_else(|| {
            CourierError::Configuration(
                "No config file found. Create ~/.courier/config.toml or /etc/courier/config.toml"
                    .to_string(),
            )
        })
    }

    fn find_config_path() -> Option<PathBuf> {
        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".courier").join("config.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/courier/config.toml");
        system_config.exists().then_some(system_config)
    }

    /// Timing knobs for the greeting service.
    pub fn greet_settings(&self) -> GreetSettings {
        GreetSettings::from(&self.pacing)
    }
}
