use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{AnimationTiming, EngineConfig, GestureConfig};
use crate::services::StorageKey;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub gesture: GestureSettings,
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub features: FeatureSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Live per-user engines kept in memory
    pub max_sessions: Option<u64>,
}

/// Remote sync API; swipes stay local-only when disabled
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// In-memory storage is used when unset
    pub redis_url: Option<String>,
    #[serde(default = "default_l1_cache_size")]
    pub l1_cache_size: u64,
    pub ttl_secs: Option<u64>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            l1_cache_size: default_l1_cache_size(),
            ttl_secs: None,
        }
    }
}

/// Card gesture tuning, published to clients that render the stack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GestureSettings {
    #[serde(default)]
    pub thresholds: GestureConfig,
    #[serde(default)]
    pub animation: AnimationTiming,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    /// Debug override: keep showing swiped profiles
    #[serde(default)]
    pub ignore_swipe_history: bool,
    #[serde(default = "default_duplicate_window_ms")]
    pub duplicate_window_ms: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            ignore_swipe_history: false,
            duplicate_window_ms: default_duplicate_window_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureSettings {
    /// Expose "people who like you"
    #[serde(default = "default_true")]
    pub likes_you: bool,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self { likes_you: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_timeout_secs() -> u64 { 10 }
fn default_l1_cache_size() -> u64 { 1000 }
fn default_duplicate_window_ms() -> u64 { 500 }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

/// Ledger scope shared by every engine in the server process
pub const SHARED_LEDGER_SCOPE: &str = "global";

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with SWIPE__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Development overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., SWIPE__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("SWIPE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SWIPE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Engine settings for one user of the server, which shares one ledger
    pub fn engine_config(&self, user_id: &str) -> EngineConfig {
        EngineConfig {
            ignore_swipe_history: self.feed.ignore_swipe_history,
            duplicate_window_ms: self.feed.duplicate_window_ms,
            ledger_key: StorageKey::ledger(SHARED_LEDGER_SCOPE),
            restore_ledger: false,
            ..EngineConfig::new(user_id)
        }
    }
}

/// Pick up the conventional unprefixed variables for secrets and URLs
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(redis_url) = env::var("REDIS_URL") {
        builder = builder.set_override("storage.redis_url", redis_url)?;
    }
    if let Ok(api_key) = env::var("BACKEND_API_KEY") {
        builder = builder.set_override("backend.api_key", api_key)?;
    }

    builder.build()
}
