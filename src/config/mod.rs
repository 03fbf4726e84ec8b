//! Configuration layer: typed cache settings with layered precedence (file → environment).

use std::{
    collections::BTreeMap,
    num::NonZeroUsize,
    path::Path,
    str::FromStr,
    sync::{Arc, RwLock},
};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::lock::{read_guard, write_guard};
use crate::operations::etag::EtagComponent;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "brezza";
const DEFAULT_RAM_RESPONSE_LIMIT: usize = 1000;
const DEFAULT_RAM_BODY_LIMIT_BYTES: usize = 1024 * 1024;

const BROWSER_PROFILE: &str = include_str!("profiles/browser.toml");
const PROXY_PROFILE: &str = include_str!("profiles/proxy.toml");

const SOURCE: &str = "config::settings";

#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Cache policy configuration consumed read-only during resolution.
///
/// The four mapping tables drive the lookup chain: `templates` and
/// `content_types` resolve a published resource to a rule name, `mutators`
/// and `interceptors` bind a rule to a named operation per phase.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Template name to rule name; highest-priority match.
    pub templates: BTreeMap<String, String>,
    /// Content type tag to rule name; applies to default views only.
    pub content_types: BTreeMap<String, String>,
    pub mutators: BTreeMap<String, String>,
    pub interceptors: BTreeMap<String, String>,
    /// Operation parameters keyed by operation name, with per-rule overrides.
    pub operations: BTreeMap<String, OperationConfig>,
    pub ram: RamSettings,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            templates: BTreeMap::new(),
            content_types: BTreeMap::new(),
            mutators: BTreeMap::new(),
            interceptors: BTreeMap::new(),
            operations: BTreeMap::new(),
            ram: RamSettings::default(),
        }
    }
}

impl CacheSettings {
    /// Built-in profile for sites without a caching proxy in front:
    /// content views get browser-side validation caching backed by the RAM
    /// cache, static resources get shared caching.
    pub fn browser_profile() -> Result<Self, LoadError> {
        Self::from_profile_source(BROWSER_PROFILE)
    }

    /// Built-in profile for sites behind a caching proxy: feeds and file
    /// downloads move to shared caching with shorter lifetimes.
    pub fn proxy_profile() -> Result<Self, LoadError> {
        Self::from_profile_source(PROXY_PROFILE)
    }

    fn from_profile_source(source: &str) -> Result<Self, LoadError> {
        let raw: RawCacheSettings = toml::from_str(source)
            .map_err(|err| LoadError::invalid("cache.profile", err.to_string()))?;
        build_cache_settings(raw)
    }

    /// Merge the parameters for `operation` under `rule`: per-rule override
    /// first, then the operation's configured base, then `defaults`.
    pub fn operation_params(
        &self,
        operation: &str,
        rule: &str,
        defaults: OperationParams,
    ) -> OperationParams {
        let base = self.operations.get(operation);
        let over = base.and_then(|config| config.rules.get(rule));

        OperationParams {
            max_age: over
                .and_then(|o| o.max_age)
                .or_else(|| base.and_then(|b| b.max_age))
                .unwrap_or(defaults.max_age),
            etags: over
                .and_then(|o| o.etags.clone())
                .or_else(|| base.and_then(|b| b.etags.clone()))
                .unwrap_or(defaults.etags),
            ram_cache: over
                .and_then(|o| o.ram_cache)
                .or_else(|| base.and_then(|b| b.ram_cache))
                .unwrap_or(defaults.ram_cache),
            last_modified: over
                .and_then(|o| o.last_modified)
                .or_else(|| base.and_then(|b| b.last_modified))
                .unwrap_or(defaults.last_modified),
        }
    }
}

/// Configured base parameters for one operation.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OperationConfig {
    pub max_age: Option<u32>,
    pub etags: Option<Vec<EtagComponent>>,
    pub ram_cache: Option<bool>,
    pub last_modified: Option<bool>,
    /// Per-rule refinements, keyed by rule name.
    pub rules: BTreeMap<String, OperationOverride>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OperationOverride {
    pub max_age: Option<u32>,
    pub etags: Option<Vec<EtagComponent>>,
    pub ram_cache: Option<bool>,
    pub last_modified: Option<bool>,
}

/// Fully merged parameters an operation runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationParams {
    pub max_age: u32,
    pub etags: Vec<EtagComponent>,
    pub ram_cache: bool,
    pub last_modified: bool,
}

#[derive(Debug, Clone)]
pub struct RamSettings {
    /// Maximum responses held in the RAM cache.
    pub response_limit: usize,
    /// Largest response body the middleware will buffer.
    pub body_limit_bytes: usize,
}

impl Default for RamSettings {
    fn default() -> Self {
        Self {
            response_limit: DEFAULT_RAM_RESPONSE_LIMIT,
            body_limit_bytes: DEFAULT_RAM_BODY_LIMIT_BYTES,
        }
    }
}

impl RamSettings {
    /// Returns the response limit as NonZeroUsize, clamping to 1 if zero.
    pub fn response_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.response_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment).
pub fn load(config_file: Option<&Path>) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("BREZZA").separator("__"));

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    /// Name of a built-in profile to start from (`browser` or `proxy`).
    profile: Option<String>,
    templates: BTreeMap<String, String>,
    content_types: BTreeMap<String, String>,
    mutators: BTreeMap<String, String>,
    interceptors: BTreeMap<String, String>,
    operations: BTreeMap<String, OperationConfig>,
    ram: RawRamSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRamSettings {
    response_limit: Option<usize>,
    body_limit_bytes: Option<usize>,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, cache } = raw;

        let logging = build_logging_settings(logging)?;
        let cache = build_cache_settings(cache)?;

        Ok(Self { logging, cache })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let mut settings = match cache.profile.as_deref() {
        Some("browser") => CacheSettings::browser_profile()?,
        Some("proxy") => CacheSettings::proxy_profile()?,
        Some(other) => {
            return Err(LoadError::invalid(
                "cache.profile",
                format!("unknown profile `{other}`, expected `browser` or `proxy`"),
            ));
        }
        None => CacheSettings::default(),
    };

    if let Some(enabled) = cache.enabled {
        settings.enabled = enabled;
    }
    settings.templates.extend(cache.templates);
    settings.content_types.extend(cache.content_types);
    settings.mutators.extend(cache.mutators);
    settings.interceptors.extend(cache.interceptors);
    for (name, operation) in cache.operations {
        settings.operations.insert(name, operation);
    }
    if let Some(limit) = cache.ram.response_limit {
        settings.ram.response_limit = limit;
    }
    if let Some(bytes) = cache.ram.body_limit_bytes {
        settings.ram.body_limit_bytes = bytes;
    }

    Ok(settings)
}

// ============================================================================
// Settings handle
// ============================================================================

/// Process-wide handle to the installed cache settings.
///
/// Writers swap a fresh `Arc` in out of band; readers clone the `Arc` out so
/// no lock is held during lookup. An empty handle means caching configuration
/// is unavailable, which every resolution treats as "no rule".
#[derive(Debug, Default)]
pub struct SettingsHandle {
    current: RwLock<Option<Arc<CacheSettings>>>,
}

impl SettingsHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: CacheSettings) -> Self {
        let handle = Self::new();
        handle.install(settings);
        handle
    }

    pub fn install(&self, settings: CacheSettings) {
        *write_guard(&self.current, SOURCE, "install") = Some(Arc::new(settings));
    }

    pub fn clear(&self) {
        *write_guard(&self.current, SOURCE, "clear") = None;
    }

    pub fn current(&self) -> Option<Arc<CacheSettings>> {
        read_guard(&self.current, SOURCE, "current").clone()
    }
}
