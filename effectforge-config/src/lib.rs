use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Pre-compiled regex for hostname validation (compiled once at first use)
static HOSTNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][-a-zA-Z0-9\.]*[a-zA-Z0-9]$").unwrap());

/// Upper bound on worker tasks; beyond this the queue is just contending on locks.
const MAX_WORKERS: usize = 64;

#[derive(Debug, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
    #[serde(default)]
    pub cors: Option<CorsSection>,
    #[serde(default)]
    pub queue: Option<QueueSection>,
    #[serde(default)]
    pub library: Option<LibrarySection>,
    #[serde(default)]
    pub uploads: Option<UploadsSection>,
    #[serde(default)]
    pub rate_limit: Option<RateLimitSection>,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitSection {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub per_ip: Option<bool>,
    #[serde(default)]
    pub rate_per_sec: Option<f64>,
    #[serde(default)]
    pub burst: Option<usize>,
    #[serde(default)]
    pub exempt_paths: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct CorsSection {
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(default)]
    pub allow_all_origins: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct QueueSection {
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub max_job_runs: Option<usize>,
    #[serde(default)]
    pub stage_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LibrarySection {
    #[serde(default)]
    pub seed_samples: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UploadsSection {
    #[serde(default)]
    pub max_entries: Option<usize>,
    #[serde(default)]
    pub max_bytes: Option<usize>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a RawConfigFile from a path. The format is inferred from the extension: .toml, .yaml/.yml, .json
pub fn load_raw_from_file<P: AsRef<Path>>(path: P) -> Result<RawConfigFile, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    parse_config_str(&s, ext.as_deref())
}

/// Parse configuration from a string with optional format hint
#[inline]
fn parse_config_str(s: &str, ext: Option<&str>) -> Result<RawConfigFile, ConfigError> {
    match ext {
        #[cfg(feature = "toml")]
        Some("toml") => toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => {
            serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        #[cfg(feature = "json")]
        Some("json") => serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        _ => parse_config_auto(s),
    }
}

/// Try to parse config by attempting each enabled format
#[inline]
fn parse_config_auto(s: &str) -> Result<RawConfigFile, ConfigError> {
    #[cfg(feature = "yaml")]
    if let Ok(cfg) = serde_yaml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "toml")]
    if let Ok(cfg) = toml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "json")]
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(any(feature = "yaml", feature = "toml", feature = "json"))]
    {
        Err(ConfigError::Parse(
            "failed to parse config as any supported format".into(),
        ))
    }

    #[cfg(not(any(feature = "yaml", feature = "toml", feature = "json")))]
    {
        let _ = s;
        Err(ConfigError::Parse("no config format enabled".into()))
    }
}

/// Concrete application configuration with defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
    pub queue: QueueConfig,
    pub library: LibraryConfig,
    pub uploads: UploadsConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_all_origins: bool,
}

/// Job queue tuning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueConfig {
    /// Number of worker tasks, i.e. the maximum number of jobs processed at once.
    pub workers: usize,
    /// How many job runs are retained before the oldest finished ones are dropped.
    pub max_job_runs: usize,
    /// Pause inserted between pipeline stages so progress is observable.
    pub stage_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryConfig {
    pub seed_samples: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadsConfig {
    pub max_entries: usize,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub per_ip: bool,
    pub rate_per_sec: f64,
    pub burst: usize,
    pub exempt_paths: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 6100,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
            cors: CorsConfig {
                allowed_origins: Vec::new(),
                allow_all_origins: false,
            },
            queue: QueueConfig {
                workers: 3,
                max_job_runs: 1000,
                stage_delay_ms: 150,
            },
            library: LibraryConfig { seed_samples: true },
            uploads: UploadsConfig {
                max_entries: 100,
                max_bytes: 256 * 1024,
            },
            rate_limit: RateLimitConfig {
                enabled: false,
                per_ip: true,
                rate_per_sec: 20.0,
                burst: 40,
                exempt_paths: vec!["/health".to_string(), "/ready".to_string()],
            },
        }
    }
}

fn parse_bool(s: &str) -> Result<bool, ()> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(()),
    }
}

#[inline]
fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .filter_map(|p| {
            let trimmed = p.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Helper macro to apply optional value if present
macro_rules! apply_opt {
    ($target:expr, $source:expr) => {
        if let Some(v) = $source {
            $target = v;
        }
    };
}

/// Apply the sections of a parsed file on top of `cfg`.
fn apply_raw(cfg: &mut Config, raw: RawConfigFile) {
    if let Some(server) = raw.server {
        apply_opt!(cfg.server.host, server.host);
        apply_opt!(cfg.server.port, server.port);
    }
    if let Some(logging) = raw.logging {
        apply_opt!(cfg.logging.level, logging.level);
        apply_opt!(cfg.logging.json, logging.json);
    }
    if let Some(cors) = raw.cors {
        apply_opt!(cfg.cors.allowed_origins, cors.allowed_origins);
        apply_opt!(cfg.cors.allow_all_origins, cors.allow_all_origins);
    }
    if let Some(queue) = raw.queue {
        apply_opt!(cfg.queue.workers, queue.workers);
        apply_opt!(cfg.queue.max_job_runs, queue.max_job_runs);
        apply_opt!(cfg.queue.stage_delay_ms, queue.stage_delay_ms);
    }
    if let Some(library) = raw.library {
        apply_opt!(cfg.library.seed_samples, library.seed_samples);
    }
    if let Some(uploads) = raw.uploads {
        apply_opt!(cfg.uploads.max_entries, uploads.max_entries);
        apply_opt!(cfg.uploads.max_bytes, uploads.max_bytes);
    }
    if let Some(rl) = raw.rate_limit {
        apply_opt!(cfg.rate_limit.enabled, rl.enabled);
        apply_opt!(cfg.rate_limit.per_ip, rl.per_ip);
        apply_opt!(cfg.rate_limit.rate_per_sec, rl.rate_per_sec);
        apply_opt!(cfg.rate_limit.burst, rl.burst);
        apply_opt!(cfg.rate_limit.exempt_paths, rl.exempt_paths);
    }
}

/// Load concrete `Config` from optional file and environment variables.
/// Environment variables take precedence over file values and defaults.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    if let Some(p) = path {
        let raw = load_raw_from_file(p)?;
        apply_raw(&mut cfg, raw);
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

/// Helper to parse env var as a specific type
#[inline]
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Parse(format!("invalid {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Helper to parse env var as bool
#[inline]
fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(v) => parse_bool(&v)
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("invalid {}", key))),
        Err(_) => Ok(None),
    }
}

#[inline]
fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Apply all environment variable overrides to config
fn apply_env_overrides(cfg: &mut Config) -> Result<(), ConfigError> {
    // Server
    if let Some(v) = env_str("EFFECTFORGE_SERVER_HOST") {
        cfg.server.host = v;
    }
    if let Some(v) = env_parse::<u16>("EFFECTFORGE_SERVER_PORT")? {
        cfg.server.port = v;
    }

    // Logging
    if let Some(v) = env_str("EFFECTFORGE_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_bool("EFFECTFORGE_LOG_JSON")? {
        cfg.logging.json = v;
    }

    // CORS
    if let Some(v) = env_str("EFFECTFORGE_CORS_ALLOWED_ORIGINS") {
        cfg.cors.allowed_origins = split_csv(&v);
    }
    if let Some(v) = env_bool("EFFECTFORGE_CORS_ALLOW_ALL_ORIGINS")? {
        cfg.cors.allow_all_origins = v;
    }

    // Queue
    if let Some(v) = env_parse::<usize>("EFFECTFORGE_QUEUE_WORKERS")? {
        cfg.queue.workers = v;
    }
    if let Some(v) = env_parse::<usize>("EFFECTFORGE_QUEUE_MAX_JOB_RUNS")? {
        cfg.queue.max_job_runs = v;
    }
    if let Some(v) = env_parse::<u64>("EFFECTFORGE_QUEUE_STAGE_DELAY_MS")? {
        cfg.queue.stage_delay_ms = v;
    }

    // Library
    if let Some(v) = env_bool("EFFECTFORGE_LIBRARY_SEED_SAMPLES")? {
        cfg.library.seed_samples = v;
    }

    // Uploads
    if let Some(v) = env_parse::<usize>("EFFECTFORGE_UPLOADS_MAX_ENTRIES")? {
        cfg.uploads.max_entries = v;
    }
    if let Some(v) = env_parse::<usize>("EFFECTFORGE_UPLOADS_MAX_BYTES")? {
        cfg.uploads.max_bytes = v;
    }

    // Rate limiting
    if let Some(v) = env_bool("EFFECTFORGE_RATE_LIMIT_ENABLED")? {
        cfg.rate_limit.enabled = v;
    }
    if let Some(v) = env_bool("EFFECTFORGE_RATE_LIMIT_PER_IP")? {
        cfg.rate_limit.per_ip = v;
    }
    if let Some(v) = env_parse::<f64>("EFFECTFORGE_RATE_LIMIT_PER_SEC")? {
        cfg.rate_limit.rate_per_sec = v;
    }
    if let Some(v) = env_parse::<usize>("EFFECTFORGE_RATE_LIMIT_BURST")? {
        cfg.rate_limit.burst = v;
    }
    if let Some(v) = env_str("EFFECTFORGE_RATE_LIMIT_EXEMPT_PATHS") {
        cfg.rate_limit.exempt_paths = split_csv(&v);
    }

    Ok(())
}

/// Validate higher-level constraints on the resolved configuration.
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.server.port == 0 {
        return Err(ConfigError::Validation("server.port must be > 0".into()));
    }
    let host_ok = cfg.server.host.parse::<std::net::IpAddr>().is_ok()
        || HOSTNAME_REGEX.is_match(&cfg.server.host);
    if !host_ok {
        return Err(ConfigError::Validation(format!(
            "invalid server.host: {}",
            cfg.server.host
        )));
    }

    if cfg.queue.workers == 0 || cfg.queue.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "queue.workers must be between 1 and {MAX_WORKERS}"
        )));
    }
    if cfg.queue.max_job_runs == 0 {
        return Err(ConfigError::Validation(
            "queue.max_job_runs must be > 0".into(),
        ));
    }
    if cfg.uploads.max_entries == 0 {
        return Err(ConfigError::Validation(
            "uploads.max_entries must be > 0".into(),
        ));
    }
    if cfg.uploads.max_bytes == 0 {
        return Err(ConfigError::Validation(
            "uploads.max_bytes must be > 0".into(),
        ));
    }

    if cfg.rate_limit.enabled && cfg.rate_limit.rate_per_sec <= 0.0 {
        return Err(ConfigError::Validation(
            "rate_limit.rate_per_sec must be > 0 when rate limiting is enabled".into(),
        ));
    }
    if cfg.rate_limit.enabled && cfg.rate_limit.burst == 0 {
        return Err(ConfigError::Validation(
            "rate_limit.burst must be > 0 when rate limiting is enabled".into(),
        ));
    }

    for origin in &cfg.cors.allowed_origins {
        if origin == "*" {
            continue;
        }
        match url::Url::parse(origin) {
            Ok(u) => {
                let scheme = u.scheme();
                if scheme != "http" && scheme != "https" {
                    return Err(ConfigError::Validation(format!(
                        "CORS origin must be http or https: {}",
                        origin
                    )));
                }
            }
            Err(_) => {
                return Err(ConfigError::Validation(format!(
                    "invalid CORS origin: {}",
                    origin
                )))
            }
        }
    }
    Ok(())
}
