use eyre::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::interval;

/// Environment variable holding the emission interval
pub const INTERVAL_ENV: &str = "LOG_INTERVAL";
/// Environment variable holding the total record count
pub const TOTAL_ENV: &str = "TOTAL_LOGS";
/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "SYNTHLOG_CONFIG";

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_LANGUAGE: &str = "rust";

/// Main synthlog configuration, as read from `synthlog.yaml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    pub generator: GeneratorConfig,
}

/// Diagnostic log level (stderr), independent of the generated records
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// Output encoding for generated records
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// logfmt-style key=value line
    Text,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Pause between records, e.g. "500ms"
    pub interval: Option<String>,
    /// Number of records to emit; negative or absent runs forever
    pub total: Option<i64>,
    /// Language tag stamped on every record
    pub language: String,
    /// Fixed RNG seed for reproducible streams
    pub seed: Option<u64>,
    pub format: RecordFormat,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval: None,
            total: None,
            language: DEFAULT_LANGUAGE.to_string(),
            seed: None,
            format: RecordFormat::default(),
        }
    }
}

/// Values given explicitly on the command line; these win over everything else
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub interval: Option<Duration>,
    pub total: Option<i64>,
    pub seed: Option<u64>,
    pub language: Option<String>,
    pub format: Option<RecordFormat>,
}

/// Fully resolved generator settings, fixed for the life of the process
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub interval: Duration,
    /// Upper bound on emitted records; `None` runs forever
    pub total: Option<u64>,
    pub language: String,
    pub seed: Option<u64>,
    pub format: RecordFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            total: None,
            language: DEFAULT_LANGUAGE.to_string(),
            seed: None,
            format: RecordFormat::default(),
        }
    }
}

impl Settings {
    /// Resolve settings from the process environment
    pub fn from_env(config: &Config, overrides: &Overrides) -> Self {
        Self::resolve(config, overrides, |key| std::env::var(key).ok())
    }

    /// Resolve settings with precedence: overrides, then `env`, then the config file, then defaults.
    ///
    /// Malformed values are treated as absent, so the next source applies.
    pub fn resolve<F>(config: &Config, overrides: &Overrides, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_value = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let interval = overrides
            .interval
            .or_else(|| env_value(INTERVAL_ENV).and_then(|v| parse_interval(&v, INTERVAL_ENV)))
            .or_else(|| {
                config
                    .generator
                    .interval
                    .as_deref()
                    .and_then(|v| parse_interval(v, "config file"))
            })
            .unwrap_or(DEFAULT_INTERVAL);

        let total = overrides
            .total
            .or_else(|| env_value(TOTAL_ENV).and_then(|v| parse_total(&v)))
            .or(config.generator.total)
            .and_then(bound_from_total);

        Self {
            interval,
            total,
            language: overrides
                .language
                .clone()
                .unwrap_or_else(|| config.generator.language.clone()),
            seed: overrides.seed.or(config.generator.seed),
            format: overrides.format.unwrap_or(config.generator.format),
        }
    }
}

fn parse_interval(value: &str, source: &str) -> Option<Duration> {
    let parsed = interval::parse(value);
    if parsed.is_none() {
        log::warn!("Ignoring unparseable interval {:?} from {}", value, source);
    }
    parsed
}

/// Parse a total-count string; malformed input yields `None`
pub fn parse_total(value: &str) -> Option<i64> {
    match value.trim().parse::<i64>() {
        Ok(n) => Some(n),
        Err(e) => {
            log::warn!("Ignoring unparseable total {:?} from {}: {}", value, TOTAL_ENV, e);
            None
        }
    }
}

/// Map a raw total to an upper bound; negative totals mean unbounded
pub fn bound_from_total(total: i64) -> Option<u64> {
    u64::try_from(total).ok()
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Runs before logging is set up, so problems that do not stop the load are
    /// returned as warnings for the caller to log.
    pub fn load(config_path: Option<&PathBuf>) -> Result<(Self, Vec<String>)> {
        let mut warnings = Vec::new();

        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            let path = Self::expand_path(path);
            let config = Self::load_from_file(&path, &mut warnings)
                .context(format!("Failed to load config from {}", path.display()))?;
            return Ok((config, warnings));
        }

        let mut candidates = Vec::new();

        // Check SYNTHLOG_CONFIG env var
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            candidates.push(Self::expand_path(Path::new(&env_path)));
        }

        // Try ~/.config/synthlog/synthlog.yaml
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("synthlog").join("synthlog.yaml"));
        }

        // Try ./synthlog.yaml (for development)
        candidates.push(PathBuf::from("synthlog.yaml"));

        for path in candidates.iter().filter(|path| path.exists()) {
            let mut file_warnings = Vec::new();
            match Self::load_from_file(path, &mut file_warnings) {
                Ok(config) => {
                    warnings.extend(file_warnings);
                    return Ok((config, warnings));
                }
                Err(e) => warnings.push(format!("Skipping config file {}: {:#}", path.display(), e)),
            }
        }

        // No usable config file found, use defaults
        Ok((Self::default(), warnings))
    }

    fn load_from_file<P: AsRef<Path>>(path: P, warnings: &mut Vec<String>) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let source = path.as_ref().display().to_string();
        Self::from_yaml(&content, &source, warnings)
    }

    /// Parse a config document key by key.
    ///
    /// Only YAML syntax errors and a non-mapping document fail the load. An
    /// invalid or unknown key is skipped with a warning and the rest of the
    /// file still applies.
    pub fn from_yaml(content: &str, source: &str, warnings: &mut Vec<String>) -> Result<Self> {
        let raw: Value = serde_yaml::from_str(content).context("Failed to parse config file")?;
        let mut config = Self::default();

        let root = match raw {
            Value::Null => return Ok(config),
            Value::Mapping(root) => root,
            _ => eyre::bail!("Config file must be a mapping of keys to values"),
        };

        for key in unknown_keys(&root, &["log_level", "generator"]) {
            warnings.push(format!("{}: ignoring unknown key '{}'", source, key));
        }

        if let Some(level) = lenient_field(&root, "log_level", source, warnings) {
            config.log_level = level;
        }

        match root.get("generator") {
            None | Some(Value::Null) => {}
            Some(Value::Mapping(section)) => {
                let known = ["interval", "total", "language", "seed", "format"];
                for key in unknown_keys(section, &known) {
                    warnings.push(format!("{}: ignoring unknown key 'generator.{}'", source, key));
                }

                let generator = &mut config.generator;
                generator.interval = lenient_field(section, "interval", source, warnings);
                generator.total = lenient_field(section, "total", source, warnings);
                generator.seed = lenient_field(section, "seed", source, warnings);
                if let Some(language) = lenient_field(section, "language", source, warnings) {
                    generator.language = language;
                }
                if let Some(format) = lenient_field(section, "format", source, warnings) {
                    generator.format = format;
                }
            }
            Some(_) => warnings.push(format!("{}: ignoring 'generator', expected a mapping", source)),
        }

        Ok(config)
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}

/// Deserialize `key` from `map`, treating an invalid value as absent
fn lenient_field<T: DeserializeOwned>(map: &Mapping, key: &str, source: &str, warnings: &mut Vec<String>) -> Option<T> {
    let value = map.get(key).filter(|value| !value.is_null())?;
    match serde_yaml::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warnings.push(format!("{}: ignoring invalid '{}': {}", source, key, e));
            None
        }
    }
}

fn unknown_keys(map: &Mapping, known: &[&str]) -> Vec<String> {
    map.keys()
        .filter(|key| !key.as_str().is_some_and(|key| known.contains(&key)))
        .map(|key| match key.as_str() {
            Some(name) => name.to_string(),
            None => format!("{:?}", key),
        })
        .collect()
}
