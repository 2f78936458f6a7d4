use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

const DEFAULT_FILE: &str = "config.yaml";
const CONFIG_ENV: &str = "WORKOUT_LOGGER_CONFIG";

/// Determine where the configuration file lives.
///
/// `WORKOUT_LOGGER_CONFIG` takes precedence over `config.yaml` in the
/// working directory.
pub fn resolve_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    #[serde(alias = "debug")]
    Debug,
    #[serde(alias = "info")]
    Info,
    #[serde(alias = "warning", alias = "WARN", alias = "warn")]
    Warning,
    #[serde(alias = "error", alias = "CRITICAL", alias = "critical")]
    Error,
}

impl LogLevel {
    pub fn filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// User configuration read from `config.yaml`.
///
/// Every field has a default, so a file that only sets some keys, or sets
/// some of them to unusable values, is completed from [`Config::default`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub webhook_url: String,
    pub local_file: PathBuf,
    pub required_fields: Vec<String>,
    pub optional_fields: Vec<String>,
    pub log_level: LogLevel,
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            webhook_url: "https://hook.example.com/workout".into(),
            local_file: PathBuf::from("training_log.csv"),
            required_fields: names(&[
                "workout_name",
                "exercise_name",
                "set_number",
                "weight_kg",
                "reps",
            ]),
            optional_fields: names(&["rpe", "rest_sec", "notes"]),
            log_level: LogLevel::Info,
            log_format: "%(asctime)s - %(levelname)s - %(message)s".into(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    NotAMapping,
    Key {
        key: &'static str,
        source: serde_yaml::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config file I/O failed: {e}"),
            ConfigError::Yaml(e) => write!(f, "config file is not valid YAML, using defaults: {e}"),
            ConfigError::NotAMapping => write!(f, "config file is not a mapping of keys, using defaults"),
            ConfigError::Key { key, source } => {
                write!(f, "invalid value for '{key}', keeping the default: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Yaml(e) => Some(e),
            ConfigError::NotAMapping => None,
            ConfigError::Key { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e)
    }
}

impl Config {
    /// Load the configuration, never failing.
    ///
    /// A missing file is created with the defaults. If the file cannot be
    /// read or parsed at all the defaults are used. A key with an unusable
    /// value keeps its default while the other keys are still honored. Every
    /// problem is returned so it can be logged once logging is up.
    pub fn load_from(path: &Path) -> (Self, Vec<ConfigError>) {
        if !path.exists() {
            let config = Self::default();
            let issues = config.save_to(path).err().into_iter().collect();
            return (config, issues);
        }
        match Self::try_load(path) {
            Ok(loaded) => loaded,
            Err(e) => (Self::default(), vec![e]),
        }
    }

    fn try_load(path: &Path) -> Result<(Self, Vec<ConfigError>), ConfigError> {
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok((Self::default(), Vec::new()));
        }
        let map = match serde_yaml::from_str::<Value>(&data)? {
            Value::Null => return Ok((Self::default(), Vec::new())),
            Value::Mapping(map) => map,
            _ => return Err(ConfigError::NotAMapping),
        };

        let mut config = Self::default();
        let mut issues = Vec::new();
        read_key(&map, "webhook_url", &mut config.webhook_url, &mut issues);
        read_key(&map, "local_file", &mut config.local_file, &mut issues);
        read_key(&map, "required_fields", &mut config.required_fields, &mut issues);
        read_key(&map, "optional_fields", &mut config.optional_fields, &mut issues);
        read_key(&map, "log_level", &mut config.log_level, &mut issues);
        read_key(&map, "log_format", &mut config.log_format, &mut issues);
        Ok((config, issues))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = serde_yaml::to_string(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

/// Overwrite `slot` with the value under `key`, if present and well formed.
fn read_key<T: DeserializeOwned>(
    map: &Mapping,
    key: &'static str,
    slot: &mut T,
    issues: &mut Vec<ConfigError>,
) {
    let Some(value) = map.get(key) else {
        return;
    };
    match serde_yaml::from_value(value.clone()) {
        Ok(v) => *slot = v,
        Err(source) => issues.push(ConfigError::Key { key, source }),
    }
}
