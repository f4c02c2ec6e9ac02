//! Configuration management for confscout
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables.
//!
//! # Environment Variables
//!
//! - `CONFSCOUT_LOG_LEVEL`: Logging level - default: "info"
//! - `CONFSCOUT_MAX_SYMLINK_DEPTH`: Links followed per chain - default: "10"
//! - `CONFSCOUT_MAX_FILE_SIZE`: Largest file read for sniffing and includes, in bytes - default: "1048576"
//! - `CONFSCOUT_EXCLUDED_DIRS`: Comma-separated directories skipped by filesystem search
//! - `CONFSCOUT_OUTPUT_DIR`: Where collections are written - default: system temp dir
//! - `CONFSCOUT_STAGING_DIR`: Parent of staging directories - default: system temp dir
//! - `CONFSCOUT_COLLECTION_NAME`: `name` field of the manifest - default: "confscout"
//! - `CONFSCOUT_CUSTOMER_ID`: `customerId` field of the manifest - default: empty
//!
//! # Configuration File
//!
//! `--config <FILE>` or `<config dir>/confscout/config.toml`:
//!
//! ```toml
//! log_level = "debug"
//! max_symlink_depth = 5
//! excluded_dirs = ["/proc", "/sys", "node_modules"]
//! output_dir = "/var/tmp/collections"
//! ```

use crate::discovery::context::{default_excluded_dirs, DEFAULT_MAX_FILE_SIZE};
use crate::discovery::DiscoveryOptions;
use crate::fs::DEFAULT_MAX_SYMLINK_DEPTH;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_COLLECTION_NAME: &str = "confscout";
const MAX_SYMLINK_DEPTH_LIMIT: i32 = 64;
const MIN_FILE_SIZE: u64 = 1024;
const MAX_FILE_SIZE_LIMIT: u64 = 100 * 1024 * 1024;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for this schema
    #[error("Invalid config file {}: {source}", path.display())]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// On-disk configuration; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub log_level: Option<String>,
    pub max_symlink_depth: Option<i32>,
    pub max_file_size: Option<u64>,
    pub excluded_dirs: Option<Vec<String>>,
    pub output_dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
    pub collection_name: Option<String>,
    pub customer_id: Option<String>,
}

impl ConfigFile {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Main configuration structure for confscout
#[derive(Debug, Clone)]
pub struct ConfscoutConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Symlinks followed per chain before giving up
    pub max_symlink_depth: i32,

    /// Largest file read into memory, in bytes
    pub max_file_size: u64,

    /// Directories skipped by the filesystem-wide search (gitignore syntax)
    pub excluded_dirs: Vec<String>,

    /// Parent directory of written collections
    pub output_dir: PathBuf,

    /// Parent directory of per-finding staging directories
    pub staging_dir: Option<PathBuf>,

    pub collection_name: String,

    pub customer_id: String,
}

impl Default for ConfscoutConfig {
    /// Built-in defaults overridden by `CONFSCOUT_*` environment variables.
    ///
    /// Unparsable variables are ignored here; [`ConfscoutConfig::load`] reports them.
    fn default() -> Self {
        let mut config = Self::builtin();
        let _ = config.apply_env();
        config
    }
}

impl ConfscoutConfig {
    /// Defaults without consulting the environment
    pub fn builtin() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            max_symlink_depth: DEFAULT_MAX_SYMLINK_DEPTH,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            excluded_dirs: default_excluded_dirs(),
            output_dir: env::temp_dir(),
            staging_dir: None,
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            customer_id: String::new(),
        }
    }

    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("confscout").join("config.toml"))
    }

    /// Loads defaults, then the config file, then the environment, and validates the result.
    ///
    /// An explicit `path` must exist; the default path is used only if present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::builtin();

        let file = match path {
            Some(path) => Some(ConfigFile::from_path(path)?),
            None => match Self::default_path() {
                Some(default) if default.is_file() => Some(ConfigFile::from_path(&default)?),
                _ => None,
            },
        };
        if let Some(file) = file {
            config.apply_file(file);
        }

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(level) = file.log_level {
            self.log_level = level.to_lowercase();
        }
        if let Some(depth) = file.max_symlink_depth {
            self.max_symlink_depth = depth;
        }
        if let Some(size) = file.max_file_size {
            self.max_file_size = size;
        }
        if let Some(dirs) = file.excluded_dirs {
            self.excluded_dirs = dirs;
        }
        if let Some(dir) = file.output_dir {
            self.output_dir = dir;
        }
        if file.staging_dir.is_some() {
            self.staging_dir = file.staging_dir;
        }
        if let Some(name) = file.collection_name {
            self.collection_name = name;
        }
        if let Some(customer_id) = file.customer_id {
            self.customer_id = customer_id;
        }
    }

    /// Applies every set `CONFSCOUT_*` variable.
    ///
    /// Variables that fail to parse are skipped and the first such failure is returned.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        let mut first_error = None;

        if let Ok(level) = env::var("CONFSCOUT_LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }
        match env_parse::<i32>("CONFSCOUT_MAX_SYMLINK_DEPTH") {
            Ok(Some(depth)) => self.max_symlink_depth = depth,
            Ok(None) => {}
            Err(err) => first_error = first_error.or(Some(err)),
        }
        match env_parse::<u64>("CONFSCOUT_MAX_FILE_SIZE") {
            Ok(Some(size)) => self.max_file_size = size,
            Ok(None) => {}
            Err(err) => first_error = first_error.or(Some(err)),
        }
        if let Ok(dirs) = env::var("CONFSCOUT_EXCLUDED_DIRS") {
            self.excluded_dirs = dirs
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(dir) = env::var("CONFSCOUT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("CONFSCOUT_STAGING_DIR") {
            self.staging_dir = Some(PathBuf::from(dir));
        }
        if let Ok(name) = env::var("CONFSCOUT_COLLECTION_NAME") {
            self.collection_name = name;
        }
        if let Ok(customer_id) = env::var("CONFSCOUT_CUSTOMER_ID") {
            self.customer_id = customer_id;
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_symlink_depth < 0 || self.max_symlink_depth > MAX_SYMLINK_DEPTH_LIMIT {
            return Err(ConfigError::ValidationFailed(format!(
                "Max symlink depth must be between 0 and {}",
                MAX_SYMLINK_DEPTH_LIMIT
            )));
        }

        if self.max_file_size < MIN_FILE_SIZE {
            return Err(ConfigError::ValidationFailed(
                "Max file size must be at least 1KB".to_string(),
            ));
        }
        if self.max_file_size > MAX_FILE_SIZE_LIMIT {
            return Err(ConfigError::ValidationFailed(
                "Max file size cannot exceed 100MB".to_string(),
            ));
        }

        if self.collection_name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Collection name cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            max_symlink_depth: self.max_symlink_depth,
            max_file_size: self.max_file_size,
            excluded_dirs: self.excluded_dirs.clone(),
            staging_parent: self.staging_dir.clone(),
        }
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::ParseError {
                field: key.to_string(),
                error: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl fmt::Display for ConfscoutConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Confscout Configuration:")?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Max Symlink Depth: {}", self.max_symlink_depth)?;
        writeln!(f, "  Max File Size: {} bytes", self.max_file_size)?;
        writeln!(f, "  Excluded Dirs: {}", self.excluded_dirs.join(", "))?;
        writeln!(f, "  Output Dir: {}", self.output_dir.display())?;
        if let Some(ref dir) = self.staging_dir {
            writeln!(f, "  Staging Dir: {}", dir.display())?;
        }
        writeln!(f, "  Collection Name: {}", self.collection_name)?;
        writeln!(f, "  Customer Id: {}", self.customer_id)?;
        Ok(())
    }
}
