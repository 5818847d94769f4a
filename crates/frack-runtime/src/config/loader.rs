//! Layered configuration loading.
//!
//! Sources are merged in this order, each overriding the ones before it:
//!
//! 1. [`FrackConfig::default`]: the `[log, head]` chain, `info` logging
//! 2. values passed to [`ConfigLoader::merge`]
//! 3. the profile variant of the config file, e.g. `frack.production.toml`
//! 4. the config file itself
//! 5. `FRACK_*` environment variables
//!
//! The config file is either given with [`ConfigLoader::file`] or discovered:
//! the first of `frack.toml`, `config.toml` (and, with `yaml-config`,
//! `frack.yaml`, `frack.yml`, `config.yaml`, `config.yml`) found in the search
//! directories. Without explicit directories those are the working directory
//! and `<user config dir>/frack`.
//!
//! Environment variables use `__` for nesting:
//!
//! ```text
//! FRACK_PROFILE=production                  selects frack.production.toml
//! FRACK_LOGGING__LEVEL=debug                logging.level = "debug"
//! FRACK_PIPELINE__MIDDLEWARE=[log,timeout]  pipeline.middleware = ["log", "timeout"]
//! FRACK_PIPELINE__TIMEOUT_MS=500            pipeline.timeout_ms = 500
//! ```
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("deploy/frack.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
use figment::providers::{Env, Serialized};
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use tracing::{debug, info};

use super::error::{ConfigError, ConfigResult};
use super::schema::FrackConfig;
use super::validation::validate_config;

/// Prefix of the environment variables read by [`ConfigLoader`].
pub const ENV_PREFIX: &str = "FRACK_";

/// Environment variable naming the active profile.
pub const PROFILE_ENV: &str = "FRACK_PROFILE";

/// Loads a [`FrackConfig`] from defaults, files and the environment.
#[derive(Debug)]
pub struct ConfigLoader {
    overrides: Figment,
    profile: Option<String>,
    search_dirs: Vec<PathBuf>,
    file: Option<PathBuf>,
    env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader with the default search directories, environment variables
    /// enabled and the profile taken from `FRACK_PROFILE`.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: std::env::var(PROFILE_ENV)
                .ok()
                .filter(|name| !name.trim().is_empty())
                .map(|name| name.to_lowercase()),
            search_dirs: Vec::new(),
            file: None,
            env: true,
        }
    }

    /// Selects a profile, overriding `FRACK_PROFILE`.
    pub fn profile(mut self, name: impl Into<String>) -> Self {
        self.profile = Some(name.into().to_lowercase());
        self
    }

    /// Searches `dir` for a config file. Replaces the default directories.
    pub fn search_path(mut self, dir: impl AsRef<Path>) -> Self {
        self.search_dirs.push(dir.as_ref().to_path_buf());
        self
    }

    /// Loads this file instead of searching. It must exist.
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.env = true;
        self
    }

    /// Ignores `FRACK_*` variables (the profile is still read by [`new`](Self::new)).
    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Layers `config` over the defaults. Files and the environment still
    /// take precedence.
    pub fn merge(mut self, config: FrackConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// The active profile, if any.
    pub fn active_profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Merges every source, then extracts and validates the result.
    pub fn load(self) -> ConfigResult<FrackConfig> {
        let files = self.config_files()?;

        let mut figment = Figment::from(Serialized::defaults(FrackConfig::default()))
            .merge(self.overrides.clone());
        for path in &files {
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_file(figment, path)?;
        }
        if self.env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["profile"]).split("__"));
        }

        let config: FrackConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            profile = self.profile.as_deref(),
            files = files.len(),
            middleware = ?config.pipeline.middleware,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// The files to merge, profile variant first.
    fn config_files(&self) -> ConfigResult<Vec<PathBuf>> {
        let base = match &self.file {
            Some(path) if path.is_file() => path.clone(),
            Some(path) => return Err(ConfigError::FileNotFound(path.clone())),
            None => match self.discover() {
                Some(path) => path,
                None => {
                    debug!("No configuration file found, using defaults");
                    return Ok(Vec::new());
                }
            },
        };

        let variant = self
            .profile
            .as_deref()
            .and_then(|profile| profile_variant(&base, profile))
            .filter(|path| path.is_file());
        Ok(variant.into_iter().chain([base]).collect())
    }

    /// The first known config file in the search directories.
    fn discover(&self) -> Option<PathBuf> {
        let dirs = if self.search_dirs.is_empty() {
            default_search_dirs()
        } else {
            self.search_dirs.clone()
        };

        dirs.iter()
            .flat_map(|dir| file_names().into_iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file())
    }
}

/// The working directory, then `<user config dir>/frack`.
fn default_search_dirs() -> Vec<PathBuf> {
    std::env::current_dir()
        .ok()
        .into_iter()
        .chain(dirs::config_dir().map(|dir| dir.join("frack")))
        .collect()
}

/// Config file names for the enabled formats, in search order.
#[cfg_attr(
    not(any(feature = "toml-config", feature = "yaml-config")),
    allow(unused_mut)
)]
fn file_names() -> Vec<&'static str> {
    let mut names = Vec::new();
    #[cfg(feature = "toml-config")]
    names.extend(["frack.toml", "config.toml"]);
    #[cfg(feature = "yaml-config")]
    names.extend(["frack.yaml", "frack.yml", "config.yaml", "config.yml"]);
    names
}

/// `dir/frack.toml` + `production` gives `dir/frack.production.toml`.
fn profile_variant(base: &Path, profile: &str) -> Option<PathBuf> {
    let stem = base.file_stem()?.to_str()?;
    let ext = base.extension()?.to_str()?;
    Some(base.with_file_name(format!("{stem}.{profile}.{ext}")))
}

/// Merges one file, picking the provider from its extension.
#[cfg_attr(
    not(any(feature = "toml-config", feature = "yaml-config")),
    allow(unused_variables)
)]
fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<FrackConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from one file, with environment overrides.
pub fn load_config_from_file(path: impl AsRef<Path>) -> ConfigResult<FrackConfig> {
    ConfigLoader::new().file(path).load()
}
