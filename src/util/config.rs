//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.libgraph/config.toml` - User-wide defaults
//! - Project: `.libgraph/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::descriptors::components::{LanguageVersion, LanguageVersionSettings};

/// Name of the per-user and per-project configuration directory.
pub const CONFIG_DIR: &str = ".libgraph";

pub const CONFIG_FILE: &str = "config.toml";

/// Default header-import program looked up on PATH.
pub const DEFAULT_TOOL: &str = "cinterop";

pub const DEFAULT_FLAVOR: &str = "native";

/// libgraph configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language settings used when loading modules
    pub language: LanguageConfig,

    /// Interop build settings
    pub interop: InteropConfig,
}

/// Language settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Language version, `major.minor`
    pub version: Option<String>,

    #[serde(default)]
    pub skip_metadata_version_check: bool,

    #[serde(default)]
    pub allow_unstable_dependencies: bool,
}

/// Interop build settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InteropConfig {
    /// Header-import program
    pub tool: Option<PathBuf>,

    /// Library-production program
    pub compiler: Option<PathBuf>,

    pub flavor: Option<String>,

    /// Repositories searched after the ones given on the command line
    #[serde(default)]
    pub repos: Vec<String>,

    /// Directory of libraries added unless `-nodefaultlibs`
    pub default_libs_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Language settings
        if other.language.version.is_some() {
            self.language.version = other.language.version;
        }
        if other.language.skip_metadata_version_check {
            self.language.skip_metadata_version_check = true;
        }
        if other.language.allow_unstable_dependencies {
            self.language.allow_unstable_dependencies = true;
        }

        // Interop settings
        if other.interop.tool.is_some() {
            self.interop.tool = other.interop.tool;
        }
        if other.interop.compiler.is_some() {
            self.interop.compiler = other.interop.compiler;
        }
        if other.interop.flavor.is_some() {
            self.interop.flavor = other.interop.flavor;
        }
        if !other.interop.repos.is_empty() {
            self.interop.repos = other.interop.repos;
        }
        if other.interop.default_libs_dir.is_some() {
            self.interop.default_libs_dir = other.interop.default_libs_dir;
        }
    }

    /// Language settings for module loading.
    pub fn language_settings(&self) -> Result<LanguageVersionSettings> {
        let parse = |key: &str, raw: &str| -> Result<LanguageVersion> {
            raw.parse()
                .map_err(|e: String| anyhow!("invalid `language.{}`: {}", key, e))
        };

        let language_version = match &self.language.version {
            Some(raw) => parse("version", raw)?,
            None => LanguageVersion::LATEST_STABLE,
        };

        Ok(LanguageVersionSettings {
            language_version,
            skip_metadata_version_check: self.language.skip_metadata_version_check,
            allow_unstable_dependencies: self.language.allow_unstable_dependencies,
        })
    }

    pub fn flavor(&self) -> &str {
        self.interop.flavor.as_deref().unwrap_or(DEFAULT_FLAVOR)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.libgraph/config.toml)
/// 2. Global config (~/.libgraph/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global config directory (~/.libgraph).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR))
}

pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(CONFIG_FILE))
}

pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Configuration for a command run from `cwd`.
pub fn load_for(cwd: &Path) -> Config {
    let project = project_config_path(cwd);
    match global_config_path() {
        Some(global) => load_config(&global, &project),
        None => load_config(Path::new(""), &project),
    }
}
