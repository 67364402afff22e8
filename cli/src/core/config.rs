//! # plumrs Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module loads and validates `~/.plum_tools.yaml`, the single
//! configuration file shared by every subcommand. It provides the default ssh
//! credentials, the IP prefix for each host type, the IPMI address offset and
//! the rsync project definitions.
//!
//! ## Architecture
//!
//! - The file is parsed with `serde_yaml` into `RawConfig`, which captures the
//!   dynamic `host_type_<label>` keys through a flattened map.
//! - `validate_and_build` turns the raw form into `Config`: every extra key
//!   must start with `host_type_` and hold a string, and `~` is expanded in
//!   identity files and project sources.
//! - Lookups that need a key the file does not define fail with
//!   `PlumError::MissingKey`. There is no partial recovery; `main` prints the
//!   error and exits with status 1.
//!
//! The path defaults to `$HOME/.plum_tools.yaml` and can be overridden with the
//! global `--config` flag or the `PLUM_CONFIG` environment variable.
//!
//! ## Example file
//!
//! ```yaml
//! default_ssh_conf:
//!   user: root
//!   port: 22
//!   identityfile: ~/.ssh/id_rsa
//! ipmi_interval: 100
//! host_type_default: "10.10.100"
//! host_type_lab: "192.168.1."
//! projects:
//!   web:
//!     src: ~/code/web
//!     dest: /opt/web
//!     exclude: [.git, target]
//!     delete: 1
//! ```
//!
use crate::core::constants::{self, ssh::DEFAULT_PORT};
use crate::core::error::{PlumError, Result};
use anyhow::Context;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HOST_TYPE_PREFIX: &str = "host_type_";

/// Default ssh credentials used when a host is given as IP shorthand.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DefaultSshConf {
    pub user: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub identityfile: String,
}

/// One rsync project (`projects.<name>`).
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Local paths. A single string is accepted as a one-element list.
    #[serde(default, deserialize_with = "one_or_many")]
    pub src: Vec<String>,
    /// Remote path.
    #[serde(default)]
    pub dest: Option<String>,
    /// rsync `--exclude` patterns.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Delete remote files that are not part of the transfer. Accepts `true`/`false` or `1`/`0`.
    #[serde(default, deserialize_with = "bool_or_int")]
    pub delete: bool,
}

/// File layout as written by the user, before validation.
#[derive(Deserialize, Debug)]
struct RawConfig {
    default_ssh_conf: DefaultSshConf,
    #[serde(default)]
    ipmi_interval: Option<u8>,
    #[serde(default)]
    projects: HashMap<String, ProjectConfig>,
    #[serde(flatten)]
    extra: HashMap<String, serde_yaml::Value>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub default_ssh_conf: DefaultSshConf,
    ipmi_interval: Option<u8>,
    projects: HashMap<String, ProjectConfig>,
    host_types: HashMap<String, String>,
    path: PathBuf,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

fn bool_or_int<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

/// `$HOME/.plum_tools.yaml`.
pub fn default_config_path() -> Result<PathBuf> {
    home_file(constants::CONFIG_FILE_NAME)
}

/// `$HOME/.ssh/config`.
pub fn default_ssh_config_path() -> Result<PathBuf> {
    home_file(constants::SSH_CONFIG_FILE_NAME)
}

fn home_file(name: &str) -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PlumError::Config("Could not determine the home directory".into()))?;
    Ok(home.join(name))
}

/// Loads and validates the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.is_file() {
        return Err(PlumError::Config(format!(
            "Configuration file {} does not exist",
            path.display()
        ))
        .into());
    }
    info!("Loading configuration from: {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    let config = Config::from_yaml_str(&content, path)?;
    debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

impl Config {
    /// Parses and validates YAML content. `path` is only used in messages.
    pub fn from_yaml_str(content: &str, path: &Path) -> Result<Config> {
        let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| {
            PlumError::Config(format!("{} has an invalid format: {}", path.display(), e))
        })?;
        Ok(validate_and_build(raw, path)?)
    }

    /// Path the configuration was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// IP prefix configured for `host_type_<host_type>`.
    pub fn prefix_for(&self, host_type: &str) -> std::result::Result<&str, PlumError> {
        let key = format!("{}{}", HOST_TYPE_PREFIX, host_type);
        self.host_types
            .get(&key)
            .map(String::as_str)
            .ok_or_else(|| PlumError::MissingKey {
                path: self.path.clone(),
                key,
            })
    }

    /// Offset between a host's last octet and its IPMI address.
    pub fn ipmi_interval(&self) -> std::result::Result<u8, PlumError> {
        self.ipmi_interval.ok_or_else(|| PlumError::MissingKey {
            path: self.path.clone(),
            key: "ipmi_interval".into(),
        })
    }

    pub fn project(&self, name: &str) -> Option<&ProjectConfig> {
        self.projects.get(name)
    }
}

fn validate_and_build(raw: RawConfig, path: &Path) -> std::result::Result<Config, PlumError> {
    let mut host_types = HashMap::new();
    for (key, value) in raw.extra {
        if !key.starts_with(HOST_TYPE_PREFIX) {
            return Err(PlumError::Config(format!(
                "{}: unknown key '{}', extra keys must start with '{}'",
                path.display(),
                key,
                HOST_TYPE_PREFIX
            )));
        }
        match value {
            serde_yaml::Value::String(prefix) => {
                host_types.insert(key, prefix);
            }
            other => {
                return Err(PlumError::Config(format!(
                    "{}: value of '{}' must be a string, got {:?} (quote it)",
                    path.display(),
                    key,
                    other
                )));
            }
        }
    }

    let mut default_ssh_conf = raw.default_ssh_conf;
    default_ssh_conf.identityfile = expand(&default_ssh_conf.identityfile);

    let mut projects = raw.projects;
    for project in projects.values_mut() {
        project.src = project.src.iter().map(|s| expand(s)).collect();
    }

    Ok(Config {
        default_ssh_conf,
        ipmi_interval: raw.ipmi_interval,
        projects,
        host_types,
        path: path.to_path_buf(),
    })
}

fn expand(path: &str) -> String {
    shellexpand::tilde(path).into_owned()
}
