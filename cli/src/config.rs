//! Configuration management for the voxbridge CLI.
//!
//! Configuration is stored in ~/.voxbridge/{app_name}/config.yaml as a set
//! of named contexts, each naming an RTP target and optional stream
//! parameters.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use voxbridge_rtpstream::StreamConfig;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".voxbridge";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Default RTP destination.
pub const DEFAULT_TARGET: &str = "127.0.0.1:5004";
/// Default local bind address.
pub const DEFAULT_BIND: &str = "0.0.0.0:0";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application name (not serialized).
    #[serde(skip)]
    pub app_name: String,

    /// Name of the currently active context.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,

    /// Map of context name to context configuration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contexts: BTreeMap<String, Context>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

/// Where and how one stream is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Context name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// RTP destination, `host:port`.
    #[serde(default = "default_target")]
    pub target: String,

    /// Local address the UDP socket binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Stream parameters; defaults apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamConfig>,
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

impl Default for Context {
    fn default() -> Self {
        Self {
            name: String::new(),
            target: default_target(),
            bind: default_bind(),
            stream: None,
        }
    }
}

impl Context {
    /// Creates a context sending to `target` with default settings.
    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    /// Returns the stream parameters, falling back to defaults.
    pub fn stream_config(&self) -> StreamConfig {
        self.stream.unwrap_or_default()
    }
}

impl Config {
    /// Gets the default config directory.
    pub fn default_config_dir(app_name: &str) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(app_name))
    }

    /// Gets the default config file path.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Self::default_config_dir(app_name).map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Adds or replaces a context.
    pub fn add_context(&mut self, name: &str, mut ctx: Context) -> anyhow::Result<()> {
        if name.is_empty() {
            anyhow::bail!("context name must not be empty");
        }
        ctx.name = name.to_string();
        self.contexts.insert(name.to_string(), ctx);
        self.save()
    }

    /// Deletes a context.
    pub fn delete_context(&mut self, name: &str) -> anyhow::Result<()> {
        if self.contexts.remove(name).is_none() {
            anyhow::bail!("context '{}' not found", name);
        }
        if self.current_context == name {
            self.current_context.clear();
        }
        self.save()
    }

    /// Sets the current context.
    pub fn use_context(&mut self, name: &str) -> anyhow::Result<()> {
        if !self.contexts.contains_key(name) {
            anyhow::bail!("context '{}' not found", name);
        }
        self.current_context = name.to_string();
        self.save()
    }

    /// Gets a specific context.
    pub fn get_context(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    /// Gets the current context.
    pub fn get_current_context(&self) -> Option<&Context> {
        if self.current_context.is_empty() {
            return None;
        }
        self.contexts.get(&self.current_context)
    }

    /// Resolves the context by name, or current context if name is empty.
    pub fn resolve_context(&self, name: Option<&str>) -> Option<&Context> {
        match name {
            Some(n) if !n.is_empty() => self.get_context(n),
            _ => self.get_current_context(),
        }
    }

    /// Lists all context names in sorted order.
    pub fn list_contexts(&self) -> Vec<&str> {
        self.contexts.keys().map(|s| s.as_str()).collect()
    }
}

fn config_path(app_name: &str, custom_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    match custom_path {
        Some(p) => Ok(p.to_path_buf()),
        None => Config::default_config_path(app_name)
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path")),
    }
}

/// Loads configuration for the specified app, creating an empty file if
/// none exists yet.
pub fn load_config(app_name: &str, custom_path: Option<&Path>) -> anyhow::Result<Config> {
    let config_path = config_path(app_name, custom_path)?;

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cfg = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        }
    } else {
        let cfg = Config::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.app_name = app_name.to_string();
    cfg.config_path = config_path;

    Ok(cfg)
}

/// Saves configuration to the specified path.
pub fn save_config(app_name: &str, config: &Config, custom_path: Option<&Path>) -> anyhow::Result<()> {
    let config_path = config_path(app_name, custom_path)?;

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(&config_path, serde_yaml::to_string(config)?)?;
    Ok(())
}
