//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use portfoli::{AllocationTarget, Policy, PolicyRegistry, Symbol};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Config file looked up when `--config` isn't given.
pub const DEFAULT_CONFIG_FILE: &str = "portfoli.toml";

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub plan: PlanConfig,
    #[serde(default)]
    pub policies: Vec<PolicyConfig>,
}

/// Where to find the brokerage export.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Explicit export path; wins over directory discovery.
    pub path: Option<PathBuf>,
    /// Directory searched for the newest export. Defaults to `$HOME/Downloads`.
    pub downloads_dir: Option<PathBuf>,
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            path: None,
            downloads_dir: None,
            file_pattern: default_file_pattern(),
        }
    }
}

fn default_file_pattern() -> String {
    "Portfolio_Position".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfig {
    #[serde(default = "default_policy")]
    pub policy: String,
}

impl Default for PlanConfig {
    fn default() -> Self {
        PlanConfig {
            policy: default_policy(),
        }
    }
}

fn default_policy() -> String {
    "Swensen".into()
}

/// A user-defined policy.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    pub name: String,
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub symbol: String,
    pub weight: f64,
}

impl PolicyConfig {
    fn to_policy(&self) -> Result<Policy> {
        let targets = self
            .targets
            .iter()
            .map(|t| {
                let symbol = Symbol::try_new(&t.symbol).ok_or_else(|| {
                    Error::Config(format!(
                        "policy '{}': symbol '{}' must be 1-8 bytes",
                        self.name, t.symbol
                    ))
                })?;
                Ok(AllocationTarget {
                    symbol,
                    desired_percent: t.weight,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Policy::new(self.name.clone(), targets))
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Load `path` if given, else the default file if present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Config::default()),
        }
    }

    /// Parse and validate from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.input.file_pattern.is_empty() {
            return Err(Error::Config("input.file_pattern must not be empty".into()));
        }
        if self.plan.policy.is_empty() {
            return Err(Error::Config("plan.policy must not be empty".into()));
        }
        for p in &self.policies {
            if p.name.is_empty() {
                return Err(Error::Config("policy name must not be empty".into()));
            }
            p.to_policy()?.validate()?;
        }
        Ok(())
    }

    /// Built-in policies plus the ones declared in `[[policies]]`.
    pub fn registry(&self) -> Result<PolicyRegistry> {
        let mut registry = PolicyRegistry::new();
        for p in &self.policies {
            registry.register(p.to_policy()?)?;
        }
        Ok(registry)
    }

    /// Directory searched for the newest export.
    pub fn downloads_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.input.downloads_dir {
            return Ok(dir.clone());
        }
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join("Downloads"))
            .ok_or_else(|| {
                Error::Config("HOME is not set; configure input.downloads_dir".into())
            })
    }
}
