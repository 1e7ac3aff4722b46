//! Configuration management for `gh-publish.toml`.
//!
//! The file is optional; every field has a default.
//!
//! # Sections
//!
//! | Section     | Purpose                                           |
//! |-------------|---------------------------------------------------|
//! | `[deploy]`  | Pages branch, commit message, staging rules       |
//! | `[tools]`   | How to invoke `git` and `gh`                      |
//! | `[network]` | Reachability probe target and timeouts            |
//!
//! # Example
//!
//! ```toml
//! [deploy]
//! branch = "gh-pages"
//! build_dirs = ["dist"]
//!
//! [tools]
//! gh = ["~/.local/bin/gh"]
//!
//! [network]
//! timeout = 3
//! ```

pub mod defaults;
mod deploy;
mod error;
mod tools;

pub use deploy::DeployConfig;
pub use error::ConfigError;
pub use tools::{NetworkConfig, ToolsConfig};

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

/// Root configuration structure representing gh-publish.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// Project root directory (absolute after `update_with_cli`)
    #[serde(skip)]
    #[educe(Default = defaults::root())]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Answer prompts with their defaults
    #[serde(skip)]
    pub assume_yes: bool,

    /// Log every external command
    #[serde(skip)]
    pub verbose: bool,

    /// Deployment settings
    #[serde(default)]
    pub deploy: DeployConfig,

    /// External tool commands
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Network checks
    #[serde(default)]
    pub network: NetworkConfig,
}

impl PublishConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: PublishConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli.root.clone().unwrap_or_else(|| self.root.clone());
        self.root = Self::normalize_path(&root);
        self.config_path = Self::normalize_path(&self.root.join(&cli.config));
        self.assume_yes = cli.yes;
        self.verbose = cli.verbose;

        if let Commands::Deploy {
            force,
            manual,
            branch,
        } = &cli.command
        {
            self.deploy.force |= *force;
            self.deploy.native &= !*manual;
            Self::update_option(&mut self.deploy.branch, branch.as_ref());
        }

        Self::expand_command(&mut self.tools.git);
        Self::expand_command(&mut self.tools.gh);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Expand a leading `~` in the program of a tool command
    fn expand_command(command: &mut [String]) {
        if let Some(program) = command.first_mut() {
            *program = shellexpand::tilde(program).into_owned();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            bail!(ConfigError::Validation(format!(
                "project root `{}` is not a directory",
                self.root.display()
            )));
        }

        Self::check_command("[tools.git]", &self.tools.git)?;
        Self::check_command("[tools.gh]", &self.tools.gh)?;

        let branch = self.deploy.branch.trim();
        if branch.is_empty() || branch.contains(char::is_whitespace) {
            bail!(ConfigError::Validation(
                "[deploy.branch] must be a non-empty branch name without spaces".into()
            ));
        }

        if self.deploy.message.trim().is_empty() {
            bail!(ConfigError::Validation(
                "[deploy.message] must not be empty".into()
            ));
        }

        if let Some(dir) = self
            .deploy
            .build_dirs
            .iter()
            .chain(&self.deploy.asset_dirs)
            .find(|dir| !Self::is_plain_relative(dir))
        {
            bail!(ConfigError::Validation(format!(
                "`{dir}` must be a relative path inside the project"
            )));
        }

        if self.network.timeout == 0 {
            bail!(ConfigError::Validation(
                "[network.timeout] must be at least 1 second".into()
            ));
        }

        Ok(())
    }

    /// Check a tool command has a program
    fn check_command(field: &str, command: &[String]) -> Result<()> {
        if command.first().is_none_or(|program| program.trim().is_empty()) {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        }
        Ok(())
    }

    /// A path made only of normal components (no `..`, no root)
    fn is_plain_relative(path: &str) -> bool {
        !path.is_empty()
            && Path::new(path)
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    }
}

// ============================================================================
// Tests
// ============================================================================
