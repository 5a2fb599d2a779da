//! Project configuration from `freeze.toml`.
//!
//! ```text
//! config/
//! ├── section/       # [build], [freeze], [grammar]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # config file discovery
//! └── mod.rs         # FreezeConfig (this file)
//! ```
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[build]`   | technology, node source/target, target waiting   |
//! | `[freeze]`  | freeze directories, checksum, encoding, URLs     |
//! | `[grammar]` | comment syntax                                   |
//!
//! The project root is the directory containing the config file; every
//! relative path in the file resolves against it.

pub mod section;
pub mod types;
mod util;

pub use section::{BuildConfig, FreezeSectionConfig, GrammarConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};
pub use util::{find_config_file, find_config_file_from};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::debug;
use crate::freeze::FreezeOptions;
use crate::scheduler::PollingGate;
use crate::tech::XsltTech;

/// Root configuration structure representing `freeze.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FreezeConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root, parent of the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub freeze: FreezeSectionConfig,

    #[serde(default)]
    pub grammar: GrammarConfig,
}

impl FreezeConfig {
    /// Search upward from the working directory for `config_name`.
    ///
    /// Without a config file, defaults apply with the working directory as
    /// the project root.
    pub fn load(config_name: &Path) -> Result<Self> {
        match find_config_file(config_name) {
            Some(path) => Self::from_path(&path),
            None => {
                let cwd = std::env::current_dir()
                    .context("Failed to get current working directory")?;
                debug!("config"; "`{}` not found, using defaults", config_name.display());
                Ok(Self {
                    root: cwd,
                    ..Self::default()
                })
            }
        }
    }

    /// Load and validate the config at `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let (mut config, ignored) = Self::parse_with_ignored(&content)?;

        config.config_path = path.to_path_buf();
        config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut diag = config.diagnostics();
        for field in ignored {
            diag.unknown_field(field);
        }
        diag.report_unknown_fields();
        diag.into_result().map_err(ConfigError::Diagnostics)?;

        Ok(config)
    }

    /// Parse TOML content without validating it.
    pub fn from_str(content: &str) -> Result<Self> {
        Ok(Self::parse_with_ignored(content)?.0)
    }

    /// Parse TOML content, collecting unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Check every section, failing once with all problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.diagnostics()
            .into_result()
            .map_err(ConfigError::Diagnostics)
    }

    fn diagnostics(&self) -> ConfigDiagnostics {
        let mut diag = ConfigDiagnostics::new();
        self.build.validate(&mut diag);
        self.freeze.validate(&mut diag);
        self.grammar.validate(&mut diag);
        diag
    }

    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Engine options with every path resolved against the root.
    pub fn options(&self) -> FreezeOptions {
        let mut options = FreezeOptions::new(self.freeze.freeze_dir_fn(&self.root))
            .checksum(self.freeze.checksum())
            .encoding(self.freeze.encoding)
            .debug(self.freeze.debug)
            .wait_for(
                self.build.wait_for_targets.clone(),
                self.build.wait_for_node_targets.clone(),
            );
        options.block_comments = self.grammar.block_comments.clone();
        options.line_comment = self.grammar.line_comment().map(str::to_string);
        options.freeze_path_postprocess = self.freeze.url_rewrite();
        options
    }

    /// The configured technology, rooted at the project root.
    pub fn technology(&self) -> XsltTech {
        XsltTech::new(&self.root)
    }

    /// Gate that polls for `wait_for_*` targets under the root.
    pub fn gate(&self) -> PollingGate {
        PollingGate::new(&self.root, self.build.wait_timeout())
    }
}
