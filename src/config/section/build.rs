//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! tech = "xslt"                 # Technology (only "xslt" ships)
//! source = "?.xsl"              # Source file inside a node, `?` = node name
//! target = "?.freeze.xsl"       # Output file inside a node
//! wait_for_targets = []         # Same-node targets to await first
//! wait_timeout = 30             # Seconds to wait for targets
//!
//! [build.wait_for_node_targets]
//! "pages/common" = ["?.css"]    # Other node -> targets
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::scheduler::expand_pattern;

/// Technologies this build knows how to construct.
pub const TECHNOLOGIES: &[&str] = &["xslt"];

const TECH: FieldPath = FieldPath::new("build.tech");
const SOURCE: FieldPath = FieldPath::new("build.source");
const TARGET: FieldPath = FieldPath::new("build.target");
const WAIT_TIMEOUT: FieldPath = FieldPath::new("build.wait_timeout");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub tech: String,
    pub source: String,
    pub target: String,
    pub wait_for_targets: Vec<String>,
    pub wait_for_node_targets: FxHashMap<String, Vec<String>>,
    /// Seconds.
    pub wait_timeout: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            tech: "xslt".to_string(),
            source: "?.xsl".to_string(),
            target: "?.freeze.xsl".to_string(),
            wait_for_targets: Vec::new(),
            wait_for_node_targets: FxHashMap::default(),
            wait_timeout: 30,
        }
    }
}

impl BuildConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !TECHNOLOGIES.contains(&self.tech.as_str()) {
            diag.error_with_hint(
                TECH,
                format!("unknown technology `{}`", self.tech),
                format!("available: {}", TECHNOLOGIES.join(", ")),
            );
        }

        for (field, pattern) in [(SOURCE, &self.source), (TARGET, &self.target)] {
            if !pattern.contains('?') {
                diag.error_with_hint(
                    field,
                    format!("`{pattern}` does not contain `?`"),
                    "`?` stands for the node name, e.g. \"?.xsl\"",
                );
            }
        }
        if self.source == self.target {
            diag.error(TARGET, "target would overwrite the source");
        }

        if self.wait_timeout == 0 {
            diag.error(WAIT_TIMEOUT, "must be at least one second");
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout)
    }

    /// Source file of `node` (a directory under `root`).
    pub fn source_of(&self, root: &Path, node: &Path) -> PathBuf {
        root.join(node).join(expand_pattern(&self.source, node))
    }

    /// Output file of `node`.
    pub fn target_of(&self, root: &Path, node: &Path) -> PathBuf {
        root.join(node).join(expand_pattern(&self.target, node))
    }
}
