//! Engine configuration, validated once when a [`Freezer`](super::Freezer)
//! is constructed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::error::{FreezeError, Result};
use crate::digest::Checksum;
use crate::fs::TextEncoding;

/// Resolves the absolute freeze directory for a suffix.
pub type FreezeDirFn = Arc<dyn Fn(&str) -> Option<PathBuf> + Send + Sync>;

/// Override for the path written back into a carrier:
/// `(parent, carrier, frozen_path) -> Some(written)` or `None` to decline.
pub type FreezePathFn = Arc<dyn Fn(&Path, &Path, &Path) -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub struct FreezeOptions {
    /// Freeze directory per suffix. Required; must yield absolute paths.
    pub freeze_dir: FreezeDirFn,
    /// Optional override for written reference paths.
    pub freeze_path_postprocess: Option<FreezePathFn>,
    pub checksum: Checksum,
    pub encoding: TextEncoding,
    /// Same-node targets to await before a gated build.
    pub wait_for_targets: Vec<String>,
    /// Other node → targets to await before a gated build.
    pub wait_for_node_targets: FxHashMap<String, Vec<String>>,
    /// Empty, or exactly `[start, end]`.
    pub block_comments: Vec<String>,
    pub line_comment: Option<String>,
    /// Annotate rewritten references with a comment line.
    ///
    /// Off unless asked for: the annotation lands in frozen output that is
    /// published as is.
    pub debug: bool,
}

impl FreezeOptions {
    pub fn new(freeze_dir: FreezeDirFn) -> Self {
        Self {
            freeze_dir,
            freeze_path_postprocess: None,
            checksum: Checksum::default(),
            encoding: TextEncoding::default(),
            wait_for_targets: Vec::new(),
            wait_for_node_targets: FxHashMap::default(),
            block_comments: Vec::new(),
            line_comment: None,
            debug: false,
        }
    }

    /// Every suffix freezes into the same directory.
    pub fn with_freeze_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self::new(Arc::new(move |_| Some(dir.clone())))
    }

    pub fn block_comments(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.block_comments = vec![start.into(), end.into()];
        self
    }

    pub fn line_comment(mut self, prefix: impl Into<String>) -> Self {
        self.line_comment = Some(prefix.into());
        self
    }

    pub fn checksum(mut self, checksum: Checksum) -> Self {
        self.checksum = checksum;
        self
    }

    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn freeze_path_postprocess<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path, &Path, &Path) -> Option<String> + Send + Sync + 'static,
    {
        self.freeze_path_postprocess = Some(Arc::new(f));
        self
    }

    pub fn wait_for(mut self, targets: Vec<String>, node_targets: FxHashMap<String, Vec<String>>) -> Self {
        self.wait_for_targets = targets;
        self.wait_for_node_targets = node_targets;
        self
    }

    /// Check option shapes that can be checked without a suffix.
    pub fn validate(&self) -> Result<()> {
        if !self.block_comments.is_empty() && self.block_comments.len() != 2 {
            return Err(FreezeError::config(format!(
                "block comments must be a pair, for example [\"/*\", \"*/\"], got {} item(s)",
                self.block_comments.len()
            )));
        }
        if self.block_comments.iter().any(String::is_empty) {
            return Err(FreezeError::config("block comment delimiters must not be empty"));
        }
        Ok(())
    }

    /// `(start, end)` when block comments are enabled.
    pub fn block_comment_pair(&self) -> Option<(&str, &str)> {
        match self.block_comments.as_slice() {
            [start, end] => Some((start.as_str(), end.as_str())),
            _ => None,
        }
    }

    /// Absolute freeze directory for `suffix`.
    pub fn freeze_dir_for(&self, suffix: &str) -> Result<PathBuf> {
        let dir = (self.freeze_dir)(suffix).ok_or_else(|| {
            FreezeError::config(format!("freeze directory was not specified for `{suffix}`"))
        })?;
        if dir.as_os_str().is_empty() {
            return Err(FreezeError::config(format!(
                "freeze directory was not specified for `{suffix}`"
            )));
        }
        if !dir.is_absolute() {
            return Err(FreezeError::config(format!(
                "freeze directory should be an absolute path, got `{}`",
                dir.display()
            )));
        }
        Ok(dir)
    }
}

impl fmt::Debug for FreezeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreezeOptions")
            .field("checksum", &self.checksum)
            .field("encoding", &self.encoding)
            .field("wait_for_targets", &self.wait_for_targets)
            .field("wait_for_node_targets", &self.wait_for_node_targets)
            .field("block_comments", &self.block_comments)
            .field("line_comment", &self.line_comment)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
