//! `[freeze]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [freeze]
//! dir = "freeze"                  # Default freeze directory (relative to root)
//! hash = "sha1"                   # sha1 | sha256 | blake3
//! digest = "hex"                  # hex | alphanum
//! encoding = "utf-8"              # utf-8 | latin1
//! debug = false                   # Annotate rewritten references
//! url_prefix = "//static.example.org/"
//! url_suffixes = ["css", "js"]    # Written as `<url_prefix><frozen name>`
//!
//! [freeze.dirs]
//! css = "freeze/css"              # Per-suffix directory, matched by suffix tail
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::digest::{Checksum, DigestEncoding, HashAlgorithm};
use crate::freeze::path::suffix_of;
use crate::freeze::{FreezeDirFn, FreezePathFn};
use crate::fs::TextEncoding;

const DIR: FieldPath = FieldPath::new("freeze.dir");
const DIRS: FieldPath = FieldPath::new("freeze.dirs");
const URL_PREFIX: FieldPath = FieldPath::new("freeze.url_prefix");
const URL_SUFFIXES: FieldPath = FieldPath::new("freeze.url_suffixes");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreezeSectionConfig {
    pub dir: PathBuf,
    pub dirs: BTreeMap<String, PathBuf>,
    pub hash: HashAlgorithm,
    pub digest: DigestEncoding,
    pub encoding: TextEncoding,
    /// Annotation comments end up in published files, so they stay off
    /// unless requested.
    pub debug: bool,
    pub url_prefix: String,
    pub url_suffixes: Vec<String>,
}

impl Default for FreezeSectionConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("freeze"),
            dirs: BTreeMap::new(),
            hash: HashAlgorithm::default(),
            digest: DigestEncoding::default(),
            encoding: TextEncoding::default(),
            debug: false,
            url_prefix: String::new(),
            url_suffixes: Vec::new(),
        }
    }
}

/// `suffix` is `tail` or ends with `.<tail>`.
fn suffix_matches(suffix: &str, tail: &str) -> bool {
    suffix == tail
        || suffix
            .strip_suffix(tail)
            .is_some_and(|head| head.ends_with('.'))
}

impl FreezeSectionConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.dir.as_os_str().is_empty() {
            diag.error(DIR, "freeze directory must not be empty");
        }
        for (suffix, dir) in &self.dirs {
            if suffix.is_empty() || suffix.starts_with('.') {
                diag.error_with_hint(
                    DIRS,
                    format!("invalid suffix `{suffix}`"),
                    "use the suffix without a leading dot, e.g. css = \"freeze/css\"",
                );
            }
            if dir.as_os_str().is_empty() {
                diag.error(DIRS, format!("directory for `{suffix}` must not be empty"));
            }
        }

        match (self.url_prefix.is_empty(), self.url_suffixes.is_empty()) {
            (true, false) => diag.error(URL_PREFIX, "required when `url_suffixes` is set"),
            (false, true) => diag.error_with_hint(
                URL_SUFFIXES,
                "`url_prefix` is set but applies to no suffix",
                "url_suffixes = [\"css\", \"js\"]",
            ),
            _ => {}
        }
    }

    pub fn checksum(&self) -> Checksum {
        Checksum::new(self.hash, self.digest)
    }

    /// Freeze directory resolver with every path made absolute against
    /// `root`. The longest matching `dirs` entry wins over `dir`.
    pub fn freeze_dir_fn(&self, root: &Path) -> FreezeDirFn {
        let resolve = |dir: &Path| {
            let expanded = shellexpand::tilde(&dir.to_string_lossy()).into_owned();
            root.join(expanded)
        };
        let default = resolve(&self.dir);
        let mut dirs: Vec<(String, PathBuf)> = self
            .dirs
            .iter()
            .map(|(suffix, dir)| (suffix.clone(), resolve(dir)))
            .collect();
        dirs.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Arc::new(move |suffix: &str| {
            let dir = dirs
                .iter()
                .find(|(tail, _)| suffix_matches(suffix, tail))
                .map_or(&default, |(_, dir)| dir);
            Some(dir.clone())
        })
    }

    /// Written-path override for `url_suffixes`, if configured.
    pub fn url_rewrite(&self) -> Option<FreezePathFn> {
        if self.url_prefix.is_empty() || self.url_suffixes.is_empty() {
            return None;
        }
        let prefix = self.url_prefix.clone();
        let tails = self.url_suffixes.clone();

        let rewrite: FreezePathFn = Arc::new(move |_parent: &Path, _carrier: &Path, frozen: &Path| {
            let suffix = suffix_of(frozen);
            if !tails.iter().any(|tail| suffix_matches(&suffix, tail)) {
                return None;
            }
            let name = frozen.file_name()?.to_string_lossy();
            Some(format!("{prefix}{name}"))
        });
        Some(rewrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_matches() {
        assert!(suffix_matches("css", "css"));
        assert!(suffix_matches("min.css", "css"));
        assert!(!suffix_matches("scss", "css"));
        assert!(!suffix_matches("css.map", "css"));
    }

    #[test]
    fn test_freeze_dir_fn() {
        let mut config = FreezeSectionConfig::default();
        config.dirs.insert("css".into(), PathBuf::from("freeze/css"));
        config.dirs.insert("min.css".into(), PathBuf::from("freeze/min"));
        config.dirs.insert("png".into(), PathBuf::from("/abs/png"));

        let dir_of = config.freeze_dir_fn(Path::new("/site"));
        assert_eq!(dir_of("xsl"), Some(PathBuf::from("/site/freeze")));
        assert_eq!(dir_of("css"), Some(PathBuf::from("/site/freeze/css")));
        assert_eq!(dir_of("min.css"), Some(PathBuf::from("/site/freeze/min")));
        assert_eq!(dir_of("ie.min.css"), Some(PathBuf::from("/site/freeze/min")));
        assert_eq!(dir_of("png"), Some(PathBuf::from("/abs/png")));
    }

    #[test]
    fn test_url_rewrite() {
        let config = FreezeSectionConfig {
            url_prefix: "//example.org/".to_string(),
            url_suffixes: vec!["css".to_string(), "js".to_string()],
            ..FreezeSectionConfig::default()
        };
        let rewrite = config.url_rewrite().unwrap();
        let (a, b) = (Path::new("/a.xsl"), Path::new("/b.xsl"));

        assert_eq!(
            rewrite(a, b, Path::new("/site/freeze/abc.min.css")).as_deref(),
            Some("//example.org/abc.min.css")
        );
        assert_eq!(rewrite(a, b, Path::new("/site/freeze/abc.xsl")), None);
        assert!(FreezeSectionConfig::default().url_rewrite().is_none());
    }

    #[test]
    fn test_validate() {
        let mut diag = ConfigDiagnostics::new();
        FreezeSectionConfig::default().validate(&mut diag);
        assert!(diag.is_empty());

        let mut config = FreezeSectionConfig {
            dir: PathBuf::new(),
            url_suffixes: vec!["css".to_string()],
            ..FreezeSectionConfig::default()
        };
        config.dirs.insert(".css".into(), PathBuf::from("x"));
        config.validate(&mut diag);

        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["freeze.dir", "freeze.dirs", "freeze.url_prefix"]);
    }
}
