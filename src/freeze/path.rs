//! Path arithmetic for freezing.
//!
//! All functions here are lexical: nothing touches the filesystem, so a
//! reference resolves the same way whether or not its target exists yet.

use std::path::{Component, Path, PathBuf};

/// Suffix of a file name: every dot-segment after the first.
///
/// ```ignore
/// suffix_of(Path::new("/foo/bz.xx.cc.vv")) // "xx.cc.vv"
/// suffix_of(Path::new("/foo/bar"))         // ""
/// ```
pub fn suffix_of(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    name.split_once('.')
        .map(|(_, suffix)| suffix.to_string())
        .unwrap_or_default()
}

/// File name of a frozen artifact: `<digest>.<suffix>`.
#[inline]
pub fn frozen_name(digest: &str, suffix: &str) -> String {
    format!("{digest}.{suffix}")
}

/// Resolve a reference tail against `base`.
///
/// A leading `/` is dropped first, so `/css/a.css` and `css/a.css` resolve
/// identically. `.` and `..` are folded away.
pub fn resolve_freezable(base: &Path, tail: &str) -> PathBuf {
    let tail = tail.strip_prefix('/').unwrap_or(tail);
    normalize(&base.join(tail))
}

/// Lexically fold `.` and `..` components.
///
/// `..` at the root stays at the root, matching how absolute paths resolve.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Directory containing `path` (empty for bare names).
#[inline]
pub fn dir_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// `target` relative to the directory `base`, with `/` separators.
pub fn relative_to(base: &Path, target: &Path) -> String {
    let relative = pathdiff::diff_paths(normalize(target), normalize(base))
        .unwrap_or_else(|| target.to_path_buf());
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Default path written back into a carrier for a frozen file.
///
/// A root build (`parent == carrier`) keeps the frozen copy reachable from
/// the carrier's own directory. Inside nested carriers the path is relative
/// to `freeze_dir`, the freeze directory of the frozen file's suffix.
pub fn default_freeze_path(
    parent: &Path,
    carrier: &Path,
    frozen: &Path,
    freeze_dir: &Path,
) -> String {
    if parent == carrier {
        relative_to(&dir_of(carrier), frozen)
    } else {
        relative_to(freeze_dir, frozen)
    }
}
