//! Filesystem access consumed by the freezer.
//!
//! - [`TokioFs`] - the real disk, through `tokio::fs`
//! - [`MemoryFs`] - an in-memory tree for embedding and tests
//!
//! Both are cheap to clone and safe to share between sub-build tasks.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};

use crate::freeze::{FreezeError, Result};

// ============================================================================
// Text encoding
// ============================================================================

/// Encoding used for every read and write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "latin1", alias = "binary")]
    Latin1,
}

impl TextEncoding {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin1",
        }
    }

    pub fn decode(self, path: &Path, bytes: Vec<u8>) -> Result<String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes).map_err(|_| self.error(path)),
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }

    pub fn encode(self, path: &Path, text: &str) -> Result<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| self.error(path)))
                .collect(),
        }
    }

    fn error(self, path: &Path) -> FreezeError {
        FreezeError::Encoding {
            path: path.to_path_buf(),
            encoding: self.as_str(),
        }
    }
}

// ============================================================================
// FileSystem
// ============================================================================

/// Narrow async filesystem interface.
pub trait FileSystem: Clone + Send + Sync + 'static {
    fn exists(&self, path: &Path) -> impl Future<Output = bool> + Send;

    fn read(&self, path: &Path) -> impl Future<Output = io::Result<Vec<u8>>> + Send;

    /// Create `path` and its parents; succeeds if it already exists.
    fn make_dir(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;

    fn write(&self, path: &Path, content: &[u8]) -> impl Future<Output = io::Result<()>> + Send;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

impl FileSystem for TokioFs {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn make_dir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, content).await
    }
}

/// In-memory filesystem keyed by absolute path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: Arc<DashMap<PathBuf, Vec<u8>>>,
    dirs: Arc<DashSet<PathBuf>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file (parents become directories).
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        let path = path.into();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Read a file back as UTF-8.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes.value()).into_owned())
    }

    /// All file paths under `dir`, sorted.
    pub fn files_in(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let mut files: Vec<_> = self
            .files
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|path| path.starts_with(dir.as_ref()))
            .collect();
        files.sort();
        files
    }

    fn add_parents(&self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl FileSystem for MemoryFs {
    async fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path)
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .map(|bytes| bytes.value().clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    async fn make_dir(&self, path: &Path) -> io::Result<()> {
        if self.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("`{}` is a file", path.display()),
            ));
        }
        self.add_parents(path);
        self.dirs.insert(path.to_path_buf());
        Ok(())
    }

    async fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let parent_exists = path
            .parent()
            .is_none_or(|parent| parent.as_os_str().is_empty() || self.dirs.contains(parent));
        if !parent_exists {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no directory for `{}`", path.display()),
            ));
        }
        self.files.insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_latin1_roundtrip() {
        let path = Path::new("/x.txt");
        let bytes = vec![0x63, 0x61, 0x66, 0xe9];
        let text = TextEncoding::Latin1.decode(path, bytes.clone()).unwrap();
        assert_eq!(text, "café");
        assert_eq!(TextEncoding::Latin1.encode(path, &text).unwrap(), bytes);

        let err = TextEncoding::Latin1.encode(path, "€").unwrap_err();
        assert!(matches!(err, FreezeError::Encoding { .. }));
    }

    #[test]
    fn test_utf8_rejects_invalid() {
        let err = TextEncoding::Utf8
            .decode(Path::new("/bad"), vec![0xff, 0xfe])
            .unwrap_err();
        assert!(err.to_string().contains("utf-8"));
    }

    #[tokio::test]
    async fn test_memory_fs() {
        let fs = MemoryFs::new();
        fs.insert("/blocks/a.css", "body {}");

        assert!(fs.exists(Path::new("/blocks/a.css")).await);
        assert!(fs.exists(Path::new("/blocks")).await);
        assert!(!fs.exists(Path::new("/freeze")).await);

        // Writing needs the directory first
        assert!(fs.write(Path::new("/freeze/x.css"), b"x").await.is_err());
        fs.make_dir(Path::new("/freeze")).await.unwrap();
        fs.make_dir(Path::new("/freeze")).await.unwrap();
        fs.write(Path::new("/freeze/x.css"), b"x").await.unwrap();

        assert_eq!(fs.get("/freeze/x.css").as_deref(), Some("x"));
        assert_eq!(fs.read(Path::new("/blocks/a.css")).await.unwrap(), b"body {}");
        assert_eq!(
            fs.read(Path::new("/nope")).await.unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(fs.files_in("/freeze"), vec![PathBuf::from("/freeze/x.css")]);
    }

    #[tokio::test]
    async fn test_tokio_fs() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        let file = nested.join("c.txt");

        assert!(!TokioFs.exists(&file).await);
        TokioFs.make_dir(&nested).await.unwrap();
        TokioFs.make_dir(&nested).await.unwrap();
        TokioFs.write(&file, b"content").await.unwrap();

        assert!(TokioFs.exists(&file).await);
        assert_eq!(TokioFs.read(&file).await.unwrap(), b"content");
    }
}
