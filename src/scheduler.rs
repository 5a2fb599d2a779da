//! Gate between a build and the targets it depends on.
//!
//! A build node is a directory under the project root (`pages/index`).
//! Target names are patterns where `?` stands for the node's base name, so
//! `?.css` in `pages/index` is `pages/index/index.css`.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::debug;
use crate::freeze::{FreezeError, Result};

/// Expand `?` in `pattern` to the base name of `node`.
pub fn expand_pattern(pattern: &str, node: &Path) -> String {
    let name = node
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    pattern.replace('?', &name)
}

/// Every target path a gated build waits for, relative to the project root.
pub fn expand_targets(
    node: &Path,
    targets: &[String],
    node_targets: &FxHashMap<String, Vec<String>>,
) -> Vec<PathBuf> {
    let own = targets
        .iter()
        .map(|target| node.join(expand_pattern(target, node)));

    let mut others: Vec<_> = node_targets.iter().collect();
    others.sort_by(|a, b| a.0.cmp(b.0));
    let others = others.into_iter().flat_map(|(other, targets)| {
        let other = Path::new(other);
        targets
            .iter()
            .map(move |target| other.join(expand_pattern(target, other)))
    });

    own.chain(others).collect()
}

/// Blocks a build until the targets it depends on are ready.
pub trait TargetGate: Send + Sync {
    fn wait(
        &self,
        node: &Path,
        targets: &[String],
        node_targets: &FxHashMap<String, Vec<String>>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Gate for builds with no external producers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWait;

impl TargetGate for NoWait {
    async fn wait(
        &self,
        _node: &Path,
        _targets: &[String],
        _node_targets: &FxHashMap<String, Vec<String>>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Polls the disk until every target exists.
#[derive(Debug, Clone)]
pub struct PollingGate {
    pub root: PathBuf,
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollingGate {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            interval: Duration::from_millis(50),
            timeout,
        }
    }

    async fn wait_for(&self, target: PathBuf) -> Result<()> {
        let path = self.root.join(&target);
        let poll = async {
            while !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                tokio::time::sleep(self.interval).await;
            }
        };
        tokio::time::timeout(self.timeout, poll)
            .await
            .map_err(|_| FreezeError::TargetTimeout { target })
    }
}

impl TargetGate for PollingGate {
    async fn wait(
        &self,
        node: &Path,
        targets: &[String],
        node_targets: &FxHashMap<String, Vec<String>>,
    ) -> Result<()> {
        for target in expand_targets(node, targets, node_targets) {
            debug!("wait"; "{}", target.display());
            self.wait_for(target).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_expand_pattern() {
        let node = Path::new("pages/index");
        assert_eq!(expand_pattern("?.css", node), "index.css");
        assert_eq!(expand_pattern("_?.min.?", node), "_index.min.index");
        assert_eq!(expand_pattern("static.js", node), "static.js");
    }

    #[test]
    fn test_expand_targets() {
        let mut node_targets = FxHashMap::default();
        node_targets.insert("pages/common".to_string(), vec!["?.js".to_string()]);
        node_targets.insert("bundles/all".to_string(), vec!["?.css".to_string()]);

        let targets = expand_targets(
            Path::new("pages/index"),
            &["?.css".to_string()],
            &node_targets,
        );
        assert_eq!(
            targets,
            vec![
                PathBuf::from("pages/index/index.css"),
                PathBuf::from("bundles/all/all.css"),
                PathBuf::from("pages/common/common.js"),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_wait() {
        let targets = ["?.css".to_string()];
        NoWait
            .wait(Path::new("pages/index"), &targets, &FxHashMap::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_polling_gate() {
        let dir = TempDir::new().unwrap();
        let node = dir.path().join("pages/index");
        std::fs::create_dir_all(&node).unwrap();
        std::fs::write(node.join("index.css"), "").unwrap();

        let gate = PollingGate::new(dir.path(), Duration::from_secs(1));
        let targets = ["?.css".to_string()];
        gate.wait(Path::new("pages/index"), &targets, &FxHashMap::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_polling_gate_waits_for_late_target() {
        let dir = TempDir::new().unwrap();
        let node = dir.path().join("pages/index");
        std::fs::create_dir_all(&node).unwrap();

        let late = node.join("index.css");
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tokio::fs::write(late, "").await.unwrap();
        });

        let mut gate = PollingGate::new(dir.path(), Duration::from_secs(5));
        gate.interval = Duration::from_millis(10);
        let targets = ["?.css".to_string()];
        gate.wait(Path::new("pages/index"), &targets, &FxHashMap::default())
            .await
            .unwrap();
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_polling_gate_timeout() {
        let dir = TempDir::new().unwrap();
        let mut gate = PollingGate::new(dir.path(), Duration::from_millis(50));
        gate.interval = Duration::from_millis(10);

        let err = gate
            .wait(Path::new("pages/index"), &["?.css".to_string()], &FxHashMap::default())
            .await
            .unwrap_err();
        match err {
            FreezeError::TargetTimeout { target } => {
                assert_eq!(target, PathBuf::from("pages/index/index.css"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
