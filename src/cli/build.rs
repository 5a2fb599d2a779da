//! `build` and `freeze` commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::FreezeConfig;
use crate::freeze::{Freezer, path::normalize};
use crate::logger::BuildProgress;
use crate::scheduler::{NoWait, TargetGate};
use crate::tech::XsltTech;
use crate::{debug, log};

fn freezer(config: &FreezeConfig) -> Result<Freezer<XsltTech>> {
    Freezer::new(config.technology(), config.options()).context("invalid freeze options")
}

/// Build every node's source into its target.
///
/// Nodes are built one after another; each build fans out internally.
pub async fn build_nodes(config: &FreezeConfig, nodes: &[PathBuf], wait: bool) -> Result<()> {
    let freezer = freezer(config)?;
    let progress = BuildProgress::new(nodes.len());

    for node in nodes {
        progress.start(node);
        let target = if wait {
            build_node(config, &freezer, &config.gate(), node).await
        } else {
            build_node(config, &freezer, &NoWait, node).await
        };
        let target = target.with_context(|| format!("failed to build node `{}`", node.display()))?;
        debug!("build"; "{} -> {}", node.display(), target.display());
        progress.complete();
    }

    drop(progress);
    log!("build"; "{} built", plural_count(nodes.len(), "node"));
    Ok(())
}

async fn build_node<G: TargetGate>(
    config: &FreezeConfig,
    freezer: &Freezer<XsltTech>,
    gate: &G,
    node: &Path,
) -> Result<PathBuf> {
    let source = config.build.source_of(&config.root, node);
    let target = config.build.target_of(&config.root, node);

    let content = freezer.build_with_gate(gate, node, source).await?;
    let bytes = freezer.options().encoding.encode(&target, &content)?;
    tokio::fs::write(&target, bytes)
        .await
        .with_context(|| format!("failed to write `{}`", target.display()))?;
    Ok(target)
}

/// Build `file`, freeze the result and return the frozen path.
pub async fn freeze_file(config: &FreezeConfig, file: &Path) -> Result<PathBuf> {
    let source = normalize(&std::path::absolute(file)?);
    let (frozen, _) = freezer(config)?
        .build_and_freeze(source)
        .await
        .with_context(|| format!("failed to freeze `{}`", file.display()))?;
    Ok(frozen)
}

/// `1 node`, `3 nodes`.
fn plural_count(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> (TempDir, FreezeConfig) {
        let dir = TempDir::new().unwrap();
        let node = dir.path().join("pages/index");
        std::fs::create_dir_all(&node).unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::write(
            node.join("index.xsl"),
            "<xsl:import href=\"blocks.xsl\"/>\n<link href=\"/css/site.css\"/>\n",
        )
        .unwrap();
        std::fs::write(node.join("blocks.xsl"), "<!-- blocks -->\n").unwrap();
        std::fs::write(dir.path().join("css/site.css"), "body {}\n").unwrap();

        let config = FreezeConfig {
            root: dir.path().to_path_buf(),
            ..FreezeConfig::default()
        };
        (dir, config)
    }

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(1, "node"), "1 node");
        assert_eq!(plural_count(2, "node"), "2 nodes");
    }

    #[tokio::test]
    async fn test_build_nodes_writes_target() {
        let (dir, config) = site();
        build_nodes(&config, &[PathBuf::from("pages/index")], false)
            .await
            .unwrap();

        let target = dir.path().join("pages/index/index.freeze.xsl");
        let content = std::fs::read_to_string(target).unwrap();
        assert!(content.starts_with("<xsl:import href=\"../../freeze/"));
        assert!(!content.contains("site.css"));
        assert_eq!(std::fs::read_dir(dir.path().join("freeze")).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_build_nodes_waits_for_targets() {
        let (dir, mut config) = site();
        config.build.wait_for_targets = vec!["?.css".to_string()];
        config.build.wait_timeout = 1;

        let err = build_nodes(&config, &[PathBuf::from("pages/index")], true)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("index.css"));

        std::fs::write(dir.path().join("pages/index/index.css"), "").unwrap();
        build_nodes(&config, &[PathBuf::from("pages/index")], true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_freeze_file() {
        let (dir, config) = site();
        let frozen = freeze_file(&config, &dir.path().join("pages/index/index.xsl"))
            .await
            .unwrap();

        assert_eq!(frozen.parent(), Some(dir.path().join("freeze").as_path()));
        assert!(frozen.to_string_lossy().ends_with(".xsl"));
        assert!(frozen.exists());
    }
}
