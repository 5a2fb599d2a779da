//! Recursive freeze pipeline.
//!
//! ```text
//! build(file)
//!   read ─► tokenize ─► fold ─► classify each token
//!                                 ├─ passthrough ─────────────────────┐
//!                                 ├─ recurse: build(ref) ─► freeze ───┤
//!                                 └─ freeze:  read(ref)  ─► freeze ───┤
//!                                                                     ▼
//!                               substitute frozen paths, reassemble in order
//! ```
//!
//! Matched references resolve concurrently (one task per reference, one per
//! token), but reassembly always follows document order. Frozen files are
//! content-addressed (`<digest>.<suffix>`), so concurrent writers of the
//! same content are harmless.

mod error;
pub mod options;
pub mod path;


use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::debug;
use crate::fs::{FileSystem, TokioFs};
use crate::grammar::{Grammar, Node, ast};
use crate::scheduler::TargetGate;
use crate::tech::{Technology, ValueContext};

pub use error::{FreezeError, Result};
pub use options::{FreezeDirFn, FreezeOptions, FreezePathFn};

/// Boxed build future, so builds can recurse through spawned tasks.
pub type BuildFuture = Pin<Box<dyn Future<Output = Result<String>> + Send + 'static>>;

/// Files currently being built, outermost first.
type Chain = Arc<[PathBuf]>;

// ============================================================================
// Results
// ============================================================================

/// A reference and the frozen file that replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezePair {
    pub original: String,
    pub frozen: PathBuf,
}

impl FreezePair {
    pub fn new(original: impl Into<String>, frozen: impl Into<PathBuf>) -> Self {
        Self {
            original: original.into(),
            frozen: frozen.into(),
        }
    }
}

/// Processed token: the node, its freeze pairs, and the raw references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezeResult {
    pub node: Node,
    pub pairs: Vec<FreezePair>,
    pub matches: Vec<String>,
}

impl FreezeResult {
    pub fn passthrough(node: Node) -> Self {
        Self {
            node,
            pairs: Vec::new(),
            matches: Vec::new(),
        }
    }
}

/// What happens to a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passthrough,
    /// Build each reference recursively, then freeze the result.
    Recurse(Vec<String>),
    /// Freeze each reference as it is on disk.
    Freeze(Vec<String>),
}

// ============================================================================
// Freezer
// ============================================================================

/// Freeze engine for one technology.
///
/// Cloning is cheap; clones share the technology, options and filesystem.
pub struct Freezer<T, F = TokioFs> {
    inner: Arc<Inner<T, F>>,
}

struct Inner<T, F> {
    tech: T,
    fs: F,
    options: FreezeOptions,
    grammar: Grammar,
}

impl<T, F> Clone for Freezer<T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Technology> Freezer<T, TokioFs> {
    /// Freezer over the real filesystem.
    pub fn new(tech: T, options: FreezeOptions) -> Result<Self> {
        Self::with_fs(tech, options, TokioFs)
    }
}

impl<T: Technology, F: FileSystem> Freezer<T, F> {
    /// Validate `options` and build the grammar once.
    pub fn with_fs(tech: T, options: FreezeOptions, fs: F) -> Result<Self> {
        options.validate()?;
        let grammar =
            Grammar::with_comments(options.block_comment_pair(), options.line_comment.as_deref());
        Ok(Self {
            inner: Arc::new(Inner {
                tech,
                fs,
                options,
                grammar,
            }),
        })
    }

    #[inline]
    pub fn tech(&self) -> &T {
        &self.inner.tech
    }

    #[inline]
    pub fn options(&self) -> &FreezeOptions {
        &self.inner.options
    }

    #[inline]
    pub fn fs(&self) -> &F {
        &self.inner.fs
    }

    #[inline]
    pub fn grammar(&self) -> &Grammar {
        &self.inner.grammar
    }

    // ------------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------------

    /// Root build of `source`; returns the rewritten content.
    pub async fn build(&self, source: impl Into<PathBuf>) -> Result<String> {
        self.build_file(None, source.into()).await
    }

    /// Await the configured build targets once, then build `source`.
    pub async fn build_with_gate<G: TargetGate>(
        &self,
        gate: &G,
        node: &Path,
        source: impl Into<PathBuf>,
    ) -> Result<String> {
        let options = self.options();
        gate.wait(node, &options.wait_for_targets, &options.wait_for_node_targets)
            .await?;
        self.build(source).await
    }

    /// Root build followed by freezing the result itself.
    pub async fn build_and_freeze(&self, source: impl Into<PathBuf>) -> Result<(PathBuf, String)> {
        let source = source.into();
        let content = self.build(source.clone()).await?;
        self.freeze_content(&source, content).await
    }

    /// Build `file`, included from `parent` (`None` for a root build).
    pub fn build_file(&self, parent: Option<PathBuf>, file: PathBuf) -> BuildFuture {
        self.build_in_chain(parent, file, Arc::from(Vec::new()))
    }

    fn build_in_chain(&self, parent: Option<PathBuf>, file: PathBuf, chain: Chain) -> BuildFuture {
        let this = self.clone();
        Box::pin(async move {
            if chain.contains(&file) {
                let mut cycle = chain.to_vec();
                cycle.push(file);
                return Err(FreezeError::Cycle { chain: cycle });
            }

            let parent = parent.unwrap_or_else(|| file.clone());
            let content = this.read_file(&parent, &file).await?;
            debug!("build"; "{}", file.display());

            let chain: Chain = chain.iter().cloned().chain([file.clone()]).collect();
            this.process_content(parent, file, content, chain).await
        })
    }

    // ------------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------------

    /// Read `path`, naming `parent` if it is missing.
    pub async fn read_file(&self, parent: &Path, path: &Path) -> Result<String> {
        if !self.fs().exists(path).await {
            return Err(FreezeError::MissingFile {
                parent: parent.to_path_buf(),
                target: path.to_path_buf(),
            });
        }
        let bytes = self
            .fs()
            .read(path)
            .await
            .map_err(|e| FreezeError::io("reading", path, e))?;
        self.options().encoding.decode(path, bytes)
    }

    /// Write `content` as `<digest>.<suffix>` into the freeze directory of
    /// the carrier's suffix. Returns the frozen path and the content.
    pub async fn freeze_content(&self, carrier: &Path, content: String) -> Result<(PathBuf, String)> {
        let options = self.options();
        let bytes = options.encoding.encode(carrier, &content)?;
        let digest = options.checksum.of(&bytes);
        let suffix = path::suffix_of(carrier);
        let dir = options.freeze_dir_for(&suffix)?;

        self.fs()
            .make_dir(&dir)
            .await
            .map_err(|e| FreezeError::io("creating", &dir, e))?;

        let frozen = dir.join(path::frozen_name(&digest, &suffix));
        self.fs()
            .write(&frozen, &bytes)
            .await
            .map_err(|e| FreezeError::io("writing", &frozen, e))?;

        debug!("freeze"; "{} -> {}", carrier.display(), frozen.display());
        Ok((frozen, content))
    }

    /// Freeze a file as it is on disk.
    pub async fn freeze_file(&self, parent: &Path, path: &Path) -> Result<(PathBuf, String)> {
        let content = self.read_file(parent, path).await?;
        self.freeze_content(path, content).await
    }

    async fn build_and_freeze_child(
        &self,
        carrier: &Path,
        source: PathBuf,
        chain: Chain,
    ) -> Result<(PathBuf, String)> {
        let content = self
            .build_in_chain(Some(carrier.to_path_buf()), source.clone(), chain)
            .await?;
        self.freeze_content(&source, content).await
    }

    // ------------------------------------------------------------------------
    // Tokens
    // ------------------------------------------------------------------------

    /// Run both matchers over `node`; recursor matches win.
    pub fn classify(&self, node: &Node) -> Result<Outcome> {
        let recursor = self.tech().match_recursor(node)?.unwrap_or_default();
        let freeze = self.tech().match_freeze(node)?.unwrap_or_default();

        Ok(if !recursor.is_empty() {
            Outcome::Recurse(recursor)
        } else if !freeze.is_empty() {
            Outcome::Freeze(freeze)
        } else {
            Outcome::Passthrough
        })
    }

    /// Classify and resolve one token found in `carrier`.
    pub async fn process_node(&self, carrier: &Path, node: Node) -> Result<FreezeResult> {
        let outcome = self.classify(&node)?;
        let chain: Chain = Arc::from(vec![carrier.to_path_buf()]);
        self.resolve_node(Arc::from(carrier), node, outcome, chain)
            .await
    }

    /// Resolve every reference of a token concurrently, keeping match order.
    async fn resolve_node(
        &self,
        carrier: Arc<Path>,
        node: Node,
        outcome: Outcome,
        chain: Chain,
    ) -> Result<FreezeResult> {
        let (matches, recurse) = match outcome {
            Outcome::Passthrough => return Ok(FreezeResult::passthrough(node)),
            Outcome::Recurse(matches) => (matches, true),
            Outcome::Freeze(matches) => (matches, false),
        };

        let mut tasks = JoinSet::new();
        for (index, reference) in matches.iter().cloned().enumerate() {
            let this = self.clone();
            let carrier = Arc::clone(&carrier);
            let chain = Arc::clone(&chain);
            tasks.spawn(async move {
                let base = this.tech().paths_base(&carrier, &reference);
                let source = path::resolve_freezable(&base, &reference);
                let (frozen, _) = if recurse {
                    this.build_and_freeze_child(&carrier, source, chain).await?
                } else {
                    this.freeze_file(&carrier, &source).await?
                };
                Ok::<_, FreezeError>((index, FreezePair::new(reference, frozen)))
            });
        }

        let mut pairs = vec![None; matches.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, pair) = joined??;
            pairs[index] = Some(pair);
        }

        Ok(FreezeResult {
            node,
            pairs: pairs.into_iter().flatten().collect(),
            matches,
        })
    }

    /// Tokenize, resolve and reassemble one carrier.
    async fn process_content(
        &self,
        parent: PathBuf,
        carrier: PathBuf,
        content: String,
        chain: Chain,
    ) -> Result<String> {
        let tree = ast::fold(self.grammar().parse(&content)?, ast::same_siblings);
        let carrier: Arc<Path> = Arc::from(carrier);

        let mut slots: Vec<Option<FreezeResult>> = Vec::with_capacity(tree.len());
        let mut tasks = JoinSet::new();

        for node in tree {
            // Comments pass through verbatim, never offered to matchers
            if node.kind.is_opaque() {
                slots.extend(
                    ast::flatten(std::slice::from_ref(&node))
                        .into_iter()
                        .map(|n| Some(FreezeResult::passthrough(n))),
                );
                continue;
            }

            match self.classify(&node)? {
                Outcome::Passthrough => slots.push(Some(FreezeResult::passthrough(node))),
                outcome => {
                    let slot = slots.len();
                    slots.push(None);
                    let this = self.clone();
                    let carrier = Arc::clone(&carrier);
                    let chain = Arc::clone(&chain);
                    tasks.spawn(async move {
                        let result = this.resolve_node(carrier, node, outcome, chain).await;
                        (slot, result)
                    });
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            let (slot, result) = joined?;
            slots[slot] = Some(result?);
        }

        let results: Vec<FreezeResult> = slots.into_iter().flatten().collect();
        self.reassemble(&parent, &carrier, &results)
    }

    // ------------------------------------------------------------------------
    // Rewrite
    // ------------------------------------------------------------------------

    /// Path written into `carrier` in place of a reference frozen to `frozen`.
    pub fn freeze_path(&self, parent: &Path, carrier: &Path, frozen: &Path) -> Result<String> {
        if let Some(hook) = &self.options().freeze_path_postprocess
            && let Some(written) = hook(parent, carrier, frozen)
        {
            return Ok(written);
        }
        if let Some(written) = self.tech().postprocess_path(parent, carrier, frozen) {
            return Ok(written);
        }

        let freeze_dir = if parent == carrier {
            PathBuf::new()
        } else {
            self.options().freeze_dir_for(&path::suffix_of(frozen))?
        };
        Ok(path::default_freeze_path(parent, carrier, frozen, &freeze_dir))
    }

    /// Concatenate every token's rewritten text in document order.
    fn reassemble(&self, parent: &Path, carrier: &Path, results: &[FreezeResult]) -> Result<String> {
        let mut out = String::new();

        for (index, result) in results.iter().enumerate() {
            let original = result.node.text();
            let value = self.substitute(parent, carrier, original, &result.pairs)?;

            let value = self.tech().postprocess_value(&ValueContext {
                parent,
                carrier,
                original,
                value: &value,
                matches: &result.matches,
                index,
            });

            if self.options().debug && !result.matches.is_empty() {
                self.annotate(&mut out, &result.matches);
            }
            out.push_str(&value);
        }

        Ok(out)
    }

    /// Replace each pair's reference in `original`, scanning forward from
    /// the end of the previous replacement so written paths are never
    /// matched again.
    fn substitute(
        &self,
        parent: &Path,
        carrier: &Path,
        original: &str,
        pairs: &[FreezePair],
    ) -> Result<String> {
        let mut value = String::with_capacity(original.len());
        let mut cursor = 0;
        for pair in pairs {
            let Some(found) = original[cursor..].find(&pair.original) else {
                continue;
            };
            let start = cursor + found;
            value.push_str(&original[cursor..start]);
            value.push_str(&self.freeze_path(parent, carrier, &pair.frozen)?);
            cursor = start + pair.original.len();
        }
        value.push_str(&original[cursor..]);
        Ok(value)
    }

    /// Insert a comment naming the matched references above the current
    /// output line, indented like that line.
    fn annotate(&self, out: &mut String, matches: &[String]) {
        let Some((start, end)) = self.options().block_comment_pair() else {
            return;
        };
        let line_start = out.rfind('\n').map_or(0, |i| i + 1);
        let indent: String = out[line_start..]
            .chars()
            .take_while(|c| c.is_whitespace())
            .collect();
        let comment = format!(
            "{indent}{start} {}: {} {end}\n",
            self.tech().name(),
            matches.join(", ")
        );
        out.insert_str(line_start, &comment);
    }
}
