//! Terminal output with colored module prefixes.
//!
//! ```ignore
//! log!("freeze"; "{} -> {}", carrier.display(), frozen.display());
//! debug!("build"; "only shown with --verbose");
//! ```
//!
//! While a [`BuildProgress`] line is on screen, log lines overwrite it and
//! the progress line is redrawn below them on the next update.

use std::io::{Write, stdout};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossterm::{
    cursor, queue,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// A progress line occupies the current terminal line.
static PROGRESS_SHOWN: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally (`--verbose`).
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Print `message` behind a colored `[module]` prefix.
///
/// ```ignore
/// log!("build"; "{} built", count);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {
        $crate::logger::log($module, &format!($($arg)*))
    };
}

/// [`log!`] that prints only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*));
        }
    };
}

pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();
    if PROGRESS_SHOWN.swap(false, Ordering::Relaxed) {
        queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }
    writeln!(out, "{} {message}", prefix(module)).ok();
    out.flush().ok();
}

/// Report a failure on stderr with its cause chain.
pub fn log_error(error: &anyhow::Error) {
    let mut err = std::io::stderr().lock();
    writeln!(err, "{} {error}", prefix("error")).ok();
    for cause in error.chain().skip(1) {
        writeln!(err, "  {} {cause}", "caused by:".dimmed()).ok();
    }
}

fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module {
        "build" => tag.bright_blue().bold().to_string(),
        "freeze" => tag.bright_green().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Build progress
// ============================================================================

/// In-place status line for a multi-node build: `[build] 2/5 pages/about`.
pub struct BuildProgress {
    total: usize,
    done: AtomicUsize,
    current: Mutex<String>,
}

impl BuildProgress {
    pub fn new(total: usize) -> Self {
        let progress = Self {
            total,
            done: AtomicUsize::new(0),
            current: Mutex::new(String::new()),
        };
        progress.draw();
        progress
    }

    /// Show `node` as the node being built.
    pub fn start(&self, node: &Path) {
        *self.current.lock() = node.display().to_string();
        self.draw();
    }

    pub fn complete(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
        self.draw();
    }

    fn status(&self) -> String {
        let done = self.done.load(Ordering::Relaxed);
        let current = self.current.lock();
        if current.is_empty() || done == self.total {
            format!("{done}/{}", self.total)
        } else {
            format!("{done}/{} {current}", self.total)
        }
    }

    fn draw(&self) {
        if self.total < 2 {
            return;
        }
        let mut out = stdout().lock();
        queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        write!(out, "{} {}", prefix("build"), self.status()).ok();
        out.flush().ok();
        PROGRESS_SHOWN.store(true, Ordering::Relaxed);
    }
}

impl Drop for BuildProgress {
    fn drop(&mut self) {
        if PROGRESS_SHOWN.swap(false, Ordering::Relaxed) {
            let mut out = stdout().lock();
            queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
            out.flush().ok();
        }
    }
}
