//! Freeze error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::grammar::GrammarError;

pub type Result<T, E = FreezeError> = std::result::Result<T, E>;

/// Every failure is fatal to the enclosing build and travels up the
/// include chain unchanged.
#[derive(Debug, Error)]
pub enum FreezeError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file `{}`, required by `{}`, does not exist", target.display(), parent.display())]
    MissingFile { parent: PathBuf, target: PathBuf },

    #[error("technology `{tech}` does not implement `{capability}`")]
    Unimplemented {
        tech: String,
        capability: &'static str,
    },

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("include cycle detected: {}", Chain(chain))]
    Cycle { chain: Vec<PathBuf> },

    #[error("IO error when {action} `{}`", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` is not valid {encoding} text", path.display())]
    Encoding {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("timed out waiting for build target `{}`", target.display())]
    TargetTimeout { target: PathBuf },

    #[error("freeze task failed")]
    Task(#[from] tokio::task::JoinError),
}

impl FreezeError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn unimplemented(tech: &str, capability: &'static str) -> Self {
        Self::Unimplemented {
            tech: tech.to_string(),
            capability,
        }
    }

    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// `a -> b -> a` rendering of an include chain.
struct Chain<'a>(&'a [PathBuf]);

impl fmt::Display for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_missing_file_display() {
        let err = FreezeError::MissingFile {
            parent: PathBuf::from("/blocks/a.xsl"),
            target: PathBuf::from("/blocks/b.xsl"),
        };
        let display = err.to_string();
        assert!(display.contains("/blocks/b.xsl"));
        assert!(display.contains("required by `/blocks/a.xsl`"));
    }

    #[test]
    fn test_cycle_display() {
        let err = FreezeError::Cycle {
            chain: vec![PathBuf::from("/a.x"), PathBuf::from("/b.x"), PathBuf::from("/a.x")],
        };
        assert_eq!(err.to_string(), "include cycle detected: /a.x -> /b.x -> /a.x");
    }

    #[test]
    fn test_io_display() {
        let err = FreezeError::io(
            "reading",
            "/tmp/x.css",
            Error::new(ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "IO error when reading `/tmp/x.css`");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unimplemented_display() {
        let err = FreezeError::unimplemented("xslt", "match_freeze");
        assert_eq!(
            err.to_string(),
            "technology `xslt` does not implement `match_freeze`"
        );
    }
}
