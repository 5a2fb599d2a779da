//! Configuration error types.

use std::fmt;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use thiserror::Error;

use super::FieldPath;
use crate::log;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed config file")]
    Toml(#[from] toml::de::Error),

    // Not a #[source]: the diagnostics are the message
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

/// One invalid field.
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub field: FieldPath,
    pub message: String,
    /// Example of a valid value.
    pub hint: Option<String>,
}

impl ConfigDiagnostic {
    pub fn new(field: FieldPath, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        Self {
            hint: Some(hint.into()),
            ..self
        }
    }
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)?;
        match &self.hint {
            Some(hint) => write!(f, "\n    {} {hint}", "e.g.".dimmed()),
            None => Ok(()),
        }
    }
}

/// Problems gathered across every section before failing once.
///
/// Unknown fields are collected separately; they are reported but never
/// make a config invalid.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    invalid: Vec<ConfigDiagnostic>,
    unknown: Vec<String>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.invalid.push(ConfigDiagnostic::new(field, message));
    }

    pub fn error_with_hint(
        &mut self,
        field: FieldPath,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.invalid
            .push(ConfigDiagnostic::new(field, message).with_hint(hint));
    }

    /// Record a field the config format does not know.
    pub fn unknown_field(&mut self, path: impl Into<String>) {
        self.unknown.push(path.into());
    }

    pub fn report_unknown_fields(&self) {
        if !self.unknown.is_empty() {
            log!("config"; "ignoring unknown fields: {}", self.unknown.join(", "));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.invalid.is_empty()
    }

    pub fn errors(&self) -> &[ConfigDiagnostic] {
        &self.invalid
    }

    pub fn unknown_fields(&self) -> &[String] {
        &self.unknown
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.invalid.len();
        let noun = if count == 1 { "field" } else { "fields" };
        write!(f, "{} {noun} invalid", count.to_string().red().bold())?;
        for diagnostic in &self.invalid {
            write!(f, "\n  {diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}
