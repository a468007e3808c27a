// src/config/settings.rs

//! Path-based access to the configuration tree.
//!
//! Every component reads its settings through [`Settings`] using
//! `/`-separated paths such as `email/smtp/host`. Missing keys never fail:
//! they read as an empty string (or an empty list), and callers decide
//! whether a value is mandatory. Scalars are rendered as text so that
//! `times = 3` and `times = "3"` read the same way.

use std::fmt::Display;
use std::str::FromStr;

use toml::{Table, Value};

use crate::errors::{Result, RunAsError};

/// Separator between the segments of a settings path.
pub const PATH_SEPARATOR: char = '/';

/// Read-only view over a parsed TOML document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    root: Table,
}

impl Settings {
    pub fn new(root: Table) -> Self {
        Self { root }
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let root: Table = toml::from_str(contents)?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Table {
        &self.root
    }

    /// Value at `path` as text, or an empty string when absent.
    ///
    /// For a list, the first scalar entry is returned.
    pub fn value(&self, path: &str) -> String {
        match self.lookup(path) {
            Some(Value::Array(items)) => items.iter().find_map(render_scalar).unwrap_or_default(),
            Some(value) => render_scalar(value).unwrap_or_default(),
            None => String::new(),
        }
    }

    /// All scalar values at `path`, in document order.
    ///
    /// A single scalar yields a one-element list; an absent key yields an
    /// empty list.
    pub fn values(&self, path: &str) -> Vec<String> {
        match self.lookup(path) {
            Some(Value::Array(items)) => items.iter().filter_map(render_scalar).collect(),
            Some(value) => render_scalar(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Boolean at `path`; `None` when absent or empty.
    pub fn bool_value(&self, path: &str) -> Result<Option<bool>> {
        let raw = self.value(path);
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        match trimmed.to_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(RunAsError::ConfigError(format!(
                "'{path}' is not a valid boolean (got \"{raw}\")"
            ))),
        }
    }

    /// Value at `path` parsed as `T`; `None` when absent or empty.
    pub fn parse_value<T>(&self, path: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.value(path);
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        trimmed.parse::<T>().map(Some).map_err(|e| {
            RunAsError::ConfigError(format!("'{path}' is not well defined (got \"{raw}\"): {e}"))
        })
    }

    fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split(PATH_SEPARATOR).filter(|s| !s.is_empty());
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_table()?.get(segment)?;
        }
        Some(current)
    }
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(d) => Some(d.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}
