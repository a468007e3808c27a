// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunAsError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0} is disposed")]
    Disposed(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot start twice the command: {0}")]
    AlreadyRunning(String),

    #[error("Kill failed for pid {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunAsError>;
