// src/config/mod.rs

//! Configuration loading and validation for runasd.
//!
//! Responsibilities:
//! - Path-based access to the TOML document (`settings.rs`).
//! - The serde-backed service identity (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate mandatory values (`validate.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{RawServiceSection, ServiceInfo, split_hook_names};
pub use settings::Settings;
pub use validate::validate_settings;
